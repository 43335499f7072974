//! Transport configuration for animated UR display.

use serde::{Deserialize, Serialize};

use crate::ur::{Ur, UrEncoder};
use crate::{Error, Result};

/// Fragment length used when the caller does not pick one.
pub const DEFAULT_MAX_FRAGMENT_LEN: usize = 400;

/// Smallest fragment length accepted by [`TransportConfig::validate`].
pub const MIN_FRAGMENT_LEN: usize = 10;

/// How a producer turns a record into displayable parts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Upper bound on fragment bytes per part.
    #[serde(default = "default_max_fragment_len")]
    pub max_fragment_len: usize,

    /// Delay between animated frames, in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Emit upper-case parts so QR codes can use alphanumeric mode.
    #[serde(default)]
    pub uppercase: bool,
}

fn default_max_fragment_len() -> usize {
    DEFAULT_MAX_FRAGMENT_LEN
}

fn default_frame_interval_ms() -> u64 {
    200
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_fragment_len: default_max_fragment_len(),
            frame_interval_ms: default_frame_interval_ms(),
            uppercase: false,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_fragment_len(mut self, len: usize) -> Self {
        self.max_fragment_len = len;
        self
    }

    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = ms;
        self
    }

    pub fn with_uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fragment_len < MIN_FRAGMENT_LEN {
            return Err(Error::validation(
                "max_fragment_len",
                format!(
                    "{} is below the minimum of {}",
                    self.max_fragment_len, MIN_FRAGMENT_LEN
                ),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::validation("frame_interval_ms", "must be positive"));
        }
        Ok(())
    }

    /// Encoder for `ur` with this configuration's fragment length.
    pub fn encoder(&self, ur: &Ur) -> Result<UrEncoder> {
        self.validate()?;
        UrEncoder::new(ur, self.max_fragment_len)
    }

    /// Apply the configured letter case to an encoded part.
    pub fn format_part(&self, part: String) -> String {
        if self.uppercase {
            part.to_ascii_uppercase()
        } else {
            part
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: TransportConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TransportConfig::default());
        assert_eq!(config.max_fragment_len, 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders_and_validation() {
        let config = TransportConfig::new()
            .with_max_fragment_len(150)
            .with_uppercase(true);
        assert!(config.validate().is_ok());
        assert_eq!(config.format_part("ur:bytes/ae".into()), "UR:BYTES/AE");

        let too_small = TransportConfig::new().with_max_fragment_len(9);
        assert!(matches!(
            too_small.validate(),
            Err(Error::Validation { field: "max_fragment_len", .. })
        ));
        assert!(TransportConfig::new().with_frame_interval_ms(0).validate().is_err());
    }

    #[test]
    fn test_encoder_uses_fragment_len() {
        let ur = Ur::new("bytes", vec![0x42; 500]).unwrap();
        let encoder = TransportConfig::new()
            .with_max_fragment_len(150)
            .encoder(&ur)
            .unwrap();
        assert_eq!(encoder.fragment_count(), 4);
    }
}
