//! Animated UR display.

use std::sync::{Arc, Mutex};

use ur_registry::config::{TransportConfig, DEFAULT_MAX_FRAGMENT_LEN};
use ur_registry::ur::{Ur, UrEncoder};

use crate::{Result, UrMobileError};

/// Display settings chosen by the host.
#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct TransportSettings {
    pub max_fragment_len: u32,
    pub frame_interval_ms: u64,
    pub uppercase: bool,
}

impl From<TransportConfig> for TransportSettings {
    fn from(config: TransportConfig) -> Self {
        Self {
            max_fragment_len: u32::try_from(config.max_fragment_len).unwrap_or(u32::MAX),
            frame_interval_ms: config.frame_interval_ms,
            uppercase: config.uppercase,
        }
    }
}

impl From<TransportSettings> for TransportConfig {
    fn from(settings: TransportSettings) -> Self {
        TransportConfig::new()
            .with_max_fragment_len(settings.max_fragment_len as usize)
            .with_frame_interval_ms(settings.frame_interval_ms)
            .with_uppercase(settings.uppercase)
    }
}

#[uniffi::export]
pub fn default_transport_settings() -> TransportSettings {
    TransportConfig::default().into()
}

/// Parse settings from JSON; missing fields take their defaults.
#[uniffi::export]
pub fn transport_settings_from_json(json: String) -> Result<TransportSettings> {
    let config: TransportConfig =
        serde_json::from_str(&json).map_err(|e| UrMobileError::Validation {
            msg: format!("invalid transport settings: {}", e),
        })?;
    config.validate()?;
    Ok(config.into())
}

/// Produces the strings to render as QR codes, one per frame.
#[derive(uniffi::Object)]
pub struct UrEncoderHandle {
    inner: Mutex<UrEncoder>,
    config: TransportConfig,
}

impl UrEncoderHandle {
    pub(crate) fn for_ur(ur: &Ur, max_fragment_len: Option<u32>) -> Result<Arc<Self>> {
        let config = TransportConfig::new().with_max_fragment_len(
            max_fragment_len.map_or(DEFAULT_MAX_FRAGMENT_LEN, |len| len as usize),
        );
        Self::with_config(ur, config)
    }

    pub(crate) fn with_config(ur: &Ur, config: TransportConfig) -> Result<Arc<Self>> {
        let encoder = config.encoder(ur)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            ur_type = ur.ur_type(),
            fragments = encoder.fragment_count(),
            "created UR encoder"
        );

        Ok(Arc::new(Self {
            inner: Mutex::new(encoder),
            config,
        }))
    }
}

#[uniffi::export]
impl UrEncoderHandle {
    /// Encoder using host-provided settings.
    #[uniffi::constructor]
    pub fn with_settings(
        ur_string: String,
        settings: TransportSettings,
    ) -> Result<Arc<Self>> {
        let ur: Ur = ur_string.parse()?;
        Self::with_config(&ur, settings.into())
    }

    /// Next frame. A single-fragment payload repeats the same string forever.
    pub fn next_part(&self) -> Result<String> {
        let mut encoder = self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())?;
        Ok(self.config.format_part(encoder.next_part()?))
    }

    pub fn is_single_part(&self) -> Result<bool> {
        let encoder = self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())?;
        Ok(encoder.is_single_part())
    }

    pub fn fragment_count(&self) -> Result<u32> {
        let encoder = self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())?;
        Ok(u32::try_from(encoder.fragment_count()).unwrap_or(u32::MAX))
    }

    /// Sequence number of the last frame returned.
    pub fn current_sequence(&self) -> Result<u32> {
        let encoder = self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())?;
        Ok(encoder.current_sequence())
    }

    /// True once every fragment has been shown at least once.
    pub fn has_shown_all_fragments(&self) -> Result<bool> {
        let encoder = self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())?;
        Ok(encoder.is_complete())
    }

    pub fn frame_interval_ms(&self) -> u64 {
        self.config.frame_interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ur(len: usize) -> Ur {
        Ur::new("bytes", vec![0x5a; len]).unwrap()
    }

    #[test]
    fn test_default_fragment_len() {
        let encoder = UrEncoderHandle::for_ur(&sample_ur(399), None).unwrap();
        assert!(encoder.is_single_part().unwrap());
        let encoder = UrEncoderHandle::for_ur(&sample_ur(401), None).unwrap();
        assert_eq!(encoder.fragment_count().unwrap(), 2);
    }

    #[test]
    fn test_uppercase_frames() {
        let settings = TransportSettings {
            max_fragment_len: 50,
            frame_interval_ms: 100,
            uppercase: true,
        };
        let ur = sample_ur(200);
        let encoder = UrEncoderHandle::with_settings(ur.to_string(), settings).unwrap();
        let frame = encoder.next_part().unwrap();
        assert!(frame.starts_with("UR:BYTES/1-4/"));
        assert_eq!(encoder.current_sequence().unwrap(), 1);
        assert_eq!(encoder.frame_interval_ms(), 100);
    }

    #[test]
    fn test_settings_json() {
        let settings = transport_settings_from_json(r#"{"max_fragment_len": 150}"#.into()).unwrap();
        assert_eq!(settings.max_fragment_len, 150);
        assert_eq!(settings, TransportSettings { max_fragment_len: 150, ..default_transport_settings() });
        assert!(transport_settings_from_json(r#"{"max_fragment_len": 2}"#.into()).is_err());
        assert!(transport_settings_from_json("not json".into()).is_err());
    }

    #[test]
    fn test_zero_fragment_len_is_rejected() {
        assert!(matches!(
            UrEncoderHandle::for_ur(&sample_ur(10), Some(0)),
            Err(UrMobileError::Validation { .. })
        ));
    }
}
