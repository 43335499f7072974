//! Transport configuration loading

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ur_registry::config::TransportConfig;

use crate::ui;

/// `<config dir>/ur-tool/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ur-tool").join("config.json"))
}

/// Resolve the effective transport configuration.
///
/// Precedence: `max_fragment_len` override (flag or `UR_TOOL_MAX_FRAGMENT_LEN`),
/// then the explicit `--config` file, then the default config file, then
/// built-in defaults. An explicit file must exist; the default one may not.
pub fn load(explicit: Option<&Path>, max_fragment_len: Option<usize>) -> Result<TransportConfig> {
    let mut config = match explicit {
        Some(path) => read(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => read(&path)?,
            None => TransportConfig::default(),
        },
    };
    if let Some(len) = max_fragment_len {
        config = config.with_max_fragment_len(len);
    }
    config.validate()?;
    tracing::debug!(?config, "transport config");
    Ok(config)
}

fn read(path: &Path) -> Result<TransportConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

/// Print the effective configuration as JSON.
pub fn show(config: &TransportConfig) -> Result<()> {
    ui::header("Transport Configuration");
    if let Some(path) = default_config_path() {
        ui::key_value("Default file", &path.display().to_string());
    }
    ui::json(&serde_json::to_value(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file_and_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_fragment_len": 90, "uppercase": true}"#).unwrap();

        let config = load(Some(&path), None).unwrap();
        assert_eq!(config.max_fragment_len, 90);
        assert!(config.uppercase);

        let config = load(Some(&path), Some(250)).unwrap();
        assert_eq!(config.max_fragment_len, 250);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_fragment_len": 0}"#).unwrap();
        assert!(load(Some(&path), None).is_err());
        assert!(load(Some(&dir.path().join("missing.json")), None).is_err());
    }
}
