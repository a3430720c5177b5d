//! Motion configuration and the shared JSON load/save helpers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::error::{MotionError, Result};
use crate::gesture::BehaviorPreset;
use crate::motion::IdleConfig;

// ── Motion Config ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub preset: BehaviorPreset,
    /// Weight kept from the previous amplitude reading (0 disables smoothing).
    #[serde(default = "default_amplitude_smoothing")]
    pub amplitude_smoothing: f32,
    #[serde(default)]
    pub idle: IdleConfig,
}

fn default_amplitude_smoothing() -> f32 {
    0.5
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            preset: BehaviorPreset::default(),
            amplitude_smoothing: default_amplitude_smoothing(),
            idle: IdleConfig::default(),
        }
    }
}

impl MotionConfig {
    /// Default config using a built-in preset by name.
    pub fn with_preset_name(name: &str) -> Result<Self> {
        let preset =
            BehaviorPreset::named(name).ok_or_else(|| MotionError::UnknownPreset(name.to_string()))?;
        Ok(Self {
            preset,
            ..Self::default()
        })
    }
}

/// Load motion config from a JSON file. Falls back to defaults if the file is
/// missing or invalid.
pub fn load_config(path: &Path) -> MotionConfig {
    load_json_config(path, "motion")
}

/// Save motion config to a JSON file.
pub fn save_config(path: &Path, config: &MotionConfig) -> Result<()> {
    save_json_config(path, config, "motion")
}

// ── Generic helpers ────────────────────────────────────

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match try_load_json_config(path) {
        Ok(config) => {
            info!(label, path = %path.display(), "loaded config");
            config
        }
        Err(MotionError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(label, path = %path.display(), "no config file, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(label, path = %path.display(), error = %e, "failed to load config, using defaults");
            T::default()
        }
    }
}

/// Strict load: surfaces I/O and parse errors instead of defaulting.
pub fn try_load_json_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Generic save for any Serde config type. Creates parent directories.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T, label: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(label, path = %path.display(), "saved config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("absent.json"));
        assert_eq!(config, MotionConfig::default());
    }

    #[test]
    fn garbage_file_yields_defaults_but_strict_load_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("motion.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), MotionConfig::default());
        let strict: Result<MotionConfig> = try_load_json_config(&path);
        assert!(matches!(strict, Err(MotionError::Json(_))));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("motion.json");
        let config = MotionConfig {
            preset: BehaviorPreset::expressive(),
            amplitude_smoothing: 0.25,
            idle: IdleConfig {
                seed: 42,
                ..IdleConfig::default()
            },
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("motion.json");
        std::fs::write(&path, r#"{"preset": {"twitch_frequency": 2.0}}"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.preset.twitch_frequency, 2.0);
        assert_eq!(config.amplitude_smoothing, 0.5);
        assert!(config.idle.enabled);
    }

    #[test]
    fn preset_by_name() {
        assert_eq!(
            MotionConfig::with_preset_name("nervous").unwrap().preset,
            BehaviorPreset::nervous()
        );
        assert!(matches!(
            MotionConfig::with_preset_name("sleepy"),
            Err(MotionError::UnknownPreset(_))
        ));
    }
}
