// src/settings.rs - Persisted application settings
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::actions::KeyBindings;
use crate::config::{ConfigWarning, GestureConfig};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("invalid key combination: {0}")]
    InvalidCombo(String),
    #[error("no home directory to store settings in")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Global on/off switch; turning it off keeps tracker history.
    pub enabled: bool,
    pub camera_index: u32,
    pub gestures: GestureConfig,
    pub bindings: KeyBindings,
    pub record_session: bool,
    pub output_directory: PathBuf,
    /// Replace the camera with the scripted hand loop. Read once at startup.
    pub simulate_hands: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            camera_index: 0,
            gestures: GestureConfig::default(),
            bindings: KeyBindings::default(),
            record_session: false,
            output_directory: UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("SnapHotkey")))
                .unwrap_or_else(|| PathBuf::from("./sessions")),
            simulate_hands: false,
        }
    }
}

impl AppSettings {
    /// Default location: the platform config dir for this app.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("com", "snaphotkey", "SnapHotkey")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads settings from `path`, or returns defaults if the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text)?;
        for warning in settings.validate() {
            warn!("Settings: {}", warning);
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Advisory warnings only; the pipeline runs with whatever is set.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        self.gestures.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("snap_hotkey_{}", uuid::Uuid::new_v4()))
            .join(SETTINGS_FILE)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = AppSettings::load(&temp_path()).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path();
        let mut settings = AppSettings::default();
        settings.gestures.processing_fps = 24.0;
        settings.enabled = false;
        settings.save(&path).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "camera_index": 2, "gestures": { "snap_cooldown_period": 0.5 } }"#).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded.camera_index, 2);
        assert_eq!(loaded.gestures.snap_cooldown_period, 0.5);
        assert_eq!(loaded.gestures.history_size, 8);
        assert!(loaded.enabled);
        assert!(!loaded.simulate_hands, "simulation must be opted into");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unknown_binding_is_a_json_error() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "bindings": { "snap": ["cmd", "warp"], "middle_finger": ["w"] } }"#).unwrap();

        assert!(matches!(AppSettings::load(&path), Err(ConfigError::Json(_))));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
