use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capture::domain::capture_device::CameraPosition;
use crate::detection::domain::face_detector::DetectorAccuracy;
use crate::notification::domain::notification_channel::NotificationMode;
use crate::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use crate::shared::error::ConfigError;

/// Everything chosen when a session is configured.
///
/// Missing fields in a config file fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub camera_position: CameraPosition,
    pub accuracy: DetectorAccuracy,
    pub notification_mode: NotificationMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera_position: CameraPosition::Front,
            accuracy: DetectorAccuracy::HigherPerformance,
            notification_mode: NotificationMode::EdgeTriggered,
        }
    }
}

impl SessionConfig {
    /// Per-user config location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, json).map_err(write_err)
    }
}
