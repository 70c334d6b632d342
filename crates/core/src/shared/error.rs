use std::path::PathBuf;

use thiserror::Error;

use crate::capture::domain::capture_device::CameraPosition;

/// Errors surfaced by a face detection session.
///
/// `DeviceUnavailable` and `DeviceInputRejected` are returned from `start`.
/// `DetectionFailure` is per-frame and only ever reaches error observers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("no capture device available for the {position} camera and no default device")]
    DeviceUnavailable { position: CameraPosition },
    #[error("capture device '{device}' rejected as session input: {reason}")]
    DeviceInputRejected { device: String, reason: String },
    #[error("face detection failed on frame {frame_index}: {reason}")]
    DetectionFailure { frame_index: usize, reason: String },
    #[error("{worker} thread panicked")]
    WorkerPanicked { worker: &'static str },
}

impl SessionError {
    pub fn detection_failure(frame_index: usize, reason: impl Into<String>) -> Self {
        Self::DetectionFailure {
            frame_index,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
