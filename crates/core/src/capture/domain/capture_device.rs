use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;

pub type CaptureError = Box<dyn std::error::Error + Send + Sync>;

/// Which side of the device a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    Front,
    Back,
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::Back => write!(f, "back"),
        }
    }
}

impl FromStr for CameraPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(CameraPosition::Front),
            "back" => Ok(CameraPosition::Back),
            other => Err(format!("camera must be 'front' or 'back', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

/// A pull-based source of frames opened from a [`CaptureDevice`].
///
/// `None` means the stream has ended. Individual read errors do not end
/// the stream.
pub trait FrameStream: Send {
    fn next_frame(&mut self) -> Option<Result<Frame, CaptureError>>;
}

/// A physical or virtual camera.
pub trait CaptureDevice: Send + Sync {
    fn name(&self) -> &str;

    fn position(&self) -> CameraPosition;

    fn media_kind(&self) -> MediaKind {
        MediaKind::Video
    }

    /// Wraps the device as a session input. Fails on permission or
    /// configuration problems.
    fn open(&self) -> Result<Box<dyn FrameStream>, CaptureError>;
}

/// Enumerates capture devices available on the host.
pub trait DeviceDirectory: Send {
    fn list_devices(&self, kind: MediaKind) -> Vec<Arc<dyn CaptureDevice>>;

    fn default_device(&self, kind: MediaKind) -> Option<Arc<dyn CaptureDevice>>;
}

/// Live preview surface. Receives every captured frame before analysis.
pub trait PreviewSink: Send {
    fn render(&mut self, frame: &Frame);
}
