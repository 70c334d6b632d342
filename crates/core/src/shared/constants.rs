/// Image orientation passed to the detector on every call (EXIF "right, top").
///
/// The device orientation is not consulted.
pub const DETECTOR_ORIENTATION_HINT: u32 = 6;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Progress lines from `StdoutAnalysisLogger` are emitted every N frames.
pub const DEFAULT_LOG_THROTTLE_FRAMES: usize = 30;

pub const CONFIG_DIR_NAME: &str = "facesignal";
pub const CONFIG_FILE_NAME: &str = "session.json";
