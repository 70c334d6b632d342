use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::domain::capture_device::{
    CameraPosition, CaptureDevice, CaptureError, DeviceDirectory, FrameStream, MediaKind,
};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// A virtual camera that plays back a directory of still images.
///
/// Files are read in name order and decoded to RGB. When `fps` is set the
/// stream sleeps between frames to mimic a live camera.
pub struct ImageSequenceDevice {
    name: String,
    position: CameraPosition,
    dir: PathBuf,
    fps: Option<f64>,
}

impl ImageSequenceDevice {
    pub fn new(dir: impl Into<PathBuf>, position: CameraPosition) -> Self {
        let dir = dir.into();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        Self {
            name,
            position,
            dir,
            fps: None,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = (fps > 0.0).then_some(fps);
        self
    }

    fn image_paths(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_image(p))
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(format!("no images found in {}", self.dir.display()).into());
        }
        Ok(paths)
    }
}

impl CaptureDevice for ImageSequenceDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> CameraPosition {
        self.position
    }

    fn open(&self) -> Result<Box<dyn FrameStream>, CaptureError> {
        let paths = self.image_paths()?;
        log::debug!("Opened {} with {} images", self.name, paths.len());
        Ok(Box::new(ImageSequenceStream {
            paths: paths.into_iter(),
            index: 0,
            interval: self.fps.map(|fps| Duration::from_secs_f64(1.0 / fps)),
            next_due: None,
        }))
    }
}

struct ImageSequenceStream {
    paths: std::vec::IntoIter<PathBuf>,
    index: usize,
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl ImageSequenceStream {
    fn pace(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + interval);
    }
}

impl FrameStream for ImageSequenceStream {
    fn next_frame(&mut self) -> Option<Result<Frame, CaptureError>> {
        let path = self.paths.next()?;
        self.pace();
        let index = self.index;
        self.index += 1;
        Some(load_frame(&path, index))
    }
}

fn load_frame(path: &Path, index: usize) -> Result<Frame, CaptureError> {
    let img = image::open(path)
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Fixed list of devices. The first device of a kind is that kind's default.
#[derive(Default)]
pub struct StaticDeviceDirectory {
    devices: Vec<Arc<dyn CaptureDevice>>,
}

impl StaticDeviceDirectory {
    pub fn new(devices: Vec<Arc<dyn CaptureDevice>>) -> Self {
        Self { devices }
    }

    pub fn with_device(mut self, device: Arc<dyn CaptureDevice>) -> Self {
        self.devices.push(device);
        self
    }
}

impl DeviceDirectory for StaticDeviceDirectory {
    fn list_devices(&self, kind: MediaKind) -> Vec<Arc<dyn CaptureDevice>> {
        self.devices
            .iter()
            .filter(|d| d.media_kind() == kind)
            .cloned()
            .collect()
    }

    fn default_device(&self, kind: MediaKind) -> Option<Arc<dyn CaptureDevice>> {
        self.devices.iter().find(|d| d.media_kind() == kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(dir: &Path, name: &str, rgb: [u8; 3]) {
        let mut img = image::RgbImage::new(4, 3);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(dir.join(name)).unwrap();
    }

    fn drain(stream: &mut dyn FrameStream) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(result) = stream.next_frame() {
            frames.push(result.unwrap());
        }
        frames
    }

    #[test]
    fn test_frames_follow_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", [0, 0, 200]);
        write_image(dir.path(), "a.png", [200, 0, 0]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let device = ImageSequenceDevice::new(dir.path(), CameraPosition::Front);
        let mut stream = device.open().unwrap();
        let frames = drain(stream.as_mut());

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].index(), 0);
        assert_eq!(frames[0].data()[0], 200);
        assert_eq!(frames[1].index(), 1);
        assert_eq!(frames[1].data()[2], 200);
    }

    #[test]
    fn test_frames_are_rgb_with_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "only.png", [1, 2, 3]);

        let device = ImageSequenceDevice::new(dir.path(), CameraPosition::Back);
        let frame = device.open().unwrap().next_frame().unwrap().unwrap();

        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.channels(), 3);
        assert_eq!(&frame.data()[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_open_fails_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let device = ImageSequenceDevice::new(dir.path(), CameraPosition::Front);
        assert!(device.open().is_err());
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let device = ImageSequenceDevice::new("/nonexistent/frames", CameraPosition::Front);
        assert!(device.open().is_err());
    }

    #[test]
    fn test_undecodable_file_is_a_per_frame_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not a png").unwrap();
        write_image(dir.path(), "b.png", [9, 9, 9]);

        let device = ImageSequenceDevice::new(dir.path(), CameraPosition::Front);
        let mut stream = device.open().unwrap();

        assert!(stream.next_frame().unwrap().is_err());
        let frame = stream.next_frame().unwrap().unwrap();
        assert_eq!(frame.index(), 1);
        assert!(stream.next_frame().is_none());
    }

    #[test]
    fn test_fps_paces_frames() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png", "c.png"] {
            write_image(dir.path(), name, [0, 0, 0]);
        }
        let device = ImageSequenceDevice::new(dir.path(), CameraPosition::Front).with_fps(50.0);
        let mut stream = device.open().unwrap();

        let start = Instant::now();
        assert_eq!(drain(stream.as_mut()).len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_device_name_is_directory_name() {
        let device = ImageSequenceDevice::new("/tmp/front-cam", CameraPosition::Front);
        assert_eq!(device.name(), "front-cam");
        assert_eq!(device.position(), CameraPosition::Front);
        assert_eq!(device.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_directory_default_is_first_video_device() {
        let back: Arc<dyn CaptureDevice> =
            Arc::new(ImageSequenceDevice::new("/tmp/back", CameraPosition::Back));
        let front: Arc<dyn CaptureDevice> =
            Arc::new(ImageSequenceDevice::new("/tmp/front", CameraPosition::Front));
        let directory = StaticDeviceDirectory::new(vec![back]).with_device(front);

        assert_eq!(directory.list_devices(MediaKind::Video).len(), 2);
        assert!(directory.list_devices(MediaKind::Audio).is_empty());
        let default = directory.default_device(MediaKind::Video).unwrap();
        assert_eq!(default.name(), "back");
        assert!(directory.default_device(MediaKind::Audio).is_none());
    }

    #[test]
    fn test_empty_directory_has_no_default() {
        let directory = StaticDeviceDirectory::default();
        assert!(directory.default_device(MediaKind::Video).is_none());
    }
}
