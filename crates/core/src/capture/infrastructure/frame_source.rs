use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::capture::domain::capture_device::{
    CameraPosition, CaptureDevice, DeviceDirectory, FrameStream, MediaKind, PreviewSink,
};
use crate::capture::infrastructure::latest_frame_slot::{latest_frame_slot, LatestSender};
use crate::shared::error::SessionError;
use crate::shared::frame::Frame;

/// Preview surface shared with capture threads. Holding the lock is what
/// allows a capture thread to deliver a frame.
type SharedPreview = Arc<Mutex<Option<Box<dyn PreviewSink>>>>;

/// Owns camera acquisition and the capture thread.
///
/// Frames are handed to the analysis stage through a single-slot mailbox,
/// so a slow consumer causes frames to be dropped rather than queued.
pub struct FrameSource {
    devices: Box<dyn DeviceDirectory>,
    position: CameraPosition,
    preview: SharedPreview,
    capture: Option<CaptureThread>,
    dropped: Arc<AtomicU64>,
}

struct CaptureThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FrameSource {
    pub fn new(devices: Box<dyn DeviceDirectory>, position: CameraPosition) -> Self {
        Self {
            devices,
            position,
            preview: Arc::new(Mutex::new(None)),
            capture: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn set_preview(&mut self, sink: Box<dyn PreviewSink>) {
        *lock_preview(&self.preview) = Some(sink);
    }

    pub fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    /// Frames evicted from the mailbox across all runs.
    pub fn frames_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Picks the device for the configured position, falling back to the
    /// directory default.
    ///
    /// When several devices share the position, the last one listed wins.
    pub fn acquire_device(&self) -> Result<Arc<dyn CaptureDevice>, SessionError> {
        self.devices
            .list_devices(MediaKind::Video)
            .into_iter()
            .filter(|d| d.position() == self.position)
            .last()
            .or_else(|| {
                log::info!(
                    "No {} camera found, falling back to default device",
                    self.position
                );
                self.devices.default_device(MediaKind::Video)
            })
            .ok_or(SessionError::DeviceUnavailable {
                position: self.position,
            })
    }

    /// Acquires a device, opens it, and starts the capture thread.
    ///
    /// `stop` is shared with the consumer so both halves observe a stop
    /// request at the same moment.
    pub fn start(&mut self, stop: Arc<AtomicBool>) -> Result<Receiver<Frame>, SessionError> {
        debug_assert!(!self.is_running(), "capture already running");

        let device = self.acquire_device()?;
        let stream = device
            .open()
            .map_err(|e| SessionError::DeviceInputRejected {
                device: device.name().to_string(),
                reason: e.to_string(),
            })?;
        log::info!("Capturing from '{}' ({})", device.name(), device.position());

        let (sender, receiver) = latest_frame_slot(self.dropped.clone());
        let handle = spawn_capture(stream, self.preview.clone(), sender, stop.clone());
        self.capture = Some(CaptureThread { stop, handle });
        Ok(receiver)
    }

    /// Halts delivery. No-op when not running.
    ///
    /// Returns without waiting for the stream: once this returns no further
    /// frame is rendered or published. A capture thread still blocked in
    /// `next_frame` is detached and exits on its next pull.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let Some(capture) = self.capture.take() else {
            return Ok(());
        };
        capture.stop.store(true, Ordering::SeqCst);
        // Waits out a delivery already in progress.
        drop(lock_preview(&self.preview));

        if capture.handle.is_finished() {
            return join_capture(capture.handle);
        }
        log::debug!("Capture stream is blocked, detaching its thread");
        Ok(())
    }

    /// Joins the capture thread once its stream ends on its own.
    pub fn wait_until_exhausted(&mut self) -> Result<(), SessionError> {
        match self.capture.take() {
            Some(capture) => join_capture(capture.handle),
            None => Ok(()),
        }
    }
}

fn join_capture(handle: JoinHandle<()>) -> Result<(), SessionError> {
    handle
        .join()
        .map_err(|_| SessionError::WorkerPanicked { worker: "capture" })
}

fn lock_preview(preview: &SharedPreview) -> MutexGuard<'_, Option<Box<dyn PreviewSink>>> {
    preview
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn spawn_capture(
    mut stream: Box<dyn FrameStream>,
    preview: SharedPreview,
    sender: LatestSender<Frame>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            let frame = match stream.next_frame() {
                None => {
                    log::info!("Capture stream ended");
                    break;
                }
                Some(Err(e)) => {
                    log::warn!("Skipping unreadable frame: {e}");
                    continue;
                }
                Some(Ok(frame)) => frame,
            };
            let mut sink = lock_preview(&preview);
            if stop.load(Ordering::SeqCst) {
                break;
            }
            if let Some(sink) = sink.as_mut() {
                sink.render(&frame);
            }
            sender.publish(frame);
        }
    })
}
