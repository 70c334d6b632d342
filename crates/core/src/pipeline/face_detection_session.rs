use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::capture::domain::capture_device::{DeviceDirectory, PreviewSink};
use crate::capture::infrastructure::frame_source::FrameSource;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::feature_extractor::FeatureExtractor;
use crate::notification::domain::face_event::FaceEvent;
use crate::notification::domain::face_event_engine::FaceEventEngine;
use crate::notification::domain::face_snapshot::FaceSnapshot;
use crate::notification::domain::subscriber_registry::SubscriptionId;
use crate::pipeline::analysis_logger::{AnalysisLogger, NullAnalysisLogger};
use crate::pipeline::infrastructure::analysis_worker::{
    spawn_analysis, WorkerOutput, WorkerShared,
};
use crate::pipeline::session_config::SessionConfig;
use crate::shared::error::SessionError;

/// A camera-driven face event session.
///
/// `start` acquires a camera and spawns a capture thread and an analysis
/// worker. Subscribers are called on the analysis thread. Channel and
/// snapshot state live as long as the session and carry over between
/// `stop` and a later `start`.
pub struct FaceDetectionSession {
    config: SessionConfig,
    frame_source: FrameSource,
    /// Engine and logger while stopped. `None` while the worker owns them,
    /// or for good after the worker panicked.
    parked: Option<WorkerOutput>,
    shared: WorkerShared,
    worker: Option<AnalysisWorker>,
}

struct AnalysisWorker {
    stop: Arc<AtomicBool>,
    shutdown: Sender<()>,
    handle: JoinHandle<WorkerOutput>,
}

impl FaceDetectionSession {
    pub fn configure(
        config: SessionConfig,
        devices: Box<dyn DeviceDirectory>,
        detector: Box<dyn FaceDetector>,
    ) -> Self {
        let extractor = FeatureExtractor::new(detector, config.accuracy);
        log::debug!(
            "Configured session: {} camera, {} accuracy, {} mode",
            config.camera_position,
            config.accuracy,
            config.notification_mode
        );
        let logger: Box<dyn AnalysisLogger> = Box::new(NullAnalysisLogger);
        Self {
            config,
            frame_source: FrameSource::new(devices, config.camera_position),
            parked: Some((
                FaceEventEngine::new(extractor, config.notification_mode),
                logger,
            )),
            shared: WorkerShared::default(),
            worker: None,
        }
    }

    /// Every captured frame is rendered into `sink`, including frames the
    /// analysis worker never sees.
    pub fn with_preview(mut self, sink: Box<dyn PreviewSink>) -> Self {
        self.frame_source.set_preview(sink);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn AnalysisLogger>) -> Self {
        if let Some((_, parked_logger)) = self.parked.as_mut() {
            *parked_logger = logger;
        }
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Starts capture and analysis. Calling it while running does nothing.
    ///
    /// Device errors leave the session stopped with its state intact.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.is_running() {
            return Ok(());
        }
        let Some((engine, logger)) = self.parked.take() else {
            return Err(SessionError::WorkerPanicked { worker: "analysis" });
        };

        let stop = Arc::new(AtomicBool::new(false));
        let frames = match self.frame_source.start(stop.clone()) {
            Ok(frames) => frames,
            Err(e) => {
                self.parked = Some((engine, logger));
                return Err(e);
            }
        };
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded(0);
        let handle = spawn_analysis(
            engine,
            logger,
            frames,
            shutdown_rx,
            stop.clone(),
            self.shared.clone(),
        );
        self.worker = Some(AnalysisWorker {
            stop,
            shutdown,
            handle,
        });
        log::info!("Face detection started ({} mode)", self.config.notification_mode);
        Ok(())
    }

    /// Stops capture and analysis. Calling it while stopped does nothing.
    ///
    /// A frame being analysed finishes, including its event dispatch. A
    /// frame still waiting in the mailbox is discarded. Does not wait for a
    /// camera that has stopped producing frames.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        worker.stop.store(true, Ordering::SeqCst);
        drop(worker.shutdown);
        let analysis = self.join_worker(worker.handle);
        let capture = self.frame_source.stop();
        log::info!("Face detection stopped");
        analysis.and(capture)
    }

    /// Blocks until the camera stream ends and every delivered frame has
    /// been analysed, then leaves the session stopped.
    pub fn run_to_end(&mut self) -> Result<(), SessionError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let capture = self.frame_source.wait_until_exhausted();
        // The worker exits once the capture side disconnects.
        let analysis = self.join_worker(worker.handle);
        worker.stop.store(true, Ordering::SeqCst);
        drop(worker.shutdown);
        log::info!("Face detection finished");
        analysis.and(capture)
    }

    fn join_worker(&mut self, handle: JoinHandle<WorkerOutput>) -> Result<(), SessionError> {
        match handle.join() {
            Ok((engine, logger)) => {
                logger.summary();
                self.parked = Some((engine, logger));
                Ok(())
            }
            Err(_) => {
                log::error!("Analysis worker panicked; session state is lost");
                Err(SessionError::WorkerPanicked { worker: "analysis" })
            }
        }
    }

    /// Registers `handler` for `event`. Handlers run on the analysis thread.
    pub fn subscribe<F>(&self, event: FaceEvent, handler: F) -> SubscriptionId
    where
        F: Fn(&Arc<FaceSnapshot>) + Send + Sync + 'static,
    {
        self.shared.registry.subscribe(event, handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.registry.unsubscribe(id)
    }

    /// Registers an observer for per-frame errors such as detection
    /// failures. Lifecycle errors are returned from `start` instead.
    pub fn on_error<F>(&self, observer: F)
    where
        F: Fn(&SessionError) + Send + Sync + 'static,
    {
        self.shared.errors.add(Arc::new(observer));
    }

    /// The snapshot published after the most recently analysed frame.
    pub fn current_snapshot(&self) -> Arc<FaceSnapshot> {
        self.shared.snapshots.load()
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frame_source.frames_dropped()
    }
}

impl Drop for FaceDetectionSession {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Error while stopping face detection session: {e}");
        }
    }
}
