use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{select, Receiver};

use crate::notification::domain::face_event_engine::FaceEventEngine;
use crate::notification::domain::subscriber_registry::SubscriberRegistry;
use crate::pipeline::analysis_logger::AnalysisLogger;
use crate::pipeline::infrastructure::snapshot_cell::SnapshotCell;
use crate::shared::error::SessionError;
use crate::shared::frame::Frame;

pub type ErrorObserver = Arc<dyn Fn(&SessionError) + Send + Sync>;

/// Callbacks for per-frame errors.
#[derive(Default)]
pub struct ErrorObservers {
    observers: Mutex<Vec<ErrorObserver>>,
}

impl ErrorObservers {
    pub fn add(&self, observer: ErrorObserver) {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(observer);
    }

    pub fn notify(&self, error: &SessionError) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for observer in observers {
            observer(error);
        }
    }
}

/// State the worker shares with the session that spawned it.
#[derive(Clone, Default)]
pub struct WorkerShared {
    pub registry: Arc<SubscriberRegistry>,
    pub snapshots: Arc<SnapshotCell>,
    pub errors: Arc<ErrorObservers>,
}

pub type WorkerOutput = (FaceEventEngine, Box<dyn AnalysisLogger>);

/// Runs the engine over delivered frames until the frame channel
/// disconnects, `shutdown` disconnects, or `stop` is set.
///
/// A frame taken after `stop` is set is discarded unanalysed. The engine and
/// logger are handed back on join.
pub fn spawn_analysis(
    mut engine: FaceEventEngine,
    mut logger: Box<dyn AnalysisLogger>,
    frames: Receiver<Frame>,
    shutdown: Receiver<()>,
    stop: Arc<AtomicBool>,
    shared: WorkerShared,
) -> JoinHandle<WorkerOutput> {
    std::thread::spawn(move || {
        logger.info("Analysis started");
        let mut analyzed = 0usize;
        loop {
            let frame = select! {
                recv(frames) -> msg => match msg {
                    Ok(frame) => frame,
                    Err(_) => break,
                },
                recv(shutdown) -> _ => break,
            };
            if stop.load(Ordering::SeqCst) {
                log::debug!("Discarding frame {} after stop", frame.index());
                break;
            }

            logger.metric("frame_age_ms", frame.age().as_secs_f64() * 1000.0);
            let started = Instant::now();
            let result = engine.process_frame(&frame);
            logger.timing("analyze", started.elapsed().as_secs_f64() * 1000.0);

            match result {
                Ok(events) => {
                    let snapshot = Arc::new(engine.snapshot().clone());
                    shared.snapshots.store(snapshot.clone());
                    logger.metric("events", events.len() as f64);
                    shared.registry.dispatch(&events, &snapshot);
                }
                Err(e) => {
                    log::warn!("{e}");
                    shared.errors.notify(&e);
                }
            }

            analyzed += 1;
            logger.progress(analyzed);
        }
        logger.info(&format!("Analysis stopped after {analyzed} frames"));
        (engine, logger)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_attributes::FaceAttributes;
    use crate::detection::domain::face_detector::DetectorAccuracy;
    use crate::detection::domain::feature_extractor::FeatureExtractor;
    use crate::detection::infrastructure::scripted_face_detector::{
        ScriptedFaceDetector, ScriptedOutcome,
    };
    use crate::notification::domain::face_event::FaceEvent;
    use crate::notification::domain::notification_channel::{NotificationMode, TriState};
    use crate::pipeline::analysis_logger::StdoutAnalysisLogger;
    use crate::shared::geometry::Rect;
    use std::collections::HashMap;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn engine(script: HashMap<usize, ScriptedOutcome>) -> FaceEventEngine {
        let detector = ScriptedFaceDetector::new(Arc::new(script));
        FaceEventEngine::new(
            FeatureExtractor::new(Box::new(detector), DetectorAccuracy::HigherPerformance),
            NotificationMode::LevelTriggered,
        )
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 3], 1, 1, 3, index)
    }

    fn face() -> FaceAttributes {
        FaceAttributes::new(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_processes_frames_in_order_and_returns_engine() {
        let script = HashMap::from([(0, ScriptedOutcome::Faces(vec![face()]))]);
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let shared = WorkerShared::default();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        for event in [FaceEvent::FaceDetected, FaceEvent::NoFaceDetected] {
            let tx = event_tx.clone();
            shared.registry.subscribe(event, move |_| {
                tx.send(event).unwrap();
            });
        }

        let handle = spawn_analysis(
            engine(script),
            Box::new(StdoutAnalysisLogger::new(1)),
            frame_rx,
            shutdown_rx,
            Arc::new(AtomicBool::new(false)),
            shared.clone(),
        );
        frame_tx.send(frame(0)).unwrap();
        frame_tx.send(frame(1)).unwrap();
        drop(frame_tx);
        let (engine, _logger) = handle.join().unwrap();

        assert_eq!(event_rx.recv_timeout(TIMEOUT).unwrap(), FaceEvent::FaceDetected);
        assert_eq!(event_rx.recv_timeout(TIMEOUT).unwrap(), FaceEvent::NoFaceDetected);
        assert_eq!(engine.snapshot().presence, TriState::False);
        assert_eq!(shared.snapshots.load().presence, TriState::False);
    }

    #[test]
    fn test_failure_goes_to_error_observers_only() {
        let script = HashMap::from([(0, ScriptedOutcome::Failure("bad frame".into()))]);
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let shared = WorkerShared::default();
        let (err_tx, err_rx) = crossbeam_channel::unbounded();
        shared.errors.add(Arc::new(move |e: &SessionError| {
            err_tx.send(e.clone()).unwrap();
        }));

        let handle = spawn_analysis(
            engine(script),
            Box::new(StdoutAnalysisLogger::new(1)),
            frame_rx,
            shutdown_rx,
            Arc::new(AtomicBool::new(false)),
            shared.clone(),
        );
        frame_tx.send(frame(0)).unwrap();
        drop(frame_tx);
        let (engine, _logger) = handle.join().unwrap();

        assert_eq!(
            err_rx.recv_timeout(TIMEOUT).unwrap(),
            SessionError::detection_failure(0, "bad frame")
        );
        assert_eq!(engine.snapshot().presence, TriState::Unknown);
        assert_eq!(shared.snapshots.load().presence, TriState::Unknown);
    }

    #[test]
    fn test_shutdown_ends_idle_worker() {
        let (_frame_tx, frame_rx) = crossbeam_channel::unbounded::<Frame>();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);

        let handle = spawn_analysis(
            engine(HashMap::new()),
            Box::new(StdoutAnalysisLogger::new(1)),
            frame_rx,
            shutdown_rx,
            Arc::new(AtomicBool::new(true)),
            WorkerShared::default(),
        );
        drop(shutdown_tx);

        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_frame_after_stop_is_discarded() {
        let script = HashMap::from([(0, ScriptedOutcome::Faces(vec![face()]))]);
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        frame_tx.send(frame(0)).unwrap();

        let handle = spawn_analysis(
            engine(script),
            Box::new(StdoutAnalysisLogger::new(1)),
            frame_rx,
            shutdown_rx,
            Arc::new(AtomicBool::new(true)),
            WorkerShared::default(),
        );
        let (engine, _logger) = handle.join().unwrap();

        assert_eq!(engine.snapshot().presence, TriState::Unknown);
    }

    /// Records which stages, metrics and messages were reported.
    struct RecordingLogger {
        names: Arc<Mutex<Vec<String>>>,
        progress: Arc<Mutex<Vec<usize>>>,
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl AnalysisLogger for RecordingLogger {
        fn progress(&mut self, frames_analyzed: usize) {
            self.progress.lock().unwrap().push(frames_analyzed);
        }
        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.names.lock().unwrap().push(stage.to_string());
        }
        fn metric(&mut self, name: &str, _value: f64) {
            self.names.lock().unwrap().push(name.to_string());
        }
        fn info(&mut self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_logger_sees_timing_and_metrics_per_frame() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let progress = Arc::new(Mutex::new(Vec::new()));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        frame_tx.send(frame(0)).unwrap();
        frame_tx.send(frame(1)).unwrap();
        drop(frame_tx);

        let handle = spawn_analysis(
            engine(HashMap::new()),
            Box::new(RecordingLogger {
                names: names.clone(),
                progress: progress.clone(),
                messages: messages.clone(),
            }),
            frame_rx,
            shutdown_rx,
            Arc::new(AtomicBool::new(false)),
            WorkerShared::default(),
        );
        handle.join().unwrap();

        assert_eq!(
            *names.lock().unwrap(),
            vec![
                "frame_age_ms",
                "analyze",
                "events",
                "frame_age_ms",
                "analyze",
                "events"
            ]
        );
        assert_eq!(*progress.lock().unwrap(), vec![1, 2]);
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["Analysis started", "Analysis stopped after 2 frames"]
        );
    }
}
