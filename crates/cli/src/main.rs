use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;

use facesignal_core::capture::domain::capture_device::{CameraPosition, CaptureDevice};
use facesignal_core::capture::infrastructure::image_sequence_device::{
    ImageSequenceDevice, StaticDeviceDirectory,
};
use facesignal_core::detection::domain::face_detector::DetectorAccuracy;
use facesignal_core::detection::infrastructure::scripted_face_detector::ScriptedFaceDetector;
use facesignal_core::notification::domain::face_event::FaceEvent;
use facesignal_core::notification::domain::face_snapshot::FaceSnapshot;
use facesignal_core::notification::domain::notification_channel::NotificationMode;
use facesignal_core::pipeline::analysis_logger::StdoutAnalysisLogger;
use facesignal_core::pipeline::face_detection_session::FaceDetectionSession;
use facesignal_core::pipeline::session_config::SessionConfig;

/// Replays camera frames through the face event engine and prints events.
#[derive(Parser)]
#[command(name = "facesignal")]
struct Cli {
    /// Directory of images played back as the front camera.
    front: PathBuf,

    /// Detector output to replay, one JSON object per line keyed by frame.
    #[arg(long)]
    trace: PathBuf,

    /// Directory of images played back as the back camera.
    #[arg(long)]
    back: Option<PathBuf>,

    /// Camera to use: front or back.
    #[arg(long)]
    camera: Option<CameraPosition>,

    /// Detector accuracy: battery-saving or higher-performance.
    #[arg(long)]
    accuracy: Option<DetectorAccuracy>,

    /// Event mode: edge (changes only) or level (every frame).
    #[arg(long)]
    mode: Option<NotificationMode>,

    /// Playback rate in frames per second (default: as fast as possible).
    #[arg(long)]
    fps: Option<f64>,

    /// Session config file (default: the per-user config, if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the effective settings in the per-user config file.
    #[arg(long)]
    save_config: bool,

    /// Write the final face snapshot to this file as JSON.
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Log per-frame analysis timings and a summary.
    #[arg(long)]
    stats: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = resolve_config(&cli)?;
    if cli.save_config {
        let path = SessionConfig::default_path().ok_or("No config directory on this platform")?;
        config.save(&path)?;
        log::info!("Saved settings to {}", path.display());
    }

    let detector = ScriptedFaceDetector::load(&cli.trace)?;
    log::info!("Loaded detection trace with {} frames", detector.len());

    let mut session =
        FaceDetectionSession::configure(config, Box::new(build_directory(&cli)), Box::new(detector));
    if cli.stats {
        session = session.with_logger(Box::new(StdoutAnalysisLogger::default()));
    }

    let (event_tx, event_rx) = crossbeam_channel::unbounded::<(FaceEvent, Arc<FaceSnapshot>)>();
    for event in FaceEvent::ALL {
        let tx = event_tx.clone();
        session.subscribe(event, move |snapshot| {
            let _ = tx.send((event, snapshot.clone()));
        });
    }
    drop(event_tx);

    let failures = Arc::new(AtomicUsize::new(0));
    let failure_count = failures.clone();
    session.on_error(move |_| {
        failure_count.fetch_add(1, Ordering::Relaxed);
    });

    let printer = std::thread::spawn(move || {
        for (event, snapshot) in event_rx {
            println!("{}", describe(event, &snapshot));
        }
    });

    session.start()?;
    session.run_to_end()?;

    let snapshot = session.current_snapshot();
    let dropped = session.frames_dropped();
    // Releases the subscribers so the printer sees the channel close.
    drop(session);
    printer
        .join()
        .map_err(|_| "Event printer thread panicked")?;

    log::info!(
        "Done: {} detection failures, {dropped} frames dropped",
        failures.load(Ordering::Relaxed)
    );

    if let Some(path) = &cli.snapshot_out {
        std::fs::write(path, serde_json::to_string_pretty(&*snapshot)?)?;
        log::info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => match SessionConfig::default_path().filter(|p| p.exists()) {
            Some(path) => {
                log::debug!("Using settings from {}", path.display());
                SessionConfig::load(&path)?
            }
            None => SessionConfig::default(),
        },
    };
    if let Some(camera) = cli.camera {
        config.camera_position = camera;
    }
    if let Some(accuracy) = cli.accuracy {
        config.accuracy = accuracy;
    }
    if let Some(mode) = cli.mode {
        config.notification_mode = mode;
    }
    Ok(config)
}

fn build_directory(cli: &Cli) -> StaticDeviceDirectory {
    let camera = |dir: &Path, position| -> Arc<dyn CaptureDevice> {
        let device = ImageSequenceDevice::new(dir, position);
        Arc::new(match cli.fps {
            Some(fps) => device.with_fps(fps),
            None => device,
        })
    };
    let mut directory =
        StaticDeviceDirectory::default().with_device(camera(&cli.front, CameraPosition::Front));
    if let Some(back) = &cli.back {
        directory = directory.with_device(camera(back, CameraPosition::Back));
    }
    directory
}

fn describe(event: FaceEvent, snapshot: &FaceSnapshot) -> String {
    match snapshot.bounding_box {
        Some(b) => format!(
            "{event:<18} box=({:.0}, {:.0}, {:.0}x{:.0})",
            b.x, b.y, b.width, b.height
        ),
        None => event.to_string(),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.front.is_dir() {
        return Err(format!("Front camera directory not found: {}", cli.front.display()).into());
    }
    if let Some(back) = &cli.back {
        if !back.is_dir() {
            return Err(format!("Back camera directory not found: {}", back.display()).into());
        }
    }
    if !cli.trace.is_file() {
        return Err(format!("Detection trace not found: {}", cli.trace.display()).into());
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(format!("FPS must be a positive number, got {fps}").into());
        }
    }
    Ok(())
}
