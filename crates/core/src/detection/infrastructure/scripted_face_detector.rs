use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_attributes::FaceAttributes;
use crate::detection::domain::face_detector::{DetectionOptions, FaceDetector};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read detection trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid detection trace entry on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Outcome recorded for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedOutcome {
    Faces(Vec<FaceAttributes>),
    Failure(String),
}

#[derive(Deserialize)]
struct TraceLine {
    frame: usize,
    #[serde(default)]
    faces: Vec<FaceAttributes>,
    #[serde(default)]
    error: Option<String>,
}

/// Replays recorded detector output by frame index.
///
/// Lets the event engine run against a camera stream without a detection
/// model. Frames missing from the script report no face.
pub struct ScriptedFaceDetector {
    script: Arc<HashMap<usize, ScriptedOutcome>>,
}

impl ScriptedFaceDetector {
    pub fn new(script: Arc<HashMap<usize, ScriptedOutcome>>) -> Self {
        Self { script }
    }

    /// Loads a JSON-lines trace.
    ///
    /// Each line is `{"frame": N, "faces": [...]}` or
    /// `{"frame": N, "error": "..."}`. Blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let text = std::fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(Arc::new(parse_trace(&text)?)))
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

fn parse_trace(text: &str) -> Result<HashMap<usize, ScriptedOutcome>, TraceError> {
    let mut script = HashMap::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: TraceLine = serde_json::from_str(line).map_err(|source| TraceError::Parse {
            line: i + 1,
            source,
        })?;
        let outcome = match entry.error {
            Some(message) => ScriptedOutcome::Failure(message),
            None => ScriptedOutcome::Faces(entry.faces),
        };
        script.insert(entry.frame, outcome);
    }
    Ok(script)
}

impl FaceDetector for ScriptedFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        _options: &DetectionOptions,
    ) -> Result<Vec<FaceAttributes>, Box<dyn std::error::Error>> {
        match self.script.get(&frame.index()) {
            Some(ScriptedOutcome::Faces(faces)) => Ok(faces.clone()),
            Some(ScriptedOutcome::Failure(message)) => Err(message.clone().into()),
            None => Ok(Vec::new()),
        }
    }
}
