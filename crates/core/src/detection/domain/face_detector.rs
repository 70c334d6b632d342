use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::detection::domain::face_attributes::FaceAttributes;
use crate::shared::frame::Frame;

/// Trade-off between detection quality and power draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorAccuracy {
    BatterySaving,
    #[default]
    HigherPerformance,
}

impl fmt::Display for DetectorAccuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorAccuracy::BatterySaving => write!(f, "battery-saving"),
            DetectorAccuracy::HigherPerformance => write!(f, "higher-performance"),
        }
    }
}

impl FromStr for DetectorAccuracy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "battery-saving" | "low" => Ok(DetectorAccuracy::BatterySaving),
            "higher-performance" | "high" => Ok(DetectorAccuracy::HigherPerformance),
            other => Err(format!(
                "accuracy must be 'battery-saving' or 'higher-performance', got '{other}'"
            )),
        }
    }
}

/// Per-call options for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionOptions {
    pub accuracy: DetectorAccuracy,
    pub wants_smile: bool,
    pub wants_blink: bool,
    /// EXIF orientation of the pixel data.
    pub orientation_hint: u32,
}

/// Domain interface for facial-feature detection.
///
/// Returns one entry per face, in whatever order the implementation finds
/// them. Implementations may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        options: &DetectionOptions,
    ) -> Result<Vec<FaceAttributes>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::long_low("battery-saving", DetectorAccuracy::BatterySaving)]
    #[case::short_low("low", DetectorAccuracy::BatterySaving)]
    #[case::long_high("higher-performance", DetectorAccuracy::HigherPerformance)]
    #[case::short_high("high", DetectorAccuracy::HigherPerformance)]
    fn test_accuracy_parses(#[case] input: &str, #[case] expected: DetectorAccuracy) {
        assert_eq!(input.parse::<DetectorAccuracy>().unwrap(), expected);
    }

    #[test]
    fn test_accuracy_rejects_unknown() {
        assert!("medium".parse::<DetectorAccuracy>().is_err());
    }

    #[test]
    fn test_accuracy_serializes_kebab_case() {
        let json = serde_json::to_string(&DetectorAccuracy::BatterySaving).unwrap();
        assert_eq!(json, "\"battery-saving\"");
    }
}
