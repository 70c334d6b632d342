use serde::{Deserialize, Serialize};

use crate::shared::geometry::{Point, Rect};

/// What the detector reports for one face in one frame.
///
/// Positional fields are `None` when the detector could not locate that
/// feature. The boolean signals default to `false` when not requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceAttributes {
    pub bounds: Rect,
    /// Roll of the face in degrees.
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub left_eye_position: Option<Point>,
    #[serde(default)]
    pub right_eye_position: Option<Point>,
    #[serde(default)]
    pub mouth_position: Option<Point>,
    #[serde(default)]
    pub has_smile: bool,
    #[serde(default)]
    pub left_eye_closed: bool,
    #[serde(default)]
    pub right_eye_closed: bool,
}

impl FaceAttributes {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            angle: None,
            left_eye_position: None,
            right_eye_position: None,
            mouth_position: None,
            has_smile: false,
            left_eye_closed: false,
            right_eye_closed: false,
        }
    }

    pub fn any_eye_closed(&self) -> bool {
        self.left_eye_closed || self.right_eye_closed
    }

    pub fn both_eyes_closed(&self) -> bool {
        self.left_eye_closed && self.right_eye_closed
    }

    /// Describes the first malformed field, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !self.bounds.is_well_formed() {
            return Err(format!("malformed face bounds {:?}", self.bounds));
        }
        if let Some(angle) = self.angle {
            if !angle.is_finite() {
                return Err(format!("non-finite face angle {angle}"));
            }
        }
        let points = [
            ("left eye", self.left_eye_position),
            ("right eye", self.right_eye_position),
            ("mouth", self.mouth_position),
        ];
        for (label, point) in points {
            if point.is_some_and(|p| !p.is_finite()) {
                return Err(format!("non-finite {label} position"));
            }
        }
        Ok(())
    }
}
