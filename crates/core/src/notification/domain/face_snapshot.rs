use serde::Serialize;

use crate::notification::domain::face_event::Channel;
use crate::notification::domain::notification_channel::TriState;
use crate::shared::geometry::{Point, Rect};

/// Latest known attributes of the tracked face.
///
/// Continuous fields keep their last value when the face is lost; only
/// `presence` reflects whether the most recent frame contained a face.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FaceSnapshot {
    pub presence: TriState,
    pub bounding_box: Option<Rect>,
    /// Degrees.
    pub angle: Option<f64>,
    pub angle_delta: Option<f64>,
    pub left_eye_position: Option<Point>,
    pub right_eye_position: Option<Point>,
    pub mouth_position: Option<Point>,
    pub smile: TriState,
    pub blink: TriState,
    pub wink: TriState,
    pub left_eye_closed: TriState,
    pub right_eye_closed: TriState,
}

impl FaceSnapshot {
    pub(crate) fn set_channel_state(&mut self, channel: Channel, state: TriState) {
        let field = match channel {
            Channel::Presence => &mut self.presence,
            Channel::Smile => &mut self.smile,
            Channel::Blink => &mut self.blink,
            Channel::Wink => &mut self.wink,
            Channel::LeftEyeClosed => &mut self.left_eye_closed,
            Channel::RightEyeClosed => &mut self.right_eye_closed,
        };
        *field = state;
    }
}
