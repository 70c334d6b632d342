use std::fmt;

use serde::{Deserialize, Serialize};

use crate::notification::domain::notification_channel::Transition;

/// A discrete change reported by the engine. Carries no payload; the
/// snapshot delivered alongside it holds the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceEvent {
    FaceDetected,
    NoFaceDetected,
    Smiling,
    NotSmiling,
    Blinking,
    NotBlinking,
    Winking,
    NotWinking,
    LeftEyeClosed,
    LeftEyeOpen,
    RightEyeClosed,
    RightEyeOpen,
}

impl FaceEvent {
    pub const ALL: [FaceEvent; 12] = [
        FaceEvent::FaceDetected,
        FaceEvent::NoFaceDetected,
        FaceEvent::Smiling,
        FaceEvent::NotSmiling,
        FaceEvent::Blinking,
        FaceEvent::NotBlinking,
        FaceEvent::Winking,
        FaceEvent::NotWinking,
        FaceEvent::LeftEyeClosed,
        FaceEvent::LeftEyeOpen,
        FaceEvent::RightEyeClosed,
        FaceEvent::RightEyeOpen,
    ];

    /// The channel whose transitions produce this event.
    pub fn channel(self) -> Channel {
        match self {
            FaceEvent::FaceDetected | FaceEvent::NoFaceDetected => Channel::Presence,
            FaceEvent::Smiling | FaceEvent::NotSmiling => Channel::Smile,
            FaceEvent::Blinking | FaceEvent::NotBlinking => Channel::Blink,
            FaceEvent::Winking | FaceEvent::NotWinking => Channel::Wink,
            FaceEvent::LeftEyeClosed | FaceEvent::LeftEyeOpen => Channel::LeftEyeClosed,
            FaceEvent::RightEyeClosed | FaceEvent::RightEyeOpen => Channel::RightEyeClosed,
        }
    }
}

impl fmt::Display for FaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FaceEvent::FaceDetected => "face detected",
            FaceEvent::NoFaceDetected => "no face detected",
            FaceEvent::Smiling => "smiling",
            FaceEvent::NotSmiling => "not smiling",
            FaceEvent::Blinking => "blinking",
            FaceEvent::NotBlinking => "not blinking",
            FaceEvent::Winking => "winking",
            FaceEvent::NotWinking => "not winking",
            FaceEvent::LeftEyeClosed => "left eye closed",
            FaceEvent::LeftEyeOpen => "left eye open",
            FaceEvent::RightEyeClosed => "right eye closed",
            FaceEvent::RightEyeOpen => "right eye open",
        };
        f.pad(name)
    }
}

/// One tracked discrete attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Presence,
    Smile,
    Blink,
    Wink,
    LeftEyeClosed,
    RightEyeClosed,
}

impl Channel {
    pub const COUNT: usize = 6;

    pub const ALL: [Channel; Channel::COUNT] = [
        Channel::Presence,
        Channel::Smile,
        Channel::Blink,
        Channel::Wink,
        Channel::LeftEyeClosed,
        Channel::RightEyeClosed,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Maps a channel transition to the event it announces.
    pub fn event_for(self, transition: Transition) -> FaceEvent {
        let (entered_true, entered_false) = match self {
            Channel::Presence => (FaceEvent::FaceDetected, FaceEvent::NoFaceDetected),
            Channel::Smile => (FaceEvent::Smiling, FaceEvent::NotSmiling),
            Channel::Blink => (FaceEvent::Blinking, FaceEvent::NotBlinking),
            Channel::Wink => (FaceEvent::Winking, FaceEvent::NotWinking),
            Channel::LeftEyeClosed => (FaceEvent::LeftEyeClosed, FaceEvent::LeftEyeOpen),
            Channel::RightEyeClosed => (FaceEvent::RightEyeClosed, FaceEvent::RightEyeOpen),
        };
        match transition {
            Transition::EnteredTrue => entered_true,
            Transition::EnteredFalse => entered_false,
        }
    }
}
