//! Tri-state tracker that turns boolean observations into transitions.
//!
//! A channel starts `Unknown` and leaves that state on its first
//! observation, never to return. In edge-triggered mode a transition is
//! only reported when the value flips between two *known* states, so the
//! first observation of a cold channel is always silent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    #[default]
    Unknown,
    False,
    True,
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

/// When a channel reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotificationMode {
    /// Only when the value flips from one known state to the other.
    #[default]
    #[serde(rename = "edge")]
    EdgeTriggered,
    /// On every observation.
    #[serde(rename = "level")]
    LevelTriggered,
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationMode::EdgeTriggered => write!(f, "edge"),
            NotificationMode::LevelTriggered => write!(f, "level"),
        }
    }
}

impl FromStr for NotificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edge" => Ok(NotificationMode::EdgeTriggered),
            "level" => Ok(NotificationMode::LevelTriggered),
            other => Err(format!("mode must be 'edge' or 'level', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnteredTrue,
    EnteredFalse,
}

#[derive(Debug, Clone)]
pub struct NotificationChannel {
    state: TriState,
    mode: NotificationMode,
}

impl NotificationChannel {
    pub fn new(mode: NotificationMode) -> Self {
        Self {
            state: TriState::Unknown,
            mode,
        }
    }

    pub fn state(&self) -> TriState {
        self.state
    }

    pub fn mode(&self) -> NotificationMode {
        self.mode
    }

    /// Records `value` and returns the transition to report, if any.
    pub fn observe(&mut self, value: bool) -> Option<Transition> {
        let transition = match (self.mode, self.state, value) {
            (NotificationMode::LevelTriggered, _, true) => Some(Transition::EnteredTrue),
            (NotificationMode::LevelTriggered, _, false) => Some(Transition::EnteredFalse),
            (NotificationMode::EdgeTriggered, TriState::False, true) => {
                Some(Transition::EnteredTrue)
            }
            (NotificationMode::EdgeTriggered, TriState::True, false) => {
                Some(Transition::EnteredFalse)
            }
            (NotificationMode::EdgeTriggered, _, _) => None,
        };
        self.state = TriState::from(value);
        transition
    }
}
