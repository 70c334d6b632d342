use crate::detection::domain::face_attributes::FaceAttributes;
use crate::detection::domain::feature_extractor::FeatureExtractor;
use crate::notification::domain::face_event::{Channel, FaceEvent};
use crate::notification::domain::face_snapshot::FaceSnapshot;
use crate::notification::domain::notification_channel::{NotificationChannel, NotificationMode};
use crate::shared::error::SessionError;
use crate::shared::frame::Frame;

/// Turns per-frame detector output into face events.
///
/// Holds one notification channel per discrete attribute plus the latest
/// snapshot. Both survive across frames and across session restarts.
pub struct FaceEventEngine {
    extractor: FeatureExtractor,
    mode: NotificationMode,
    channels: [NotificationChannel; Channel::COUNT],
    snapshot: FaceSnapshot,
}

impl FaceEventEngine {
    pub fn new(extractor: FeatureExtractor, mode: NotificationMode) -> Self {
        Self {
            extractor,
            mode,
            channels: [(); Channel::COUNT].map(|_| NotificationChannel::new(mode)),
            snapshot: FaceSnapshot::default(),
        }
    }

    pub fn mode(&self) -> NotificationMode {
        self.mode
    }

    pub fn snapshot(&self) -> &FaceSnapshot {
        &self.snapshot
    }

    /// Analyzes one frame and returns the events it produced, in order.
    ///
    /// On a detection failure no channel or snapshot field changes.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<Vec<FaceEvent>, SessionError> {
        let faces = self.extractor.extract(frame)?;
        let events = self.apply_faces(&faces);
        if !events.is_empty() {
            log::debug!("Frame {}: {:?}", frame.index(), events);
        }
        Ok(events)
    }

    /// Folds detected faces into the channels and snapshot.
    ///
    /// Faces are applied in detector order, so with several faces the last
    /// one determines the continuous fields.
    pub fn apply_faces(&mut self, faces: &[FaceAttributes]) -> Vec<FaceEvent> {
        let mut events = Vec::new();

        if faces.is_empty() {
            self.observe(Channel::Presence, false, &mut events);
            return events;
        }

        self.observe(Channel::Presence, true, &mut events);
        for face in faces {
            self.update_geometry(face);
            self.observe(Channel::Smile, face.has_smile, &mut events);

            if face.any_eye_closed() {
                self.observe(Channel::Wink, true, &mut events);
                if face.left_eye_closed {
                    self.observe(Channel::LeftEyeClosed, true, &mut events);
                }
                if face.right_eye_closed {
                    self.observe(Channel::RightEyeClosed, true, &mut events);
                }
                if face.both_eyes_closed() {
                    self.observe(Channel::Blink, true, &mut events);
                }
            } else {
                self.observe(Channel::Blink, false, &mut events);
                self.observe(Channel::Wink, false, &mut events);
                self.observe(Channel::LeftEyeClosed, false, &mut events);
                self.observe(Channel::RightEyeClosed, false, &mut events);
            }
        }
        events
    }

    fn update_geometry(&mut self, face: &FaceAttributes) {
        let snapshot = &mut self.snapshot;
        snapshot.bounding_box = Some(face.bounds);
        if let Some(angle) = face.angle {
            snapshot.angle_delta = Some(angle - snapshot.angle.unwrap_or(0.0));
            snapshot.angle = Some(angle);
        }
        if face.left_eye_position.is_some() {
            snapshot.left_eye_position = face.left_eye_position;
        }
        if face.right_eye_position.is_some() {
            snapshot.right_eye_position = face.right_eye_position;
        }
        if face.mouth_position.is_some() {
            snapshot.mouth_position = face.mouth_position;
        }
    }

    fn observe(&mut self, channel: Channel, value: bool, events: &mut Vec<FaceEvent>) {
        let tracker = &mut self.channels[channel.index()];
        if let Some(transition) = tracker.observe(value) {
            events.push(channel.event_for(transition));
        }
        self.snapshot.set_channel_state(channel, tracker.state());
    }
}
