pub mod face_event;
pub mod face_event_engine;
pub mod face_snapshot;
pub mod notification_channel;
pub mod subscriber_registry;
