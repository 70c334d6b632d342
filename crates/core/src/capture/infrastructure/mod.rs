pub mod frame_source;
pub mod image_sequence_device;
pub mod latest_frame_slot;
