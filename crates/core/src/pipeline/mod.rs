pub mod analysis_logger;
pub mod face_detection_session;
pub mod infrastructure;
pub mod session_config;
