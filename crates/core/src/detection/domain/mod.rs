pub mod face_attributes;
pub mod face_detector;
pub mod feature_extractor;
