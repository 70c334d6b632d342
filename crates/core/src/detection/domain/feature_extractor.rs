use crate::detection::domain::face_attributes::FaceAttributes;
use crate::detection::domain::face_detector::{DetectionOptions, DetectorAccuracy, FaceDetector};
use crate::shared::constants::DETECTOR_ORIENTATION_HINT;
use crate::shared::error::SessionError;
use crate::shared::frame::Frame;

/// Calls the detector with a fixed option set and vets its output.
///
/// Smile and blink signals are always requested and the orientation hint
/// is always [`DETECTOR_ORIENTATION_HINT`].
pub struct FeatureExtractor {
    detector: Box<dyn FaceDetector>,
    options: DetectionOptions,
}

impl FeatureExtractor {
    pub fn new(detector: Box<dyn FaceDetector>, accuracy: DetectorAccuracy) -> Self {
        Self {
            detector,
            options: DetectionOptions {
                accuracy,
                wants_smile: true,
                wants_blink: true,
                orientation_hint: DETECTOR_ORIENTATION_HINT,
            },
        }
    }

    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Detects faces in `frame`.
    ///
    /// A detector error or any malformed face fails the whole frame; a
    /// partially valid result is never returned.
    pub fn extract(&mut self, frame: &Frame) -> Result<Vec<FaceAttributes>, SessionError> {
        let faces = self
            .detector
            .detect(frame, &self.options)
            .map_err(|e| SessionError::detection_failure(frame.index(), e.to_string()))?;

        for face in &faces {
            face.validate()
                .map_err(|reason| SessionError::detection_failure(frame.index(), reason))?;
        }
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::geometry::Rect;
    use std::sync::{Arc, Mutex};

    struct StubDetector {
        result: Result<Vec<FaceAttributes>, String>,
        seen_options: Arc<Mutex<Vec<DetectionOptions>>>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
            options: &DetectionOptions,
        ) -> Result<Vec<FaceAttributes>, Box<dyn std::error::Error>> {
            self.seen_options.lock().unwrap().push(*options);
            self.result.clone().map_err(|e| e.into())
        }
    }

    fn extractor(
        result: Result<Vec<FaceAttributes>, String>,
    ) -> (FeatureExtractor, Arc<Mutex<Vec<DetectionOptions>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let detector = StubDetector {
            result,
            seen_options: seen.clone(),
        };
        (
            FeatureExtractor::new(Box::new(detector), DetectorAccuracy::BatterySaving),
            seen,
        )
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 3], 1, 1, 3, index)
    }

    fn face(x: f64) -> FaceAttributes {
        FaceAttributes::new(Rect::new(x, 0.0, 50.0, 50.0))
    }

    #[test]
    fn test_requests_smile_blink_and_fixed_orientation() {
        let (mut ex, seen) = extractor(Ok(vec![]));
        ex.extract(&frame(0)).unwrap();

        let options = seen.lock().unwrap()[0];
        assert!(options.wants_smile);
        assert!(options.wants_blink);
        assert_eq!(options.orientation_hint, 6);
        assert_eq!(options.accuracy, DetectorAccuracy::BatterySaving);
    }

    #[test]
    fn test_passes_faces_through_in_detector_order() {
        let (mut ex, _) = extractor(Ok(vec![face(30.0), face(10.0)]));
        let faces = ex.extract(&frame(0)).unwrap();

        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].bounds.x, 30.0);
        assert_eq!(faces[1].bounds.x, 10.0);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let (mut ex, _) = extractor(Ok(vec![]));
        assert!(ex.extract(&frame(0)).unwrap().is_empty());
    }

    #[test]
    fn test_detector_error_becomes_detection_failure() {
        let (mut ex, _) = extractor(Err("model crashed".into()));
        let err = ex.extract(&frame(9)).unwrap_err();

        assert_eq!(err, SessionError::detection_failure(9, "model crashed"));
    }

    #[test]
    fn test_malformed_face_fails_whole_frame() {
        let mut bad = face(0.0);
        bad.angle = Some(f64::INFINITY);
        let (mut ex, _) = extractor(Ok(vec![face(10.0), bad]));

        match ex.extract(&frame(4)) {
            Err(SessionError::DetectionFailure {
                frame_index,
                reason,
            }) => {
                assert_eq!(frame_index, 4);
                assert!(reason.contains("angle"));
            }
            other => panic!("expected detection failure, got {other:?}"),
        }
    }
}
