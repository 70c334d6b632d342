pub mod scripted_face_detector;
