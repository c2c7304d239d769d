pub mod seeta_face_locator;
