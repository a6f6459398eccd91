use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("Camera initialization error: {0}")]
    InitializationError(String),
    #[error("Use case binding failed: {0}")]
    BindError(String),
    #[error("Not bound to a valid camera")]
    NotBound,
    #[error("Capture error: {0}")]
    CaptureError(String),
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CameraError {
    fn from(error: std::io::Error) -> Self {
        CameraError::IoError(error.to_string())
    }
}

impl From<image::ImageError> for CameraError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(e) => CameraError::IoError(e.to_string()),
            other => CameraError::EncodingError(other.to_string()),
        }
    }
}
