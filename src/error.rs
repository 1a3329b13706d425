//! Error taxonomy for the redaction engine.
//!
//! Degenerate geometry is never an error; it is skipped where it is drawn.
//! Everything that does surface falls into one of the kinds below so callers
//! can tell a rejected upload apart from a failed detector call.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedactError>;

/// Failure reported by an external detection or classification service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service} failed: {message}")]
pub struct ServiceError {
    /// Which collaborator failed ("face detection", "text detection", ...)
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RedactError {
    /// Missing or malformed input, rejected before any work starts
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedactError {
    pub fn input(message: impl Into<String>) -> Self {
        RedactError::Input(message.into())
    }

    /// Short message suitable for showing to a user.
    ///
    /// Service failures collapse to a generic message so detector or
    /// classifier internals never reach the UI.
    pub fn user_message(&self) -> String {
        match self {
            RedactError::Input(message) => message.clone(),
            RedactError::Service(_) => "Processing failed. Please try again.".to_string(),
            RedactError::Decode(_) => "The image could not be read.".to_string(),
            RedactError::Encode(_) => "The output image could not be written.".to_string(),
            RedactError::Io(e) => format!("File error: {}", e),
            RedactError::Json(_) => "The detection data is not valid JSON.".to_string(),
        }
    }

    pub fn is_service_failure(&self) -> bool {
        matches!(self, RedactError::Service(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_message_hides_internals() {
        let err = RedactError::from(ServiceError::new("text detection", "quota exceeded: key abc123"));
        assert!(err.is_service_failure());
        assert!(!err.user_message().contains("abc123"));
        assert!(err.to_string().contains("text detection"));
    }

    #[test]
    fn test_input_message_passes_through() {
        let err = RedactError::input("No file uploaded. Please upload an image.");
        assert_eq!(err.user_message(), "No file uploaded. Please upload an image.");
        assert!(!err.is_service_failure());
    }
}
