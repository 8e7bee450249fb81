//! Error handling module for Distill

use thiserror::Error;

/// Main error type for Distill library operations
#[derive(Error, Debug)]
pub enum DistillError {
    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Report serialization error
    #[error("Failed to serialize report: {message}")]
    SerializationError { message: String },

    /// Output file write error
    #[error("Failed to write output file: {message}")]
    OutputError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for DistillError {
    fn from(e: serde_json::Error) -> Self {
        DistillError::SerializationError {
            message: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for DistillError {
    fn from(e: serde_yaml::Error) -> Self {
        DistillError::SerializationError {
            message: e.to_string(),
        }
    }
}

/// Result type alias for Distill operations
pub type DistillResult<T> = std::result::Result<T, DistillError>;
