// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Configuration could not be loaded or failed validation
    ConfigFail(String),
    /// Frame or audio source cannot be opened or read
    SourceUnreadable(String),
    /// Boundary detection produced no scenes
    NoScenesDetected,
    /// Per-scene feature computation failed
    FeatureAggregationFailure(String),
    /// Selector received no scored scenes
    EmptySelection,
    /// Transcription service error or timeout
    TranscriptionFailed(String),
    /// Rendering the highlight plan failed
    RenderFail(String),
    /// File system operation failed
    FsFail(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Whether the error aborts the run.
    ///
    /// Per-scene aggregation and transcription failures are recovered by the
    /// pipeline; everything else surfaces to the caller.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DomainError::FeatureAggregationFailure(_) | DomainError::TranscriptionFailed(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::ConfigFail(msg) => write!(f, "Configuration error: {}", msg),
            DomainError::SourceUnreadable(msg) => write!(f, "Source unreadable: {}", msg),
            DomainError::NoScenesDetected => write!(f, "No scenes detected"),
            DomainError::FeatureAggregationFailure(msg) => {
                write!(f, "Feature aggregation failed: {}", msg)
            }
            DomainError::EmptySelection => write!(f, "No scored scenes to select from"),
            DomainError::TranscriptionFailed(msg) => write!(f, "Transcription failed: {}", msg),
            DomainError::RenderFail(msg) => write!(f, "Render failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_scene_failures_are_recoverable() {
        assert!(!DomainError::FeatureAggregationFailure("motion".into()).is_fatal());
        assert!(!DomainError::TranscriptionFailed("timeout".into()).is_fatal());
        assert!(DomainError::SourceUnreadable("eof".into()).is_fatal());
        assert!(DomainError::InternalError("worker pool closed".into()).is_fatal());
        assert!(DomainError::NoScenesDetected.is_fatal());
    }
}
