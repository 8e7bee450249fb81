// Silent transcriber - Used when transcription is disabled

use async_trait::async_trait;

use crate::analysis::audio::AudioClip;
use crate::domain::errors::DomainError;
use crate::ports::TranscriptionPort;

/// Transcriber that never hears speech
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentTranscriber;

#[async_trait]
impl TranscriptionPort for SilentTranscriber {
    async fn transcribe(&self, _clip: &AudioClip<'_>, _language: &str) -> Result<String, DomainError> {
        Ok(String::new())
    }
}
