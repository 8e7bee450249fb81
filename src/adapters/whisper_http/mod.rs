// Whisper HTTP adapter - Speech transcription over an OpenAI-compatible API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::analysis::audio::AudioClip;
use crate::config::TranscriptionSettings;
use crate::domain::errors::DomainError;
use crate::ports::TranscriptionPort;

/// Transcribes WAV clips by posting them to a transcription endpoint
pub struct WhisperHttpAdapter {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl WhisperHttpAdapter {
    pub fn new(settings: &TranscriptionSettings) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| DomainError::ConfigFail(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TranscriptionPort for WhisperHttpAdapter {
    async fn transcribe(&self, clip: &AudioClip<'_>, language: &str) -> Result<String, DomainError> {
        let wav = clip.to_wav_bytes()?;
        let bytes = wav.len();

        let file = Part::bytes(wav)
            .file_name("scene.wav")
            .mime_str("audio/wav")
            .map_err(|e| DomainError::InternalError(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "text")
            .text("language", language.to_string());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(bytes, duration = clip.duration(), "Posting clip for transcription");
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::TranscriptionFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::TranscriptionFailed(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(DomainError::TranscriptionFailed(format!(
                "service returned {}: {}",
                status,
                body.trim()
            )));
        }
        Ok(body)
    }
}
