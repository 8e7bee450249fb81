//! Run configuration
//!
//! One [`DistillConfig`] value is built per run (defaults, then file, then
//! environment, then CLI) and handed to each component. Every section
//! deserializes with defaults, so partial TOML files are accepted.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::output::OverwritePolicy;
use crate::utils::logging::{LogFormat, LogLevel};

/// Default OpenAI-compatible transcription endpoint
pub const DEFAULT_TRANSCRIPTION_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Complete configuration of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistillConfig {
    pub detection: DetectionParams,
    pub motion: MotionParams,
    pub audio: AudioSettings,
    pub scoring: ScoringWeights,
    pub selection: SelectionParams,
    pub transcription: TranscriptionSettings,
    pub pipeline: PipelineSettings,
    pub logging: LoggingSettings,
}

/// Audio decoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Rate the decoded mono track is reduced to
    pub sample_rate: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { sample_rate: 16_000 }
    }
}

/// Speech transcription service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Disable to skip speech detection entirely
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Language hint passed with every request
    pub language: String,
    /// Read from `OPENAI_API_KEY`; never written back to disk
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_TRANSCRIPTION_ENDPOINT.to_string(),
            model: "whisper-1".to_string(),
            language: "en".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_concurrent: 4,
        }
    }
}

/// Worker pool and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Concurrent motion aggregation tasks
    pub workers: usize,
    pub overwrite: OverwritePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            overwrite: OverwritePolicy::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

impl DistillConfig {
    /// Check every section, failing on the first invalid value
    pub fn validate(&self) -> Result<(), DomainError> {
        self.detection.validate()?;
        self.scoring.validate()?;
        self.selection.validate()?;

        if self.audio.sample_rate < 1000 {
            return Err(DomainError::ConfigFail(format!(
                "audio.sample_rate must be at least 1000 Hz, got {}",
                self.audio.sample_rate
            )));
        }
        if self.pipeline.workers == 0 {
            return Err(DomainError::ConfigFail(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }

        let t = &self.transcription;
        if t.enabled {
            if t.max_concurrent == 0 {
                return Err(DomainError::ConfigFail(
                    "transcription.max_concurrent must be at least 1".to_string(),
                ));
            }
            if t.timeout_secs == 0 {
                return Err(DomainError::ConfigFail(
                    "transcription.timeout_secs must be at least 1".to_string(),
                ));
            }
            if !(t.endpoint.starts_with("http://") || t.endpoint.starts_with("https://")) {
                return Err(DomainError::ConfigFail(format!(
                    "transcription.endpoint must be an http(s) URL, got '{}'",
                    t.endpoint
                )));
            }
            if t.language.trim().is_empty() {
                return Err(DomainError::ConfigFail(
                    "transcription.language cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
