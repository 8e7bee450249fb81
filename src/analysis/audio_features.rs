//! Per-scene audio energy and speech presence

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::analysis::audio::AudioTrack;
use crate::domain::errors::DomainError;
use crate::domain::model::{FeatureFailure, FeatureStage, Scene};
use crate::ports::TranscriptionPort;

/// Words of a detected transcript echoed to the debug log
const PREVIEW_WORDS: usize = 5;

/// Audio features of one scene
#[derive(Debug, Clone, PartialEq)]
pub struct AudioOutcome {
    pub energy: f64,
    pub speech_detected: bool,
    /// Set when speech detection failed and fell back to `false`
    pub failure: Option<FeatureFailure>,
}

/// Computes RMS energy and asks the transcription port whether a scene has speech
#[derive(Clone)]
pub struct AudioFeatureAggregator {
    transcriber: Arc<dyn TranscriptionPort>,
    language: String,
    timeout: Duration,
}

impl AudioFeatureAggregator {
    pub fn new(transcriber: Arc<dyn TranscriptionPort>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transcriber,
            language: language.into(),
            timeout,
        }
    }

    /// Never fails; transcription problems are reported in [`AudioOutcome::failure`]
    pub async fn aggregate(&self, track: &AudioTrack, scene: &Scene, index: usize) -> AudioOutcome {
        let clip = track.slice(scene);
        let energy = clip.rms();

        if clip.is_empty() {
            return AudioOutcome {
                energy,
                speech_detected: false,
                failure: None,
            };
        }

        let result = match tokio::time::timeout(
            self.timeout,
            self.transcriber.transcribe(&clip, &self.language),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DomainError::TranscriptionFailed(format!(
                "timed out after {:.1}s",
                self.timeout.as_secs_f64()
            ))),
        };

        match result {
            Ok(text) => {
                let text = text.trim();
                let speech_detected = !text.is_empty();
                if speech_detected {
                    let preview: Vec<&str> = text.split_whitespace().take(PREVIEW_WORDS).collect();
                    debug!(scene_index = index, preview = %preview.join(" "), "Speech detected");
                }
                AudioOutcome {
                    energy,
                    speech_detected,
                    failure: None,
                }
            }
            Err(err) => {
                warn!(scene_index = index, scene = %scene, error = %err, "Speech detection failed, assuming no speech");
                AudioOutcome {
                    energy,
                    speech_detected: false,
                    failure: Some(FeatureFailure {
                        scene_index: index,
                        scene: *scene,
                        stage: FeatureStage::Transcription,
                        message: err.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::audio::AudioClip;
    use async_trait::async_trait;

    struct FixedTranscriber(Result<String, DomainError>);

    #[async_trait]
    impl TranscriptionPort for FixedTranscriber {
        async fn transcribe(&self, _clip: &AudioClip<'_>, _language: &str) -> Result<String, DomainError> {
            self.0.clone()
        }
    }

    struct SlowTranscriber;

    #[async_trait]
    impl TranscriptionPort for SlowTranscriber {
        async fn transcribe(&self, _clip: &AudioClip<'_>, _language: &str) -> Result<String, DomainError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    fn track() -> AudioTrack {
        AudioTrack::new(vec![100; 8000 * 4], 8000)
    }

    fn aggregator(port: impl TranscriptionPort + 'static) -> AudioFeatureAggregator {
        AudioFeatureAggregator::new(Arc::new(port), "en", Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_speech_detected_from_transcript() {
        let agg = aggregator(FixedTranscriber(Ok("  hello there world  ".to_string())));
        let outcome = agg.aggregate(&track(), &Scene::new(0.0, 1.0).unwrap(), 0).await;
        assert!(outcome.speech_detected);
        assert_eq!(outcome.energy, 100.0);
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_transcript_is_not_speech() {
        let agg = aggregator(FixedTranscriber(Ok(" \n ".to_string())));
        let outcome = agg.aggregate(&track(), &Scene::new(0.0, 1.0).unwrap(), 0).await;
        assert!(!outcome.speech_detected);
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_transcription_error_is_recovered() {
        let agg = aggregator(FixedTranscriber(Err(DomainError::TranscriptionFailed(
            "service unavailable".to_string(),
        ))));
        let outcome = agg.aggregate(&track(), &Scene::new(1.0, 2.0).unwrap(), 3).await;
        assert!(!outcome.speech_detected);
        assert_eq!(outcome.energy, 100.0);

        let failure = outcome.failure.unwrap();
        assert_eq!(failure.scene_index, 3);
        assert_eq!(failure.stage, FeatureStage::Transcription);
    }

    #[tokio::test]
    async fn test_transcription_timeout_is_recovered() {
        let agg = aggregator(SlowTranscriber);
        let outcome = agg.aggregate(&track(), &Scene::new(0.0, 1.0).unwrap(), 0).await;
        assert!(!outcome.speech_detected);
        assert!(outcome.failure.unwrap().message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_scene_past_audio_end_is_silent() {
        let agg = aggregator(FixedTranscriber(Ok("never asked".to_string())));
        let outcome = agg.aggregate(&track(), &Scene::new(10.0, 12.0).unwrap(), 0).await;
        assert_eq!(outcome.energy, 0.0);
        assert!(!outcome.speech_detected);
    }
}
