// Shared pipeline stages - detection and concurrent feature aggregation

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::analysis::audio::AudioTrack;
use crate::analysis::audio_features::{AudioFeatureAggregator, AudioOutcome};
use crate::analysis::motion::MotionActivityAggregator;
use crate::analysis::scene_detector::{DetectionStatus, SceneBoundaryDetector};
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::ports::VideoSource;

/// Run boundary detection on a blocking worker.
///
/// An empty or unreadable stream is an error; a pass that finds nothing is
/// [`DomainError::NoScenesDetected`].
pub async fn detect_scenes(
    source: Arc<dyn VideoSource>,
    params: DetectionParams,
) -> Result<Vec<Scene>, DomainError> {
    let started = Instant::now();
    let report = tokio::task::spawn_blocking(move || {
        let mut cursor = source.cursor()?;
        let detector = SceneBoundaryDetector::new(params);
        Ok::<_, DomainError>(detector.detect(cursor.as_mut(), source.info()))
    })
    .await
    .map_err(|e| DomainError::InternalError(format!("detection task failed: {}", e)))??;

    match &report.status {
        DetectionStatus::Complete => info!(
            scenes = report.scenes.len(),
            frames_sampled = report.frames_sampled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scene detection finished"
        ),
        DetectionStatus::Empty => warn!("Video stream yielded no frames"),
        DetectionStatus::Unreadable(reason) => warn!(
            scenes_before_failure = report.scenes.len(),
            reason = %reason,
            "Scene detection aborted"
        ),
    }

    report.into_result()
}

/// Per-scene features in scene order, plus the recovered failures
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub features: Vec<SceneFeatures>,
    pub failures: Vec<FeatureFailure>,
}

enum TaskOutput {
    Motion(usize, Result<f64, DomainError>),
    Audio(usize, AudioOutcome),
}

/// Runs motion and audio aggregation for every scene concurrently
#[derive(Clone)]
pub struct FeaturePipeline {
    motion: MotionActivityAggregator,
    audio: AudioFeatureAggregator,
    workers: usize,
    max_transcriptions: usize,
}

impl FeaturePipeline {
    pub fn new(
        motion: MotionActivityAggregator,
        audio: AudioFeatureAggregator,
        workers: usize,
        max_transcriptions: usize,
    ) -> Self {
        Self {
            motion,
            audio,
            workers: workers.max(1),
            max_transcriptions: max_transcriptions.max(1),
        }
    }

    /// Aggregate features for `scenes`.
    ///
    /// Motion tasks run on blocking workers, each with a private cursor, under
    /// a pool of `workers` permits. Audio tasks share the decoded track and
    /// hold a separate pool of transcription permits. Recoverable per-scene
    /// failures fall back to zero motion or no speech and are listed in the
    /// result; a fatal error aborts the remaining tasks.
    pub async fn aggregate(
        &self,
        source: Arc<dyn VideoSource>,
        track: Arc<AudioTrack>,
        scenes: &[Scene],
    ) -> Result<FeatureSet, DomainError> {
        let started = Instant::now();
        let cpu_permits = Arc::new(Semaphore::new(self.workers));
        let speech_permits = Arc::new(Semaphore::new(self.max_transcriptions));
        let mut tasks = JoinSet::new();

        for (index, scene) in scenes.iter().copied().enumerate() {
            let source = Arc::clone(&source);
            let permits = Arc::clone(&cpu_permits);
            let motion = self.motion.clone();
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(permit) => tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        let mut cursor = source.cursor()?;
                        motion.aggregate(cursor.as_mut(), &scene)
                    })
                    .await
                    .unwrap_or_else(|e| Err(DomainError::InternalError(e.to_string())))
                    .map_err(|e| DomainError::FeatureAggregationFailure(format!("motion: {}", e))),
                    Err(_) => Err(DomainError::InternalError("worker pool closed".to_string())),
                };
                TaskOutput::Motion(index, result)
            });

            let track = Arc::clone(&track);
            let permits = Arc::clone(&speech_permits);
            let audio = self.audio.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                TaskOutput::Audio(index, audio.aggregate(&track, &scene, index).await)
            });
        }

        let mut motion_values: Vec<Option<f64>> = vec![None; scenes.len()];
        let mut audio_values: Vec<Option<AudioOutcome>> = vec![None; scenes.len()];
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(TaskOutput::Motion(index, Ok(value))) => motion_values[index] = Some(value),
                Ok(TaskOutput::Motion(index, Err(err))) => {
                    if err.is_fatal() {
                        tasks.abort_all();
                        return Err(err);
                    }
                    warn!(scene_index = index, error = %err, "Motion aggregation failed, using zero");
                    motion_values[index] = Some(0.0);
                    failures.push(FeatureFailure {
                        scene_index: index,
                        scene: scenes[index],
                        stage: FeatureStage::Motion,
                        message: err.to_string(),
                    });
                }
                Ok(TaskOutput::Audio(index, outcome)) => audio_values[index] = Some(outcome),
                Err(err) => warn!(error = %err, "Aggregation task did not complete"),
            }
        }

        let mut features = Vec::with_capacity(scenes.len());
        for (index, scene) in scenes.iter().enumerate() {
            let motion_activity = motion_values[index].unwrap_or_else(|| {
                failures.push(FeatureFailure {
                    scene_index: index,
                    scene: *scene,
                    stage: FeatureStage::Motion,
                    message: "motion task did not complete".to_string(),
                });
                0.0
            });
            let outcome = audio_values[index].take().unwrap_or_else(|| AudioOutcome {
                energy: 0.0,
                speech_detected: false,
                failure: Some(FeatureFailure {
                    scene_index: index,
                    scene: *scene,
                    stage: FeatureStage::Audio,
                    message: "audio task did not complete".to_string(),
                }),
            });
            if let Some(failure) = outcome.failure {
                failures.push(failure);
            }

            let merged = SceneFeatures {
                scene: *scene,
                audio_energy: outcome.energy,
                motion_activity,
                speech_detected: outcome.speech_detected,
            };
            debug!(
                scene_index = index,
                energy = merged.audio_energy,
                motion = merged.motion_activity,
                speech = merged.speech_detected,
                "Scene features"
            );
            features.push(merged);
        }

        failures.sort_by_key(|f| f.scene_index);
        info!(
            scenes = scenes.len(),
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Feature aggregation finished"
        );

        Ok(FeatureSet { features, failures })
    }
}
