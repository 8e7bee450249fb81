use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use distill_cli::adapters::{MemoryMediaAdapter, MemoryVideoSource, SilentTranscriber};
use distill_cli::analysis::audio::{AudioClip, AudioTrack};
use distill_cli::analysis::audio_features::AudioFeatureAggregator;
use distill_cli::analysis::frame::VideoFrame;
use distill_cli::analysis::motion::MotionActivityAggregator;
use distill_cli::app::container::{AppContainer, DefaultAppContainer};
use distill_cli::app::pipeline::FeaturePipeline;
use distill_cli::app::scenes_interactor::ScenesRequest;
use distill_cli::app::summarize_interactor::SummarizeRequest;
use distill_cli::domain::model::*;
use distill_cli::ports::*;
use distill_cli::{DistillConfig, DomainError};

/// Test fixtures built entirely in memory
mod test_utils {
    use super::*;

    /// Textured frame so optical flow has gradients to track
    pub fn textured(tint: [u8; 3], shift: u32) -> RgbImage {
        RgbImage::from_fn(48, 32, |x, y| {
            let v = ((((x + shift) as f64) * 0.4).sin() * 40.0 + ((y as f64) * 0.3).cos() * 40.0)
                as i32;
            Rgb([
                (tint[0] as i32 + v).clamp(0, 255) as u8,
                (tint[1] as i32 + v).clamp(0, 255) as u8,
                (tint[2] as i32 + v).clamp(0, 255) as u8,
            ])
        })
    }

    /// `seconds` identical frames at 1 fps
    pub fn static_video(seconds: usize) -> MemoryVideoSource {
        let frames = (0..seconds)
            .map(|t| VideoFrame::new(t as f64, textured([120, 120, 40], 0)))
            .collect();
        MemoryVideoSource::new(frames, 1.0)
    }

    /// 1 fps: a red stretch, a burst cycling three tints on every frame, a blue stretch
    pub fn cut_video() -> MemoryVideoSource {
        let burst = [[50, 50, 190], [50, 190, 50], [190, 190, 50]];
        let frames = (0..30u32)
            .map(|t| {
                let image = match t {
                    0..=9 => textured([190, 50, 50], 0),
                    10..=19 => textured(burst[(t % 3) as usize], t % 3),
                    _ => textured([50, 50, 190], 0),
                };
                VideoFrame::new(t as f64, image)
            })
            .collect();
        MemoryVideoSource::new(frames, 1.0)
    }

    /// Source whose cursors crash while opening
    pub struct CrashingSource {
        pub info: VideoInfo,
    }

    impl VideoSource for CrashingSource {
        fn info(&self) -> &VideoInfo {
            &self.info
        }

        fn cursor(&self) -> Result<Box<dyn FrameCursor>, DomainError> {
            panic!("decoder crashed")
        }
    }

    /// Mono track where every sample of second `n` equals `n * 100`
    pub fn stepped_audio(seconds: usize, sample_rate: u32) -> AudioTrack {
        let samples = (0..seconds)
            .flat_map(|n| std::iter::repeat((n * 100) as i16).take(sample_rate as usize))
            .collect();
        AudioTrack::new(samples, sample_rate)
    }

    pub fn config() -> DistillConfig {
        let mut config = DistillConfig::default();
        config.detection.frame_skip = 1;
        config.detection.min_scene_duration = 3.0;
        config.pipeline.workers = 2;
        config.transcription.max_concurrent = 2;
        config.transcription.timeout_secs = 5;
        config
    }

    /// Speaks everywhere except clips whose first sample is `fail_on`
    pub struct ScriptedTranscriber {
        pub fail_on: Option<i16>,
        pub calls: AtomicUsize,
    }

    impl ScriptedTranscriber {
        pub fn failing_on(sample: i16) -> Self {
            Self {
                fail_on: Some(sample),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always_speaking() -> Self {
            Self {
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscriptionPort for ScriptedTranscriber {
        async fn transcribe(
            &self,
            clip: &AudioClip<'_>,
            _language: &str,
        ) -> Result<String, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (self.fail_on, clip.samples().first()) {
                (Some(fail), Some(first)) if *first == fail => Err(
                    DomainError::TranscriptionFailed("service unavailable".to_string()),
                ),
                _ => Ok("hello and welcome".to_string()),
            }
        }
    }

    /// Records render requests instead of writing video
    #[derive(Default)]
    pub struct RecordingRender {
        pub plans: Mutex<Vec<HighlightPlan>>,
    }

    #[async_trait]
    impl RenderPort for RecordingRender {
        async fn render_plan(
            &self,
            _input: &Path,
            plan: &HighlightPlan,
            output: &Path,
        ) -> Result<RenderReport, DomainError> {
            self.plans.lock().unwrap().push(plan.clone());
            Ok(RenderReport {
                output_file: output.to_path_buf(),
                segments_written: plan.len(),
                duration: plan.total_duration(),
                file_size: 0,
                processing_time: Duration::ZERO,
            })
        }

        async fn export_scenes(
            &self,
            _input: &Path,
            scenes: &[Scene],
            output_dir: &Path,
        ) -> Result<Vec<PathBuf>, DomainError> {
            Ok((1..=scenes.len())
                .map(|n| output_dir.join(format!("scene_{}.mp4", n)))
                .collect())
        }
    }

    pub fn container(
        media: MemoryMediaAdapter,
        transcriber: Arc<dyn TranscriptionPort>,
        config: DistillConfig,
    ) -> (DefaultAppContainer, Arc<RecordingRender>) {
        let render = Arc::new(RecordingRender::default());
        let container = DefaultAppContainer::with_ports(
            config,
            Arc::new(media),
            transcriber,
            Arc::clone(&render) as Arc<dyn RenderPort>,
        );
        (container, render)
    }
}

use test_utils::*;

#[tokio::test]
async fn test_summarize_static_video() {
    let media = MemoryMediaAdapter::new(static_video(40)).with_audio(stepped_audio(40, 1000));
    let (container, render) = container(
        media,
        Arc::new(ScriptedTranscriber::always_speaking()),
        config(),
    );

    let request = SummarizeRequest::new("talk.mp4").with_render_output("reel.mp4");
    let report = container.summarize_interactor().execute(request).await.unwrap();

    assert_eq!(report.scenes_detected, 1);
    assert_eq!(report.plan.scenes(), &[Scene::new(0.0, 40.0).unwrap()]);
    assert!(report.scored_scenes[0].features.speech_detected);
    assert!(report.failures.is_empty());
    assert_eq!(report.source_duration, 40.0);

    let rendered = report.rendered.unwrap();
    assert_eq!(rendered.output_file, PathBuf::from("reel.mp4"));
    assert_eq!(render.plans.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_summarize_plan_respects_budget_or_minimum() {
    let mut config = config();
    config.selection.summary_fraction = 0.3;
    config.selection.min_scenes = 1;
    config.transcription.enabled = false;

    let (container, _) = container(
        MemoryMediaAdapter::new(cut_video()).with_audio(stepped_audio(30, 1000)),
        Arc::new(SilentTranscriber),
        config,
    );
    let report = container
        .summarize_interactor()
        .execute(SummarizeRequest::new("cuts.mp4"))
        .await
        .unwrap();

    // Cut burst sampled every other frame closes the first scene at 16s
    assert_eq!(report.scenes_detected, 2);
    let detected: Vec<Scene> = report.scored_scenes.iter().map(|s| *s.scene()).collect();
    assert_eq!(
        detected,
        vec![Scene::new(0.0, 16.0).unwrap(), Scene::new(16.0, 30.0).unwrap()]
    );
    // Neither scene fits the 9s budget, so the minimum of one is taken
    assert_eq!(report.plan.len(), 1);
    assert!(report.rendered.is_none());
}

#[tokio::test]
async fn test_empty_plan_without_minimum_is_reported() {
    let mut config = config();
    config.selection.summary_fraction = 0.0;
    config.selection.min_scenes = 0;
    config.transcription.enabled = false;

    let (container, _) = container(
        MemoryMediaAdapter::new(static_video(20)),
        Arc::new(SilentTranscriber),
        config,
    );
    let result = container
        .summarize_interactor()
        .execute(SummarizeRequest::new("talk.mp4"))
        .await;

    match result {
        Err(DomainError::BadArgs(msg)) => assert!(msg.contains("budget"), "{}", msg),
        other => panic!("expected BadArgs, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_source_is_no_scenes() {
    let media = MemoryMediaAdapter::new(MemoryVideoSource::new(Vec::new(), 25.0));
    let (container, _) = container(media, Arc::new(SilentTranscriber), config());

    let result = container
        .summarize_interactor()
        .execute(SummarizeRequest::new("empty.mp4"))
        .await;
    assert_eq!(result.unwrap_err(), DomainError::NoScenesDetected);
}

#[tokio::test]
async fn test_unreadable_source_fails() {
    let (container, _) = container(
        MemoryMediaAdapter::unreadable(),
        Arc::new(SilentTranscriber),
        config(),
    );

    let result = container
        .summarize_interactor()
        .execute(SummarizeRequest::new("missing.mp4"))
        .await;
    assert!(matches!(result, Err(DomainError::SourceUnreadable(_))));
}

#[tokio::test]
async fn test_mid_stream_read_error_is_fatal() {
    let media = MemoryMediaAdapter::new(static_video(20).failing_at(4));
    let (container, _) = container(media, Arc::new(SilentTranscriber), config());

    let result = container
        .scenes_interactor()
        .execute(ScenesRequest {
            input: PathBuf::from("broken.mp4"),
            export_dir: None,
        })
        .await;
    assert!(matches!(result, Err(DomainError::SourceUnreadable(_))));
}

#[tokio::test]
async fn test_missing_audio_scores_without_speech() {
    let transcriber = Arc::new(ScriptedTranscriber::always_speaking());
    let (container, _) = container(
        MemoryMediaAdapter::new(static_video(12)),
        Arc::clone(&transcriber) as Arc<dyn TranscriptionPort>,
        config(),
    );

    let report = container
        .summarize_interactor()
        .execute(SummarizeRequest::new("mute.mp4"))
        .await
        .unwrap();

    let scored = &report.scored_scenes[0];
    assert_eq!(scored.features.audio_energy, 0.0);
    assert!(!scored.features.speech_detected);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_transcription_only_affects_its_scene() {
    let scenes: Vec<Scene> = (0..4)
        .map(|n| Scene::new(n as f64 * 10.0, (n + 1) as f64 * 10.0).unwrap())
        .collect();
    let source: Arc<dyn VideoSource> = Arc::new(static_video(40));
    let track = Arc::new(stepped_audio(40, 1000));

    // Scene 2 starts at second 20, whose samples are 2000
    let transcriber = Arc::new(ScriptedTranscriber::failing_on(2000));
    let pipeline = FeaturePipeline::new(
        MotionActivityAggregator::new(&MotionParams::default()),
        AudioFeatureAggregator::new(
            Arc::clone(&transcriber) as Arc<dyn TranscriptionPort>,
            "en".to_string(),
            Duration::from_secs(5),
        ),
        2,
        2,
    );

    let set = pipeline.aggregate(source, track, &scenes).await.unwrap();

    let speech: Vec<bool> = set.features.iter().map(|f| f.speech_detected).collect();
    assert_eq!(speech, vec![true, true, false, true]);
    assert_eq!(set.failures.len(), 1);
    assert_eq!(set.failures[0].scene_index, 2);
    assert_eq!(set.failures[0].stage, FeatureStage::Transcription);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 4);

    // Features stay in scene order with their own energy
    for (features, scene) in set.features.iter().zip(&scenes) {
        assert_eq!(&features.scene, scene);
    }
    assert!(set.features[3].audio_energy > set.features[1].audio_energy);
}

#[tokio::test]
async fn test_motion_failure_is_recovered() {
    let scenes = vec![
        Scene::new(0.0, 5.0).unwrap(),
        Scene::new(5.0, 10.0).unwrap(),
    ];
    let source: Arc<dyn VideoSource> = Arc::new(static_video(10).failing_at(7));
    let pipeline = FeaturePipeline::new(
        MotionActivityAggregator::new(&MotionParams::default()),
        AudioFeatureAggregator::new(Arc::new(SilentTranscriber), "en".to_string(), Duration::from_secs(5)),
        4,
        1,
    );

    let set = pipeline
        .aggregate(source, Arc::new(AudioTrack::silent(16_000)), &scenes)
        .await
        .unwrap();

    assert_eq!(set.features.len(), 2);
    assert_eq!(set.features[1].motion_activity, 0.0);
    assert_eq!(set.failures.len(), 1);
    assert_eq!(set.failures[0].scene_index, 1);
    assert_eq!(set.failures[0].stage, FeatureStage::Motion);
}

#[tokio::test]
async fn test_crashed_motion_worker_is_recorded() {
    let scenes = vec![
        Scene::new(0.0, 5.0).unwrap(),
        Scene::new(5.0, 10.0).unwrap(),
    ];
    let source: Arc<dyn VideoSource> = Arc::new(CrashingSource {
        info: VideoInfo {
            fps: 1.0,
            duration: 10.0,
            width: 48,
            height: 32,
        },
    });
    let pipeline = FeaturePipeline::new(
        MotionActivityAggregator::new(&MotionParams::default()),
        AudioFeatureAggregator::new(Arc::new(SilentTranscriber), "en".to_string(), Duration::from_secs(5)),
        2,
        1,
    );

    let set = pipeline
        .aggregate(source, Arc::new(stepped_audio(10, 1000)), &scenes)
        .await
        .unwrap();

    assert_eq!(set.features.len(), 2);
    assert!(set.features.iter().all(|f| f.motion_activity == 0.0));
    let stages: Vec<(usize, FeatureStage)> =
        set.failures.iter().map(|f| (f.scene_index, f.stage)).collect();
    assert_eq!(stages, vec![(0, FeatureStage::Motion), (1, FeatureStage::Motion)]);
    assert!(set.failures[0].message.contains("motion"));
    // Audio still completes for every scene
    assert!(set.features[1].audio_energy > set.features[0].audio_energy);
}

#[tokio::test]
async fn test_scenes_interactor_lists_and_exports() {
    let (container, _) = container(
        MemoryMediaAdapter::new(static_video(15)),
        Arc::new(SilentTranscriber),
        config(),
    );

    let report = container
        .scenes_interactor()
        .execute(ScenesRequest {
            input: PathBuf::from("talk.mp4"),
            export_dir: Some(PathBuf::from("out")),
        })
        .await
        .unwrap();

    assert_eq!(report.scenes, vec![Scene::new(0.0, 15.0).unwrap()]);
    assert_eq!(report.exported, vec![PathBuf::from("out").join("scene_1.mp4")]);
    assert_eq!(report.source_duration, 15.0);
}
