// Summarize interactor - Orchestrates the highlight reel use case

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::audio::AudioTrack;
use crate::analysis::audio_features::AudioFeatureAggregator;
use crate::analysis::motion::MotionActivityAggregator;
use crate::app::pipeline::{detect_scenes, FeaturePipeline};
use crate::config::DistillConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::output::TextReport;
use crate::ports::*;
use crate::utils::Utils;

/// Input of a summarize run
#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    pub input: PathBuf,
    /// Render the plan to this file when set
    pub render_output: Option<PathBuf>,
}

impl SummarizeRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            render_output: None,
        }
    }

    pub fn with_render_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.render_output = Some(output.into());
        self
    }
}

/// Rendering details included in the summary
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub output_file: PathBuf,
    pub segments_written: usize,
    pub duration: f64,
    pub file_size: u64,
    pub processing_secs: f64,
}

impl From<RenderReport> for RenderSummary {
    fn from(report: RenderReport) -> Self {
        Self {
            output_file: report.output_file,
            segments_written: report.segments_written,
            duration: report.duration,
            file_size: report.file_size,
            processing_secs: report.processing_time.as_secs_f64(),
        }
    }
}

/// Result of a summarize run
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub source: PathBuf,
    pub source_duration: f64,
    pub scenes_detected: usize,
    pub scored_scenes: Vec<ScoredScene>,
    pub plan: HighlightPlan,
    pub summary_duration: f64,
    pub failures: Vec<FeatureFailure>,
    pub rendered: Option<RenderSummary>,
    pub processing_secs: f64,
    pub generated_at: DateTime<Utc>,
}

impl TextReport for SummaryReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Source:   {}", self.source.display());
        let _ = writeln!(
            out,
            "Duration: {}",
            TimeSpec::from_seconds(self.source_duration)
        );
        let _ = writeln!(out, "Scenes:   {} detected", self.scenes_detected);
        let _ = writeln!(
            out,
            "Summary:  {} scenes, {} ({:.1}% of source)",
            self.plan.len(),
            TimeSpec::from_seconds(self.summary_duration),
            Utils::percentage(self.summary_duration, self.source_duration)
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Highlight plan:");
        for (n, scene) in self.plan.scenes().iter().enumerate() {
            let score = self
                .scored_scenes
                .iter()
                .find(|s| s.scene() == scene)
                .map(|s| s.score)
                .unwrap_or_default();
            let _ = writeln!(out, "  {:>3}. {}  score {:.2}", n + 1, scene, score);
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Recovered failures:");
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "  scene {} ({:?}): {}",
                    failure.scene_index + 1,
                    failure.stage,
                    failure.message
                );
            }
        }

        if let Some(rendered) = &self.rendered {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Rendered: {} ({} segments, {}, {})",
                rendered.output_file.display(),
                rendered.segments_written,
                TimeSpec::from_seconds(rendered.duration),
                Utils::format_file_size(rendered.file_size)
            );
        }

        let _ = write!(
            out,
            "Processed in {}",
            Utils::format_duration(Duration::from_secs_f64(self.processing_secs))
        );
        out
    }
}

/// Interactor for the highlight reel use case
pub struct SummarizeInteractor {
    media_port: Arc<dyn MediaPort>,
    transcription_port: Arc<dyn TranscriptionPort>,
    render_port: Arc<dyn RenderPort>,
    config: DistillConfig,
}

impl SummarizeInteractor {
    /// Create new summarize interactor with injected ports
    pub fn new(
        media_port: Arc<dyn MediaPort>,
        transcription_port: Arc<dyn TranscriptionPort>,
        render_port: Arc<dyn RenderPort>,
        config: DistillConfig,
    ) -> Self {
        Self {
            media_port,
            transcription_port,
            render_port,
            config,
        }
    }

    pub fn config(&self) -> &DistillConfig {
        &self.config
    }

    /// Detect, score and select scenes, then optionally render the plan
    pub async fn execute(&self, request: SummarizeRequest) -> Result<SummaryReport, DomainError> {
        let started = Instant::now();
        info!(input = %request.input.display(), "Starting highlight summary");

        let source = self.media_port.open_video(&request.input)?;
        let video = source.info().clone();
        info!(
            duration = video.duration,
            fps = video.fps,
            width = video.width,
            height = video.height,
            "Video opened"
        );

        let scenes = detect_scenes(Arc::clone(&source), self.config.detection.clone()).await?;

        let track = match self.media_port.open_audio(&request.input)? {
            Some(track) => track,
            None => {
                warn!("Source has no audio stream, scoring without audio");
                AudioTrack::silent(self.config.audio.sample_rate)
            }
        };

        let features = self
            .feature_pipeline()
            .aggregate(Arc::clone(&source), Arc::new(track), &scenes)
            .await?;

        let scorer = SceneScorer::new(self.config.scoring);
        let scored = scorer.score_all(&features.features);
        if scored.is_empty() {
            return Err(DomainError::EmptySelection);
        }

        let source_duration = if video.duration > 0.0 {
            video.duration
        } else {
            scenes.last().map(Scene::end).unwrap_or_default()
        };

        let selector = HighlightSelector::new(self.config.selection.clone());
        let plan = selector.select(&scored, source_duration);
        if plan.is_empty() {
            return Err(DomainError::BadArgs(format!(
                "no scene fits the {:.1}s budget and min_scenes is 0",
                selector.budget(source_duration)
            )));
        }
        info!(
            selected = plan.len(),
            of = scored.len(),
            duration = plan.total_duration(),
            budget = selector.budget(source_duration),
            "Highlight plan ready"
        );

        let rendered = match &request.render_output {
            Some(output) => {
                let report = self
                    .render_port
                    .render_plan(&request.input, &plan, output)
                    .await?;
                Some(RenderSummary::from(report))
            }
            None => None,
        };

        Ok(SummaryReport {
            source: request.input,
            source_duration,
            scenes_detected: scenes.len(),
            summary_duration: plan.total_duration(),
            scored_scenes: scored,
            plan,
            failures: features.failures,
            rendered,
            processing_secs: started.elapsed().as_secs_f64(),
            generated_at: Utc::now(),
        })
    }

    fn feature_pipeline(&self) -> FeaturePipeline {
        let transcription = &self.config.transcription;
        FeaturePipeline::new(
            MotionActivityAggregator::new(&self.config.motion),
            AudioFeatureAggregator::new(
                Arc::clone(&self.transcription_port),
                transcription.language.clone(),
                Duration::from_secs(transcription.timeout_secs),
            ),
            self.config.pipeline.workers,
            transcription.max_concurrent,
        )
    }
}
