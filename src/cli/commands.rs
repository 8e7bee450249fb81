//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::app::container::AppContainer;
use crate::app::scenes_interactor::ScenesRequest;
use crate::app::summarize_interactor::SummarizeRequest;
use crate::cli::args::{ScenesArgs, SummarizeArgs};
use crate::output::writer::check_overwrite_policy;
use crate::output::{OutputConfig, OverwritePolicy, ReportWriter};

fn require_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", path.display()));
    }
    Ok(())
}

/// Execute the summarize command
pub async fn summarize(
    container: &dyn AppContainer,
    args: SummarizeArgs,
    overwrite: OverwritePolicy,
) -> Result<()> {
    info!(input = %args.input.display(), "Starting summarize operation");
    require_input(&args.input)?;

    // Fail before the expensive analysis when outputs cannot be written
    if let Some(plan) = &args.plan {
        check_overwrite_policy(plan, overwrite)?;
    }
    if let Some(output) = &args.output {
        check_overwrite_policy(output, overwrite)?;
    }

    let mut request = SummarizeRequest::new(&args.input);
    if let Some(output) = &args.output {
        request = request.with_render_output(output);
    }

    let report = container
        .summarize_interactor()
        .execute(request)
        .await
        .with_context(|| format!("Failed to summarize {}", args.input.display()))?;

    let output = OutputConfig {
        path: args.plan,
        format: args.format,
        overwrite,
    };
    ReportWriter::new()
        .write_report(&report, &output)
        .context("Failed to write summary report")?;

    info!(
        scenes = report.plan.len(),
        duration = report.summary_duration,
        "Summarize operation completed successfully"
    );
    Ok(())
}

/// Execute the scenes command
pub async fn scenes(
    container: &dyn AppContainer,
    args: ScenesArgs,
    overwrite: OverwritePolicy,
) -> Result<()> {
    info!(input = %args.input.display(), "Starting scenes operation");
    require_input(&args.input)?;

    if let Some(report) = &args.report {
        check_overwrite_policy(report, overwrite)?;
    }

    let request = ScenesRequest {
        input: args.input.clone(),
        export_dir: args.export_dir,
    };
    let report = container
        .scenes_interactor()
        .execute(request)
        .await
        .with_context(|| format!("Failed to detect scenes in {}", args.input.display()))?;

    let output = OutputConfig {
        path: args.report,
        format: args.format,
        overwrite,
    };
    ReportWriter::new()
        .write_report(&report, &output)
        .context("Failed to write scene report")?;

    info!(
        scenes = report.scenes.len(),
        exported = report.exported.len(),
        "Scenes operation completed successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryMediaAdapter, MemoryVideoSource, SilentTranscriber};
    use crate::analysis::frame::VideoFrame;
    use crate::app::container::DefaultAppContainer;
    use crate::config::DistillConfig;
    use crate::output::ReportFormat;
    use crate::ports::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NoRender;

    #[async_trait::async_trait]
    impl RenderPort for NoRender {
        async fn render_plan(
            &self,
            _input: &Path,
            _plan: &crate::domain::model::HighlightPlan,
            _output: &Path,
        ) -> Result<RenderReport, crate::domain::errors::DomainError> {
            Err(crate::domain::errors::DomainError::RenderFail("disabled".into()))
        }

        async fn export_scenes(
            &self,
            _input: &Path,
            _scenes: &[crate::domain::model::Scene],
            _output_dir: &Path,
        ) -> Result<Vec<PathBuf>, crate::domain::errors::DomainError> {
            Ok(Vec::new())
        }
    }

    fn container() -> DefaultAppContainer {
        let frames = (0..12)
            .map(|i| VideoFrame::new(i as f64, image::RgbImage::new(32, 24)))
            .collect();
        let mut config = DistillConfig::default();
        config.detection.min_scene_duration = 1.0;
        DefaultAppContainer::with_ports(
            config,
            Arc::new(MemoryMediaAdapter::new(MemoryVideoSource::new(frames, 1.0))),
            Arc::new(SilentTranscriber),
            Arc::new(NoRender),
        )
    }

    #[tokio::test]
    async fn test_scenes_writes_report_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.mp4");
        std::fs::write(&input, b"").unwrap();
        let report = dir.path().join("scenes.json");

        let args = ScenesArgs {
            input,
            fine: false,
            export_dir: None,
            report: Some(report.clone()),
            format: ReportFormat::Json,
            detection: Default::default(),
        };
        scenes(&container(), args, OverwritePolicy::Never).await.unwrap();

        let body = std::fs::read_to_string(&report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["scenes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_plan_is_refused_before_analysis() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("input.mp4");
        std::fs::write(&input, b"").unwrap();
        let plan = dir.path().join("plan.json");
        std::fs::write(&plan, b"{}").unwrap();

        let args = SummarizeArgs {
            input,
            output: None,
            plan: Some(plan.clone()),
            format: ReportFormat::Json,
            fraction: None,
            min_scenes: None,
            language: None,
            no_speech: false,
            workers: None,
            detection: Default::default(),
        };
        let result = summarize(&container(), args, OverwritePolicy::Never).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&plan).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let args = ScenesArgs {
            input: PathBuf::from("/nonexistent/distill/input.mp4"),
            fine: false,
            export_dir: None,
            report: None,
            format: ReportFormat::Text,
            detection: Default::default(),
        };
        assert!(scenes(&container(), args, OverwritePolicy::Never).await.is_err());
    }
}
