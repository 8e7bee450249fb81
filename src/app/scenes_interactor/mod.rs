// Scenes interactor - Scene listing and per-scene export

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::app::pipeline::detect_scenes;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::output::TextReport;
use crate::ports::*;

#[derive(Debug, Clone)]
pub struct ScenesRequest {
    pub input: PathBuf,
    /// Write every scene to its own file in this directory
    pub export_dir: Option<PathBuf>,
}

/// Result of a scene listing run
#[derive(Debug, Clone, Serialize)]
pub struct ScenesReport {
    pub source: PathBuf,
    pub source_duration: f64,
    pub detection: DetectionParams,
    pub scenes: Vec<Scene>,
    pub exported: Vec<PathBuf>,
    pub generated_at: DateTime<Utc>,
}

impl TextReport for ScenesReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} scenes over {}",
            self.source.display(),
            self.scenes.len(),
            TimeSpec::from_seconds(self.source_duration)
        );
        for (n, scene) in self.scenes.iter().enumerate() {
            let _ = write!(out, "  {:>3}. {}  ({:.2}s)", n + 1, scene, scene.duration());
            if let Some(path) = self.exported.get(n) {
                let _ = write!(out, "  -> {}", path.display());
            }
            let _ = writeln!(out);
        }
        out
    }
}

/// Interactor for scene detection without scoring
pub struct ScenesInteractor {
    media_port: Arc<dyn MediaPort>,
    render_port: Arc<dyn RenderPort>,
    detection: DetectionParams,
}

impl ScenesInteractor {
    pub fn new(
        media_port: Arc<dyn MediaPort>,
        render_port: Arc<dyn RenderPort>,
        detection: DetectionParams,
    ) -> Self {
        Self {
            media_port,
            render_port,
            detection,
        }
    }

    pub async fn execute(&self, request: ScenesRequest) -> Result<ScenesReport, DomainError> {
        info!(input = %request.input.display(), "Listing scenes");

        let source = self.media_port.open_video(&request.input)?;
        let source_duration = source.info().duration;
        let scenes = detect_scenes(source, self.detection.clone()).await?;

        let exported = match &request.export_dir {
            Some(dir) => {
                let files = self
                    .render_port
                    .export_scenes(&request.input, &scenes, dir)
                    .await?;
                info!(count = files.len(), dir = %dir.display(), "Scenes exported");
                files
            }
            None => Vec::new(),
        };

        Ok(ScenesReport {
            source: request.input,
            source_duration,
            detection: self.detection.clone(),
            scenes,
            exported,
            generated_at: Utc::now(),
        })
    }
}
