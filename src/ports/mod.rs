// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::audio::{AudioClip, AudioTrack};
use crate::analysis::frame::VideoFrame;
use crate::config::DistillConfig;
use crate::domain::errors::*;
use crate::domain::model::*;

/// Private, sequential read position over a video source.
///
/// Each cursor owns its decoder state, so cursors are never shared between
/// workers.
pub trait FrameCursor {
    /// Decode the next frame in presentation order, `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, DomainError>;

    /// Advance past `count` frames without converting them.
    /// Returns how many frames were actually skipped.
    fn skip_frames(&mut self, count: usize) -> Result<usize, DomainError>;

    /// Reposition so the next frame returned is the first one at or after `seconds`
    fn seek(&mut self, seconds: f64) -> Result<(), DomainError>;
}

/// Seekable video source acquired once per run
pub trait VideoSource: Send + Sync {
    /// Stream properties
    fn info(&self) -> &VideoInfo;

    /// Open an independent cursor positioned at the start of the stream
    fn cursor(&self) -> Result<Box<dyn FrameCursor>, DomainError>;
}

/// Port for opening media sources
pub trait MediaPort: Send + Sync {
    /// Open the primary video stream of a media file
    fn open_video(&self, path: &Path) -> Result<Arc<dyn VideoSource>, DomainError>;

    /// Decode the primary audio stream, `None` when the file has no audio
    fn open_audio(&self, path: &Path) -> Result<Option<AudioTrack>, DomainError>;
}

/// Port for the speech transcription service
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribe an audio slice, returning plain text
    async fn transcribe(&self, clip: &AudioClip<'_>, language: &str) -> Result<String, DomainError>;
}

/// Rendering summary
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output_file: PathBuf,
    pub segments_written: usize,
    pub duration: f64,
    pub file_size: u64,
    pub processing_time: Duration,
}

/// Port for assembling output clips from the source
#[async_trait]
pub trait RenderPort: Send + Sync {
    /// Concatenate the plan's segments into one output file
    async fn render_plan(
        &self,
        input: &Path,
        plan: &HighlightPlan,
        output: &Path,
    ) -> Result<RenderReport, DomainError>;

    /// Write every scene to its own file inside `output_dir`
    async fn export_scenes(
        &self,
        input: &Path,
        scenes: &[Scene],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, DomainError>;
}

/// Port for persisted configuration
pub trait ConfigPort: Send + Sync {
    /// Resolve the file to load: `explicit` when given, else the first default
    /// location that exists
    fn locate(&self, explicit: Option<&Path>) -> Result<Option<PathBuf>, DomainError>;

    /// Load and parse a configuration file
    fn load(&self, path: &Path) -> Result<DistillConfig, DomainError>;
}
