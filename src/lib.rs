//! Distill Video Highlight Condenser Library
//!
//! Splits a video into scenes, scores each scene by audio energy, motion
//! activity and detected speech, and selects the best scenes within a
//! duration budget.
//!
//! # Pipeline
//!
//! - Scene boundary detection from color-histogram divergence and optical flow
//! - Per-scene motion and audio feature aggregation on a bounded worker pool
//! - Weighted scoring and budgeted greedy selection
//! - Optional stream-copy rendering of the highlight reel

pub mod adapters;
pub mod analysis;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use config::DistillConfig;
pub use domain::errors::DomainError;
pub use domain::model::{HighlightPlan, Scene, SceneFeatures, ScoredScene};
pub use error::{DistillError, DistillResult};

/// Initialize Distill library
pub fn init() -> DistillResult<()> {
    ffmpeg_next::init().map_err(|e| DistillError::FFmpegInitError {
        message: e.to_string(),
    })?;

    Ok(())
}
