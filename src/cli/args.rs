//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::output::ReportFormat;

fn unit_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{} is not within 0-1", value));
    }
    Ok(value)
}

fn at_least_one(s: &str) -> Result<usize, String> {
    number_range(s, 1, usize::MAX)
}

/// Detection overrides shared by both commands
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    /// Combined change threshold for a scene cut (0-1)
    #[arg(long, value_parser = unit_fraction)]
    pub diff_threshold: Option<f64>,

    /// Frames skipped between analyzed samples
    #[arg(long, value_parser = at_least_one)]
    pub frame_skip: Option<usize>,

    /// Minimum scene length in seconds
    #[arg(long)]
    pub min_scene_duration: Option<f64>,

    /// Minimum mean optical-flow magnitude for a cut
    #[arg(long)]
    pub motion_threshold: Option<f64>,
}

/// Arguments for the summarize command
#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Render the highlight reel to this video file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the summary report here instead of stdout
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Target share of the source duration (0-1)
    #[arg(long, value_parser = unit_fraction)]
    pub fraction: Option<f64>,

    /// Minimum number of scenes in the plan
    #[arg(long, value_parser = at_least_one)]
    pub min_scenes: Option<usize>,

    /// Language hint for transcription
    #[arg(long)]
    pub language: Option<String>,

    /// Skip speech detection
    #[arg(long)]
    pub no_speech: bool,

    /// Parallel motion workers
    #[arg(long, value_parser = at_least_one)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

/// Arguments for the scenes command
#[derive(Args, Debug, Clone)]
pub struct ScenesArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Use the fine-grained detection preset
    #[arg(long)]
    pub fine: bool,

    /// Write each scene to its own file in this directory
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Write the scene list here instead of stdout
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[command(flatten)]
    pub detection: DetectionArgs,
}
