//! Configuration initialization and hierarchy management

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::args::DetectionArgs;
use crate::cli::{Cli, Commands};
use crate::config::DistillConfig;
use crate::domain::model::{DetectionParams, TimeSpec};
use crate::output::OverwritePolicy;
use crate::ports::ConfigPort;
use crate::utils::logging::{LogFormat, LogLevel};

/// Resolved configuration with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DistillConfig,
    pub source: Option<PathBuf>,
    pub env_overrides: usize,
    pub cli_overrides: usize,
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli, config_port: &dyn ConfigPort) -> Result<LoadedConfig> {
    // Step 1: defaults, replaced wholesale by a file when one is found
    let source = config_port.locate(cli.config.as_deref())?;
    let mut config = match &source {
        Some(path) => config_port
            .load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => DistillConfig::default(),
    };

    // Step 2: environment variables
    let env_overrides = apply_environment(&mut config, |key| std::env::var(key).ok())?;

    // Step 3: CLI arguments
    let cli_overrides = apply_cli_overrides(&mut config, cli);

    config.validate().context("Invalid configuration")?;
    debug!(env_overrides, cli_overrides, "Configuration hierarchy initialized");

    Ok(LoadedConfig {
        config,
        source,
        env_overrides,
        cli_overrides,
    })
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, value, e))
}

/// Apply `DISTILL_*` and `OPENAI_API_KEY` overrides read through `lookup`.
/// Returns the number of variables applied.
pub fn apply_environment<F>(config: &mut DistillConfig, lookup: F) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    let mut var = |key: &str| {
        let value = lookup(key).filter(|v| !v.trim().is_empty());
        if value.is_some() {
            applied += 1;
        }
        value
    };

    if let Some(v) = var("DISTILL_LOG_LEVEL") {
        config.logging.level = parse_env::<LogLevel>("DISTILL_LOG_LEVEL", &v)?;
    }
    if let Some(v) = var("DISTILL_LOG_FORMAT") {
        config.logging.format = parse_env::<LogFormat>("DISTILL_LOG_FORMAT", &v)?;
    }
    if let Some(v) = var("DISTILL_DIFF_THRESHOLD") {
        config.detection.diff_threshold = parse_env("DISTILL_DIFF_THRESHOLD", &v)?;
    }
    if let Some(v) = var("DISTILL_FRAME_SKIP") {
        config.detection.frame_skip = parse_env("DISTILL_FRAME_SKIP", &v)?;
    }
    if let Some(v) = var("DISTILL_MIN_SCENE_DURATION") {
        config.detection.min_scene_duration = TimeSpec::parse(&v)
            .with_context(|| format!("Invalid value for DISTILL_MIN_SCENE_DURATION: '{}'", v))?
            .seconds;
    }
    if let Some(v) = var("DISTILL_MOTION_THRESHOLD") {
        config.detection.motion_threshold = parse_env("DISTILL_MOTION_THRESHOLD", &v)?;
    }
    if let Some(v) = var("DISTILL_SUMMARY_FRACTION") {
        config.selection.summary_fraction = parse_env("DISTILL_SUMMARY_FRACTION", &v)?;
    }
    if let Some(v) = var("DISTILL_MIN_SCENES") {
        config.selection.min_scenes = parse_env("DISTILL_MIN_SCENES", &v)?;
    }
    if let Some(v) = var("DISTILL_WORKERS") {
        config.pipeline.workers = parse_env("DISTILL_WORKERS", &v)?;
    }
    if let Some(v) = var("DISTILL_OVERWRITE") {
        config.pipeline.overwrite = parse_env::<OverwritePolicy>("DISTILL_OVERWRITE", &v)?;
    }
    if let Some(v) = var("DISTILL_TRANSCRIPTION_ENDPOINT") {
        config.transcription.endpoint = v.trim().to_string();
    }
    if let Some(v) = var("DISTILL_TRANSCRIPTION_MODEL") {
        config.transcription.model = v.trim().to_string();
    }
    if let Some(v) = var("DISTILL_TRANSCRIPTION_TIMEOUT") {
        config.transcription.timeout_secs = parse_env("DISTILL_TRANSCRIPTION_TIMEOUT", &v)?;
    }
    if let Some(v) = var("DISTILL_LANGUAGE") {
        config.transcription.language = v.trim().to_string();
    }
    if let Some(v) = var("OPENAI_API_KEY") {
        config.transcription.api_key = Some(v.trim().to_string());
    }

    Ok(applied)
}

fn apply_detection_args(detection: &mut DetectionParams, args: &DetectionArgs) -> usize {
    let mut applied = 0;
    if let Some(v) = args.diff_threshold {
        detection.diff_threshold = v;
        applied += 1;
    }
    if let Some(v) = args.frame_skip {
        detection.frame_skip = v;
        applied += 1;
    }
    if let Some(v) = args.min_scene_duration {
        detection.min_scene_duration = v;
        applied += 1;
    }
    if let Some(v) = args.motion_threshold {
        detection.motion_threshold = v;
        applied += 1;
    }
    applied
}

/// Apply CLI argument overrides, returning how many were applied
pub fn apply_cli_overrides(config: &mut DistillConfig, cli: &Cli) -> usize {
    let mut applied = 0;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
        applied += 1;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
        applied += 1;
    }
    if cli.overwrite {
        config.pipeline.overwrite = OverwritePolicy::Always;
        applied += 1;
    }

    match &cli.command {
        Commands::Summarize(args) => {
            if let Some(fraction) = args.fraction {
                config.selection.summary_fraction = fraction;
                applied += 1;
            }
            if let Some(min_scenes) = args.min_scenes {
                config.selection.min_scenes = min_scenes;
                applied += 1;
            }
            if let Some(language) = &args.language {
                config.transcription.language = language.clone();
                applied += 1;
            }
            if args.no_speech {
                config.transcription.enabled = false;
                applied += 1;
            }
            if let Some(workers) = args.workers {
                config.pipeline.workers = workers;
                applied += 1;
            }
            applied += apply_detection_args(&mut config.detection, &args.detection);
        }
        Commands::Scenes(args) => {
            if args.fine {
                config.detection = DetectionParams {
                    analysis_width: config.detection.analysis_width,
                    ..DetectionParams::fine()
                };
                applied += 1;
            }
            applied += apply_detection_args(&mut config.detection, &args.detection);
        }
    }

    applied
}
