//! Report output: formats, overwrite policy and the report writer

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod writer;

pub use writer::ReportWriter;

/// Overwrite policy for report and video outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Always overwrite
    Always,
    /// Never overwrite
    Never,
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" | "true" | "yes" => Ok(OverwritePolicy::Always),
            "never" | "false" | "no" => Ok(OverwritePolicy::Never),
            other => Err(format!("unknown overwrite policy '{}'", other)),
        }
    }
}

/// Serialization format of a run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        };
        f.write_str(name)
    }
}

/// Where and how a report is written
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Destination file, stdout when `None`
    pub path: Option<PathBuf>,
    pub format: ReportFormat,
    pub overwrite: OverwritePolicy,
}

impl OutputConfig {
    pub fn stdout(format: ReportFormat) -> Self {
        Self {
            path: None,
            format,
            overwrite: OverwritePolicy::Always,
        }
    }
}

/// Human-readable rendering of a report
pub trait TextReport {
    fn render_text(&self) -> String;
}
