//! Report writer implementation

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{DistillError, DistillResult};
use crate::output::{OutputConfig, OverwritePolicy, ReportFormat, TextReport};

/// Serializes reports and writes them to stdout or a file
#[derive(Debug, Default)]
pub struct ReportWriter;

impl ReportWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render a report in the requested format
    pub fn render<R>(&self, report: &R, format: ReportFormat) -> DistillResult<String>
    where
        R: Serialize + TextReport,
    {
        let body = match format {
            ReportFormat::Json => serde_json::to_string_pretty(report)?,
            ReportFormat::Yaml => serde_yaml::to_string(report)?,
            ReportFormat::Text => report.render_text(),
        };
        Ok(body)
    }

    /// Write a report according to `config`
    pub fn write_report<R>(&self, report: &R, config: &OutputConfig) -> DistillResult<()>
    where
        R: Serialize + TextReport,
    {
        let mut body = self.render(report, config.format)?;
        if !body.ends_with('\n') {
            body.push('\n');
        }

        match &config.path {
            None => {
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                handle.write_all(body.as_bytes())?;
                handle.flush()?;
                Ok(())
            }
            Some(path) => {
                check_overwrite_policy(path, config.overwrite)?;
                ensure_output_directory(path)?;
                self.write_atomic(path, body.as_bytes())?;
                info!(path = %path.display(), format = %config.format, "Report written");
                Ok(())
            }
        }
    }

    /// Write to a sibling temporary file, then rename over the target
    fn write_atomic(&self, path: &Path, data: &[u8]) -> DistillResult<()> {
        let temp_path = temp_path_for(path)?;
        debug!(temp = %temp_path.display(), "Writing to temporary file");

        write_to_file(&temp_path, data)?;
        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            DistillError::OutputError {
                message: format!("Failed to rename temporary file: {}", e),
            }
        })?;
        Ok(())
    }
}

/// Refuse to replace an existing file unless the policy allows it
pub fn check_overwrite_policy(path: &Path, policy: OverwritePolicy) -> DistillResult<()> {
    if path.exists() {
        match policy {
            OverwritePolicy::Never => {
                return Err(DistillError::OutputError {
                    message: format!(
                        "{} exists and overwrite is disabled (use --overwrite)",
                        path.display()
                    ),
                });
            }
            OverwritePolicy::Always => {
                info!(path = %path.display(), "File exists, will overwrite");
            }
        }
    }
    Ok(())
}

/// Create the parent directory of `path` if needed
pub fn ensure_output_directory(path: &Path) -> DistillResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DistillError::OutputError {
                message: format!("Failed to create output directory: {}", e),
            })?;
        }
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> DistillResult<PathBuf> {
    let filename = path.file_name().ok_or_else(|| DistillError::OutputError {
        message: "Invalid output file path".to_string(),
    })?;
    Ok(path.with_file_name(format!(".tmp_{}", filename.to_string_lossy())))
}

fn write_to_file(path: &Path, data: &[u8]) -> DistillResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| DistillError::OutputError {
            message: format!("Failed to open {} for writing: {}", path.display(), e),
        })?;

    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(data)?;
        writer.flush()?;
    }
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Sample {
        scenes: usize,
    }

    impl TextReport for Sample {
        fn render_text(&self) -> String {
            format!("{} scenes", self.scenes)
        }
    }

    fn config(path: PathBuf, format: ReportFormat, overwrite: OverwritePolicy) -> OutputConfig {
        OutputConfig {
            path: Some(path),
            format,
            overwrite,
        }
    }

    #[test]
    fn test_render_formats() {
        let writer = ReportWriter::new();
        let sample = Sample { scenes: 3 };
        assert_eq!(writer.render(&sample, ReportFormat::Text).unwrap(), "3 scenes");
        assert!(writer
            .render(&sample, ReportFormat::Json)
            .unwrap()
            .contains("\"scenes\": 3"));
        assert!(writer
            .render(&sample, ReportFormat::Yaml)
            .unwrap()
            .contains("scenes: 3"));
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("plan.json");
        let writer = ReportWriter::new();

        writer
            .write_report(
                &Sample { scenes: 2 },
                &config(path.clone(), ReportFormat::Json, OverwritePolicy::Never),
            )
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"scenes\": 2"));
        assert!(!path.with_file_name(".tmp_plan.json").exists());
    }

    #[test]
    fn test_overwrite_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.txt");
        std::fs::write(&path, "old").unwrap();
        let writer = ReportWriter::new();

        let refused = writer.write_report(
            &Sample { scenes: 1 },
            &config(path.clone(), ReportFormat::Text, OverwritePolicy::Never),
        );
        assert!(matches!(refused, Err(DistillError::OutputError { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");

        writer
            .write_report(
                &Sample { scenes: 1 },
                &config(path.clone(), ReportFormat::Text, OverwritePolicy::Always),
            )
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1 scenes\n");
    }

    #[test]
    fn test_overwrite_policy_parse() {
        assert_eq!("Always".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Always);
        assert_eq!("no".parse::<OverwritePolicy>().unwrap(), OverwritePolicy::Never);
        assert!("maybe".parse::<OverwritePolicy>().is_err());
    }
}
