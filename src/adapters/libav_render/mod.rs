//! Stream-copy rendering adapter using libav bindings
//!
//! Segments are remuxed without re-encoding. Each segment starts at the
//! keyframe at or before its start, so cuts are keyframe-accurate.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use ffmpeg_next::{codec, encoder, format, media, Rational};
use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::output::OverwritePolicy;
use crate::ports::*;

/// Renders plans and scenes by copying packets into new containers
pub struct LibavRenderAdapter {
    overwrite: OverwritePolicy,
}

impl LibavRenderAdapter {
    pub fn new(overwrite: OverwritePolicy) -> Result<Self, DomainError> {
        ffmpeg_next::init()
            .map_err(|e| DomainError::InternalError(format!("FFmpeg initialization failed: {}", e)))?;
        Ok(Self { overwrite })
    }

    fn check_target(&self, output: &Path) -> Result<(), DomainError> {
        if output.exists() {
            match self.overwrite {
                OverwritePolicy::Never => {
                    return Err(DomainError::FsFail(format!(
                        "{} exists and overwrite is disabled",
                        output.display()
                    )))
                }
                OverwritePolicy::Always => {
                    info!(path = %output.display(), "File exists, will overwrite");
                }
            }
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::FsFail(format!("Failed to create output directory: {}", e))
                })?;
            }
        }
        Ok(())
    }
}

/// Input stream copied into the output
struct StreamMap {
    input_index: usize,
    output_index: usize,
    input_time_base: Rational,
    output_time_base: Rational,
}

/// Per output stream write position
#[derive(Clone, Copy, Default)]
struct StreamCursor {
    last_dts: Option<i64>,
    /// End of the last written packet, output time base
    end: i64,
    done: bool,
}

fn fail(what: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::RenderFail(format!("{}: {}", what, err))
}

fn seconds(ts: i64, time_base: Rational) -> f64 {
    ts as f64 * f64::from(time_base)
}

fn to_time_base(secs: f64, time_base: Rational) -> i64 {
    let tb = f64::from(time_base);
    if tb > 0.0 {
        (secs / tb).round() as i64
    } else {
        0
    }
}

/// Copy `segments` of `input` back to back into `output`.
/// Returns the number of segments that contributed packets.
fn remux_segments(input: &Path, segments: &[(f64, f64)], output: &Path) -> Result<usize, DomainError> {
    let mut ictx = format::input(&input).map_err(|e| {
        DomainError::SourceUnreadable(format!("{}: failed to open input ({})", input.display(), e))
    })?;
    let mut octx = format::output(&output).map_err(|e| fail("Failed to create output", e))?;

    let mut maps: Vec<StreamMap> = Vec::new();
    for ist in ictx.streams() {
        let kind = ist.parameters().medium();
        if kind != media::Type::Video && kind != media::Type::Audio {
            continue;
        }
        let mut ost = octx
            .add_stream(encoder::find(codec::Id::None))
            .map_err(|e| fail("Failed to add stream", e))?;
        ost.set_parameters(ist.parameters());
        // Let the muxer pick a tag valid for the output container
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        maps.push(StreamMap {
            input_index: ist.index(),
            output_index: ost.index(),
            input_time_base: ist.time_base(),
            output_time_base: Rational::new(0, 1),
        });
    }
    if maps.is_empty() {
        return Err(DomainError::SourceUnreadable(format!(
            "{}: no audio or video streams",
            input.display()
        )));
    }

    octx.set_metadata(ictx.metadata().to_owned());
    octx.write_header().map_err(|e| fail("Failed to write header", e))?;

    for map in maps.iter_mut() {
        map.output_time_base = octx
            .stream(map.output_index)
            .map(|s| s.time_base())
            .ok_or_else(|| fail("Output stream missing", map.output_index))?;
    }

    let mut cursors = vec![StreamCursor::default(); maps.len()];
    let mut timeline = 0.0f64;
    let mut written_segments = 0;

    for &(start, end) in segments {
        let target = (start * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        ictx.seek(target, ..target)
            .map_err(|e| fail(&format!("Failed to seek to {:.3}s", start), e))?;

        for cursor in cursors.iter_mut() {
            cursor.done = false;
        }
        let mut origin: Option<f64> = None;
        let mut segment_end = timeline;
        let mut wrote_any = false;

        for (stream, mut packet) in ictx.packets() {
            let Some(slot) = maps.iter().position(|m| m.input_index == stream.index()) else {
                continue;
            };
            if cursors[slot].done {
                if cursors.iter().all(|c| c.done) {
                    break;
                }
                continue;
            }
            let map = &maps[slot];

            let Some(raw) = packet.dts().or(packet.pts()) else {
                continue;
            };
            let at = seconds(raw, map.input_time_base);
            if at >= end {
                cursors[slot].done = true;
                if cursors.iter().all(|c| c.done) {
                    break;
                }
                continue;
            }

            let origin = *origin.get_or_insert(at);
            let offset = to_time_base(timeline - origin, map.output_time_base);

            packet.rescale_ts(map.input_time_base, map.output_time_base);
            let cursor = &mut cursors[slot];
            let mut dts = packet.dts().or(packet.pts()).unwrap_or(0) + offset;
            if let Some(last) = cursor.last_dts {
                if dts <= last {
                    dts = last + 1;
                }
            }
            let pts = packet.pts().map(|p| (p + offset).max(dts)).unwrap_or(dts);
            packet.set_dts(Some(dts));
            packet.set_pts(Some(pts));
            packet.set_stream(map.output_index);
            packet.set_position(-1);

            cursor.last_dts = Some(dts);
            cursor.end = cursor.end.max(pts + packet.duration().max(0));
            segment_end = segment_end.max(seconds(cursor.end, map.output_time_base));

            packet
                .write_interleaved(&mut octx)
                .map_err(|e| fail("Failed to write packet", e))?;
            wrote_any = true;
        }

        if wrote_any {
            written_segments += 1;
            debug!(start, end, timeline, segment_end, "Segment copied");
        } else {
            warn!(start, end, "Segment produced no packets");
        }
        timeline = segment_end;
    }

    octx.write_trailer().map_err(|e| fail("Failed to write trailer", e))?;
    Ok(written_segments)
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// `scene_<n>.<ext>` with 1-based numbering
fn scene_file_name(input: &Path, number: usize) -> String {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("mp4");
    format!("scene_{}.{}", number, ext)
}

async fn run_blocking<T, F>(work: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DomainError::InternalError(format!("Render task failed: {}", e)))?
}

#[async_trait]
impl RenderPort for LibavRenderAdapter {
    async fn render_plan(
        &self,
        input: &Path,
        plan: &HighlightPlan,
        output: &Path,
    ) -> Result<RenderReport, DomainError> {
        let started = Instant::now();
        self.check_target(output)?;

        let segments = plan.segments();
        info!(
            output = %output.display(),
            segments = segments.len(),
            duration = plan.total_duration(),
            "Rendering highlight plan"
        );

        let input_path = input.to_path_buf();
        let output_path = output.to_path_buf();
        let segments_written =
            run_blocking(move || remux_segments(&input_path, &segments, &output_path)).await?;

        let report = RenderReport {
            output_file: output.to_path_buf(),
            segments_written,
            duration: plan.total_duration(),
            file_size: file_size(output),
            processing_time: started.elapsed(),
        };
        info!(
            output = %report.output_file.display(),
            segments = report.segments_written,
            bytes = report.file_size,
            elapsed_ms = report.processing_time.as_millis() as u64,
            "Highlight reel written"
        );
        Ok(report)
    }

    async fn export_scenes(
        &self,
        input: &Path,
        scenes: &[Scene],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, DomainError> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to create {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let mut files = Vec::with_capacity(scenes.len());
        for (n, scene) in scenes.iter().enumerate() {
            let target = output_dir.join(scene_file_name(input, n + 1));
            self.check_target(&target)?;

            let input_path = input.to_path_buf();
            let output_path = target.clone();
            let segment = [(scene.start(), scene.end())];
            run_blocking(move || remux_segments(&input_path, &segment, &output_path)).await?;

            debug!(scene = n + 1, path = %target.display(), "Scene exported");
            files.push(target);
        }
        Ok(files)
    }
}
