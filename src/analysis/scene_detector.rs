//! Frame-stream scene detection
//!
//! Drives a [`FrameCursor`] through the change-signal extractor and feeds the
//! resulting signals to the domain [`BoundaryTracker`].

use tracing::{debug, warn};

use crate::analysis::change_signal::ChangeSignalExtractor;
use crate::domain::errors::DomainError;
use crate::domain::model::{DetectionParams, Scene, VideoInfo};
use crate::domain::rules::{combined_change, BoundaryTracker};
use crate::ports::FrameCursor;

/// How a detection pass ended
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStatus {
    /// The whole stream was read
    Complete,
    /// The stream yielded no frames
    Empty,
    /// Reading stopped on a decode error
    Unreadable(String),
}

/// Result of a detection pass
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryReport {
    pub scenes: Vec<Scene>,
    pub status: DetectionStatus,
    pub frames_sampled: usize,
}

impl BoundaryReport {
    /// Convert the pass into the scene list, mapping failures to domain errors
    pub fn into_result(self) -> Result<Vec<Scene>, DomainError> {
        match self.status {
            DetectionStatus::Unreadable(reason) => Err(DomainError::SourceUnreadable(reason)),
            DetectionStatus::Empty => Err(DomainError::NoScenesDetected),
            DetectionStatus::Complete if self.scenes.is_empty() => Err(DomainError::NoScenesDetected),
            DetectionStatus::Complete => Ok(self.scenes),
        }
    }
}

/// Segments a frame stream into scenes
pub struct SceneBoundaryDetector {
    params: DetectionParams,
}

impl SceneBoundaryDetector {
    pub fn new(params: DetectionParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Run one detection pass over `cursor`.
    ///
    /// The first frame is the reference; after that `frame_skip` frames are
    /// skipped before each sample.
    pub fn detect(&self, cursor: &mut dyn FrameCursor, info: &VideoInfo) -> BoundaryReport {
        let mut extractor = ChangeSignalExtractor::new();
        let mut tracker = BoundaryTracker::new(&self.params);
        let mut last_timestamp: Option<f64> = None;
        let mut frames_sampled = 0usize;

        loop {
            if frames_sampled > 0 {
                if let Err(err) = cursor.skip_frames(self.params.frame_skip) {
                    return Self::unreadable(tracker, frames_sampled, err);
                }
            }

            let frame = match cursor.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => return Self::unreadable(tracker, frames_sampled, err),
            };

            frames_sampled += 1;
            let now = frame.timestamp();
            last_timestamp = Some(now);

            if let Some(signal) = extractor.observe(&frame) {
                if let Some(scene) = tracker.observe(&signal, now) {
                    debug!(
                        start = scene.start(),
                        end = scene.end(),
                        combined = combined_change(&signal),
                        "Scene boundary detected"
                    );
                }
            }
        }

        let Some(last_timestamp) = last_timestamp else {
            return BoundaryReport {
                scenes: Vec::new(),
                status: DetectionStatus::Empty,
                frames_sampled,
            };
        };

        let end = if info.duration > 0.0 && info.duration.is_finite() {
            info.duration
        } else {
            last_timestamp + info.frame_duration()
        };

        BoundaryReport {
            scenes: tracker.finish(end),
            status: DetectionStatus::Complete,
            frames_sampled,
        }
    }

    fn unreadable(tracker: BoundaryTracker, frames_sampled: usize, err: DomainError) -> BoundaryReport {
        warn!(frames_sampled, error = %err, "Frame source failed during detection");
        BoundaryReport {
            scenes: tracker.into_scenes(),
            status: DetectionStatus::Unreadable(err.to_string()),
            frames_sampled,
        }
    }
}
