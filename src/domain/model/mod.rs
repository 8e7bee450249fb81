// Domain models - Core types and data structures

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(DomainError::BadArgs(
                    "Time must be a finite, non-negative number".to_string(),
                ));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds_part) = match parts.as_slice() {
            [m, s] => (0, Self::parse_component(m, "minutes")?, *s),
            [h, m, s] => (
                Self::parse_component(h, "hours")?,
                Self::parse_component(m, "minutes")?,
                *s,
            ),
            _ => {
                return Err(DomainError::BadArgs(
                    "Invalid time format. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)".to_string(),
                ))
            }
        };

        let seconds = seconds_part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;

        if parts.len() == 3 && minutes >= 60 {
            return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
        }
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
        }

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    fn parse_component(value: &str, name: &str) -> Result<u32, DomainError> {
        value
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid {} format", name)))
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// A contiguous time interval of the source treated as one editing unit.
///
/// Always satisfies `0 <= start < end` with finite bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SceneBounds")]
pub struct Scene {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct SceneBounds {
    start: f64,
    end: f64,
}

impl TryFrom<SceneBounds> for Scene {
    type Error = DomainError;

    fn try_from(bounds: SceneBounds) -> Result<Self, Self::Error> {
        Scene::new(bounds.start, bounds.end)
    }
}

impl Scene {
    /// Create a new scene with validation
    pub fn new(start: f64, end: f64) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::BadArgs(format!(
                "Scene bounds must be finite: {}..{}",
                start, end
            )));
        }
        if start < 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Scene start cannot be negative: {}",
                start
            )));
        }
        if start >= end {
            return Err(DomainError::BadArgs(format!(
                "Scene start ({:.3}) must be less than end ({:.3})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Start offset in whole milliseconds
    pub fn start_ms(&self) -> u64 {
        (self.start * 1000.0) as u64
    }

    /// End offset in whole milliseconds
    pub fn end_ms(&self) -> u64 {
        (self.end * 1000.0) as u64
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            TimeSpec::from_seconds(self.start),
            TimeSpec::from_seconds(self.end)
        )
    }
}

/// Visual change between two consecutive sampled frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeSignal {
    pub motion_intensity: f64,
    pub color_divergence: f64,
}

impl ChangeSignal {
    /// Create a change signal, clamping values into their valid ranges
    pub fn new(motion_intensity: f64, color_divergence: f64) -> Self {
        let motion_intensity = if motion_intensity.is_finite() {
            motion_intensity.max(0.0)
        } else {
            0.0
        };
        let color_divergence = if color_divergence.is_finite() {
            color_divergence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            motion_intensity,
            color_divergence,
        }
    }
}

/// Merged per-scene features from the motion and audio aggregators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneFeatures {
    pub scene: Scene,
    pub audio_energy: f64,
    pub motion_activity: f64,
    pub speech_detected: bool,
}

/// Scene features with their combined score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredScene {
    pub features: SceneFeatures,
    pub score: f64,
}

impl ScoredScene {
    pub fn scene(&self) -> &Scene {
        &self.features.scene
    }

    /// Ranking order: higher score first, earlier scene first on ties
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.scene().start().total_cmp(&other.scene().start()))
    }
}

/// Final chronological list of scenes handed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightPlan {
    scenes: Vec<Scene>,
}

impl HighlightPlan {
    /// Build a plan, ordering scenes chronologically
    pub fn new(mut scenes: Vec<Scene>) -> Self {
        scenes.sort_by(|a, b| a.start().total_cmp(&b.start()));
        Self { scenes }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Sum of the selected scene durations
    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(Scene::duration).sum()
    }

    /// `(start, end)` pairs in playback order
    pub fn segments(&self) -> Vec<(f64, f64)> {
        self.scenes.iter().map(|s| (s.start(), s.end())).collect()
    }
}

/// Basic properties of a decoded video stream
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    /// Get frame duration in seconds
    pub fn frame_duration(&self) -> f64 {
        if self.fps > 0.0 {
            1.0 / self.fps
        } else {
            0.0
        }
    }
}

/// Pipeline stage a per-scene failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStage {
    Motion,
    Audio,
    Transcription,
}

/// A recovered per-scene feature failure, kept for the run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFailure {
    pub scene_index: usize,
    pub scene: Scene,
    pub stage: FeatureStage,
    pub message: String,
}

/// Scene boundary detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Combined change threshold (0-1)
    pub diff_threshold: f64,
    /// Frames skipped between samples
    pub frame_skip: usize,
    /// Minimum scene length in seconds
    pub min_scene_duration: f64,
    /// Minimum mean optical-flow magnitude for a significant change
    pub motion_threshold: f64,
    /// Width frames are scaled to before analysis
    pub analysis_width: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            diff_threshold: 0.5,
            frame_skip: 5,
            min_scene_duration: 5.0,
            motion_threshold: 0.05,
            analysis_width: 320,
        }
    }
}

impl DetectionParams {
    /// Fine-grained preset for exporting individual scenes
    pub fn fine() -> Self {
        Self {
            diff_threshold: 0.2,
            frame_skip: 1,
            min_scene_duration: 0.5,
            motion_threshold: 0.05,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.diff_threshold) {
            return Err(DomainError::ConfigFail(format!(
                "diff_threshold must be within 0-1, got {}",
                self.diff_threshold
            )));
        }
        if self.frame_skip < 1 {
            return Err(DomainError::ConfigFail(
                "frame_skip must be at least 1".to_string(),
            ));
        }
        if !self.min_scene_duration.is_finite() || self.min_scene_duration < 0.0 {
            return Err(DomainError::ConfigFail(format!(
                "min_scene_duration must be non-negative, got {}",
                self.min_scene_duration
            )));
        }
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(DomainError::ConfigFail(format!(
                "motion_threshold must be non-negative, got {}",
                self.motion_threshold
            )));
        }
        if self.analysis_width < 16 {
            return Err(DomainError::ConfigFail(
                "analysis_width must be at least 16 pixels".to_string(),
            ));
        }
        Ok(())
    }
}

/// Motion activity parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Grayscale difference above which a pixel counts as changed
    pub pixel_threshold: u8,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self { pixel_threshold: 25 }
    }
}

/// Weighted-sum coefficients for the scene score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub audio: f64,
    pub motion: f64,
    pub speech: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            audio: 1.0,
            motion: 0.001,
            speech: 1000.0,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("audio", self.audio),
            ("motion", self.motion),
            ("speech", self.speech),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::ConfigFail(format!(
                    "scoring weight '{}' must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Highlight selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    /// Target share of the source duration
    pub summary_fraction: f64,
    /// Minimum number of scenes in the plan
    pub min_scenes: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            summary_fraction: 0.2,
            min_scenes: 7,
        }
    }
}

impl SelectionParams {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.summary_fraction.is_finite() || self.summary_fraction > 1.0 {
            return Err(DomainError::ConfigFail(format!(
                "summary_fraction must be at most 1.0, got {}",
                self.summary_fraction
            )));
        }
        if self.min_scenes == 0 {
            return Err(DomainError::ConfigFail(
                "min_scenes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
