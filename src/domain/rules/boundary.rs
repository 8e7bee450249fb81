// Scene boundary detection - hysteresis over the change-signal stream

use crate::domain::model::*;

/// Weight of the color divergence in the combined change
pub const COLOR_WEIGHT: f64 = 0.7;
/// Weight of the motion intensity in the combined change
pub const MOTION_WEIGHT: f64 = 0.3;
/// Significant observations that must accumulate before a cut is accepted
pub const SIGNIFICANCE_TOLERANCE: u32 = 3;

/// Hysteresis state of the boundary tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// No outstanding significant changes
    Stable,
    /// Net count of recent significant changes
    Accumulating(u32),
}

impl TrackerState {
    pub fn count(&self) -> u32 {
        match self {
            TrackerState::Stable => 0,
            TrackerState::Accumulating(n) => *n,
        }
    }

    fn rise(self) -> Self {
        TrackerState::Accumulating(self.count().saturating_add(1))
    }

    fn decay(self) -> Self {
        match self.count() {
            0 | 1 => TrackerState::Stable,
            n => TrackerState::Accumulating(n - 1),
        }
    }
}

/// Weighted change combining color divergence and motion
pub fn combined_change(signal: &ChangeSignal) -> f64 {
    COLOR_WEIGHT * signal.color_divergence + MOTION_WEIGHT * signal.motion_intensity
}

/// Turns timestamped change signals into scene boundaries
#[derive(Debug, Clone)]
pub struct BoundaryTracker {
    params: DetectionParams,
    state: TrackerState,
    scene_start: f64,
    scenes: Vec<Scene>,
}

impl BoundaryTracker {
    pub fn new(params: &DetectionParams) -> Self {
        Self {
            params: params.clone(),
            state: TrackerState::Stable,
            scene_start: 0.0,
            scenes: Vec::new(),
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn scene_start(&self) -> f64 {
        self.scene_start
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn is_significant(&self, signal: &ChangeSignal) -> bool {
        combined_change(signal) > self.params.diff_threshold
            && signal.motion_intensity > self.params.motion_threshold
    }

    /// Feed a change signal observed at `now` seconds.
    /// Returns the scene closed by this observation, if any.
    pub fn observe(&mut self, signal: &ChangeSignal, now: f64) -> Option<Scene> {
        if !self.is_significant(signal) {
            self.state = self.state.decay();
            return None;
        }

        self.state = self.state.rise();
        if self.state.count() <= SIGNIFICANCE_TOLERANCE {
            return None;
        }
        if now <= self.scene_start || now - self.scene_start < self.params.min_scene_duration {
            return None;
        }

        let scene = Scene::new(self.scene_start, now).ok()?;
        self.scenes.push(scene);
        self.scene_start = now;
        self.state = TrackerState::Stable;
        Some(scene)
    }

    /// Close the trailing partial scene at `end` when it is long enough
    pub fn finish(mut self, end: f64) -> Vec<Scene> {
        if end - self.scene_start >= self.params.min_scene_duration {
            if let Ok(scene) = Scene::new(self.scene_start, end) {
                self.scenes.push(scene);
            }
        }
        self.scenes
    }

    /// Scenes emitted so far, without the trailing partial scene
    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
    }
}
