// Domain rules - Scene detection, scoring and selection policies

pub mod boundary;
pub mod scoring;
pub mod selection;

pub use boundary::{
    combined_change, BoundaryTracker, TrackerState, COLOR_WEIGHT, MOTION_WEIGHT,
    SIGNIFICANCE_TOLERANCE,
};
pub use scoring::SceneScorer;
pub use selection::HighlightSelector;
