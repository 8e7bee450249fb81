// Frame and audio analysis - signal extraction and scene detection

pub mod audio;
pub mod audio_features;
pub mod change_signal;
pub mod frame;
pub mod histogram;
pub mod motion;
pub mod optical_flow;
pub mod scene_detector;

pub use audio::{AudioClip, AudioTrack};
pub use audio_features::{AudioFeatureAggregator, AudioOutcome};
pub use change_signal::ChangeSignalExtractor;
pub use frame::VideoFrame;
pub use motion::MotionActivityAggregator;
pub use scene_detector::{BoundaryReport, DetectionStatus, SceneBoundaryDetector};
