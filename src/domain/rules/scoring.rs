// Scene scoring

use crate::domain::model::*;

/// Weighted-sum scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneScorer {
    weights: ScoringWeights,
}

impl SceneScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// `audio * energy + motion * activity + speech * [speech_detected]`
    pub fn score(&self, features: &SceneFeatures) -> f64 {
        let speech = if features.speech_detected { 1.0 } else { 0.0 };
        self.weights.audio * features.audio_energy
            + self.weights.motion * features.motion_activity
            + self.weights.speech * speech
    }

    pub fn score_all(&self, features: &[SceneFeatures]) -> Vec<ScoredScene> {
        features
            .iter()
            .map(|f| ScoredScene {
                features: *f,
                score: self.score(f),
            })
            .collect()
    }
}
