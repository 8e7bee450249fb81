// Highlight selection - greedy budgeted pick with a minimum scene count

use crate::domain::model::*;

/// Picks the highest-scoring scenes that fit the summary budget
#[derive(Debug, Clone)]
pub struct HighlightSelector {
    params: SelectionParams,
}

impl HighlightSelector {
    pub fn new(params: SelectionParams) -> Self {
        Self { params }
    }

    /// Duration budget for a source of `total_duration` seconds
    pub fn budget(&self, total_duration: f64) -> f64 {
        (total_duration * self.params.summary_fraction).max(0.0)
    }

    /// Select scenes from `scored` and return them in playback order.
    ///
    /// Scenes are accepted best-first while they fit the budget. If fewer than
    /// `min_scenes` were accepted, the best remaining scenes are added
    /// regardless of the budget.
    pub fn select(&self, scored: &[ScoredScene], total_duration: f64) -> HighlightPlan {
        let mut ranked: Vec<&ScoredScene> = scored.iter().collect();
        ranked.sort_by(|a, b| a.rank_cmp(b));

        let budget = self.budget(total_duration);
        let mut accumulated = 0.0;
        let mut taken = vec![false; ranked.len()];

        for (i, candidate) in ranked.iter().enumerate() {
            if accumulated >= budget {
                break;
            }
            let length = candidate.scene().duration();
            if accumulated + length <= budget {
                accumulated += length;
                taken[i] = true;
            }
        }

        let floor = self.params.min_scenes.min(ranked.len());
        let mut count = taken.iter().filter(|t| **t).count();
        for flag in taken.iter_mut() {
            if count >= floor {
                break;
            }
            if !*flag {
                *flag = true;
                count += 1;
            }
        }

        let selected = ranked
            .iter()
            .zip(taken)
            .filter(|(_, t)| *t)
            .map(|(s, _)| *s.scene())
            .collect();

        HighlightPlan::new(selected)
    }
}
