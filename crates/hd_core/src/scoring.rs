use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::preferences::BASELINE_WEIGHT;
use crate::types::Item;

/// Blend between learned preference (`alpha`) and raw popularity (`beta`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { alpha: 0.7, beta: 0.3 }
    }
}

/// Sum of tag weights; tags missing from `weights` count as the baseline.
pub fn tag_score(tags: &[String], weights: &HashMap<String, f64>) -> f64 {
    tags.iter()
        .map(|tag| weights.get(tag).copied().unwrap_or(BASELINE_WEIGHT))
        .sum()
}

/// `log10(score + 1)`: zero for an unscored story, compresses outliers.
pub fn engagement_component(engagement_score: u32) -> f64 {
    (f64::from(engagement_score) + 1.0).log10()
}

pub fn score(tags: &[String], engagement_score: u32, weights: &HashMap<String, f64>, scoring: ScoringWeights) -> f64 {
    tag_score(tags, weights) * scoring.alpha + engagement_component(engagement_score) * scoring.beta
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f64,
}

/// Score every item and order best first. The sort is stable, so equal
/// scores keep their fetch order.
pub fn rank(items: Vec<Item>, weights: &HashMap<String, f64>, scoring: ScoringWeights) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = items
        .into_iter()
        .map(|item| {
            let score = score(&item.tags, item.engagement_score, weights, scoring);
            ScoredItem { item, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
