use std::collections::HashMap;
use std::sync::Arc;
use hd_core::preferences::validate_decay;
use hd_core::{DigestStore, Error, Result, TagWeight};
use tracing::{debug, warn};

/// Learned tag weights, kept in the store. Every mutation is a
/// single-key store operation; no in-process lock is held.
#[derive(Clone)]
pub struct PreferenceModel {
    store: Arc<dyn DigestStore>,
}

impl PreferenceModel {
    pub fn new(store: Arc<dyn DigestStore>) -> Self {
        Self { store }
    }

    /// `weight = max(floor, weight * (1 - rate))` for every known tag.
    pub async fn decay(&self, rate: f64, floor: f64) -> Result<()> {
        validate_decay(rate, floor)?;
        self.store.apply_decay(rate, floor).await?;
        debug!("Decayed tag weights (rate={}, floor={})", rate, floor);
        Ok(())
    }

    /// Boost each tag by `amount`. Every tag is attempted even when an
    /// earlier one fails; the failures come back as `PartialBoost`.
    pub async fn boost(&self, tags: &[String], amount: f64) -> Result<()> {
        let mut failed = Vec::new();
        for tag in tags {
            if let Err(e) = self.store.boost(tag, amount).await {
                warn!("Failed to boost tag '{}': {}", tag, e);
                failed.push(tag.clone());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::PartialBoost { failed })
        }
    }

    /// Tag to weight, as the scoring function consumes it.
    pub async fn weights(&self) -> Result<HashMap<String, f64>> {
        Ok(self
            .store
            .all_tag_weights()
            .await?
            .into_iter()
            .map(|(tag, weight)| (tag, weight.weight))
            .collect())
    }

    /// All tag weights, heaviest first.
    pub async fn ranked(&self) -> Result<Vec<TagWeight>> {
        let mut weights: Vec<TagWeight> = self.store.all_tag_weights().await?.into_values().collect();
        weights.sort_by(|a, b| b.weight.total_cmp(&a.weight).then_with(|| a.tag.cmp(&b.tag)));
        Ok(weights)
    }
}
