use std::sync::Arc;
use chrono::Utc;
use hd_core::{DigestConfig, DigestStore, ItemId, MessageId, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use crate::preferences::PreferenceModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReactionOutcome {
    /// Not the positive reaction.
    Ignored,
    /// The message is not a digest item we delivered.
    UnknownMessage,
    AlreadyLiked { item_id: ItemId },
    Liked { item_id: ItemId, tags: Vec<String> },
}

/// Emoji reactions sometimes arrive with a trailing variation selector.
fn normalize_reaction(reaction: &str) -> &str {
    reaction.trim().trim_end_matches('\u{fe0f}')
}

/// Turns a positive reaction on a delivered message into exactly one
/// preference boost per item.
#[derive(Clone)]
pub struct ReactionProcessor {
    store: Arc<dyn DigestStore>,
    preferences: PreferenceModel,
    positive_reaction: String,
    boost_amount: f64,
}

impl ReactionProcessor {
    pub fn new(store: Arc<dyn DigestStore>, config: &DigestConfig) -> Self {
        Self {
            preferences: PreferenceModel::new(store.clone()),
            store,
            positive_reaction: config.positive_reaction.clone(),
            boost_amount: config.boost_amount,
        }
    }

    pub fn positive_reaction(&self) -> &str {
        &self.positive_reaction
    }

    pub fn is_positive(&self, reaction: &str) -> bool {
        normalize_reaction(reaction) == normalize_reaction(&self.positive_reaction)
    }

    /// Boost runs before the like is recorded, and the like is recorded
    /// even when the boost partly failed. A crash between the two means a
    /// retry boosts again.
    pub async fn handle(&self, message_id: MessageId, reaction: &str) -> Result<ReactionOutcome> {
        if !self.is_positive(reaction) {
            debug!("Ignoring reaction '{}' on message {}", reaction, message_id);
            return Ok(ReactionOutcome::Ignored);
        }

        let Some(item) = self.store.item_by_message_id(message_id).await? else {
            debug!("Reaction on unknown message {}", message_id);
            return Ok(ReactionOutcome::UnknownMessage);
        };

        if self.store.is_liked(item.id).await? {
            debug!("Item {} already liked", item.id);
            return Ok(ReactionOutcome::AlreadyLiked { item_id: item.id });
        }

        let boosted = self.preferences.boost(&item.tags, self.boost_amount).await;
        if let Err(e) = &boosted {
            error!("Boost for item {} incomplete: {}", item.id, e);
        }
        let recorded = self.store.record_like(item.id, Utc::now()).await;
        if let Err(e) = &recorded {
            error!("Could not record like for item {}: {}", item.id, e);
        }
        boosted?;
        recorded?;

        info!("👍 Liked '{}', boosted {:?}", item.title, item.tags);
        Ok(ReactionOutcome::Liked {
            item_id: item.id,
            tags: item.tags,
        })
    }
}
