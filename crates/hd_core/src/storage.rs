use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use crate::types::{Item, ItemId, MessageId, TagWeight};
use crate::{Error, Result};

/// Durable owner of delivered items, likes, tag weights and settings.
/// Every operation is atomic for its own key; nothing here spans keys.
#[async_trait]
pub trait DigestStore: Send + Sync {
    /// `weight = max(floor, weight * (1 - rate))` for every known tag.
    async fn apply_decay(&self, rate: f64, floor: f64) -> Result<()>;

    /// Ids of items delivered within `window` of now.
    async fn recently_delivered_ids(&self, window: Duration) -> Result<HashSet<ItemId>>;

    async fn all_tag_weights(&self) -> Result<HashMap<String, TagWeight>>;

    /// Add `delta` to the tag's weight (starting from the baseline when
    /// unseen) and bump its occurrence count.
    async fn boost(&self, tag: &str, delta: f64) -> Result<()>;

    async fn save_item(&self, item: &Item) -> Result<()>;

    async fn mark_delivered(&self, id: ItemId, when: DateTime<Utc>, message_id: MessageId) -> Result<()>;

    async fn item_by_message_id(&self, message_id: MessageId) -> Result<Option<Item>>;

    async fn is_liked(&self, item_id: ItemId) -> Result<bool>;

    /// Idempotent: recording an existing like is a no-op.
    async fn record_like(&self, item_id: ItemId, when: DateTime<Utc>) -> Result<()>;

    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Oldest delivery time still inside `window` of `now`.
pub fn delivery_cutoff(now: DateTime<Utc>, window: Duration) -> Result<DateTime<Utc>> {
    now.checked_sub_signed(window)
        .ok_or_else(|| Error::Config(format!("Recency window of {} days is out of range", window.num_days())))
}

/// Well-known setting keys.
pub mod settings {
    pub const CHAT_ID: &str = "chat_id";
    pub const DIGEST_SIZE: &str = "digest_size";
    pub const SCHEDULE_TIME: &str = "schedule_time";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_cutoff() {
        let now = Utc::now();
        assert_eq!(delivery_cutoff(now, Duration::days(7)).unwrap(), now - Duration::days(7));
        assert!(matches!(delivery_cutoff(now, Duration::MAX), Err(Error::Config(_))));
    }
}
