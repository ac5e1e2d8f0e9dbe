use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hd_core::{DigestStore, Error, Item, ItemId, MessageId, Result, TagWeight};
use hd_storage::MemoryStorage;

/// Memory store with switchable failures per operation.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStorage,
    pub fail_decay: bool,
    pub fail_recent: bool,
    pub fail_weights: bool,
    pub fail_boost: HashSet<String>,
    pub fail_save: HashSet<ItemId>,
    pub fail_mark: HashSet<ItemId>,
    pub fail_like: bool,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn disk_full() -> Error {
    Error::Database("disk full".to_string())
}

#[async_trait]
impl DigestStore for FaultyStore {
    async fn apply_decay(&self, rate: f64, floor: f64) -> Result<()> {
        if self.fail_decay {
            return Err(disk_full());
        }
        self.inner.apply_decay(rate, floor).await
    }

    async fn recently_delivered_ids(&self, window: Duration) -> Result<HashSet<ItemId>> {
        if self.fail_recent {
            return Err(disk_full());
        }
        self.inner.recently_delivered_ids(window).await
    }

    async fn all_tag_weights(&self) -> Result<HashMap<String, TagWeight>> {
        if self.fail_weights {
            return Err(disk_full());
        }
        self.inner.all_tag_weights().await
    }

    async fn boost(&self, tag: &str, delta: f64) -> Result<()> {
        if self.fail_boost.contains(tag) {
            return Err(disk_full());
        }
        self.inner.boost(tag, delta).await
    }

    async fn save_item(&self, item: &Item) -> Result<()> {
        if self.fail_save.contains(&item.id) {
            return Err(disk_full());
        }
        self.inner.save_item(item).await
    }

    async fn mark_delivered(&self, id: ItemId, when: DateTime<Utc>, message_id: MessageId) -> Result<()> {
        if self.fail_mark.contains(&id) {
            return Err(disk_full());
        }
        self.inner.mark_delivered(id, when, message_id).await
    }

    async fn item_by_message_id(&self, message_id: MessageId) -> Result<Option<Item>> {
        self.inner.item_by_message_id(message_id).await
    }

    async fn is_liked(&self, item_id: ItemId) -> Result<bool> {
        self.inner.is_liked(item_id).await
    }

    async fn record_like(&self, item_id: ItemId, when: DateTime<Utc>) -> Result<()> {
        if self.fail_like {
            return Err(disk_full());
        }
        self.inner.record_like(item_id, when).await
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.inner.get_setting(key).await
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set_setting(key, value).await
    }
}
