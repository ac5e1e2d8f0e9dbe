use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hd_core::preferences::validate_decay;
use hd_core::storage::delivery_cutoff;
use hd_core::{DigestStore, Error, Item, ItemId, Like, MessageId, Result, TagWeight};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::StorageBackend;

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<ItemId, Item>,
    tag_weights: HashMap<String, TagWeight>,
    likes: HashMap<ItemId, Like>,
    settings: HashMap<String, String>,
}

impl MemoryStore {
    fn save_item(&mut self, item: &Item) {
        let mut stored = item.clone();
        if let Some(existing) = self.items.get(&item.id) {
            stored.delivered_at = stored.delivered_at.or(existing.delivered_at);
            stored.message_id = stored.message_id.or(existing.message_id);
        }
        self.items.insert(item.id, stored);
    }

    fn recently_delivered_ids(&self, cutoff: DateTime<Utc>) -> HashSet<ItemId> {
        self.items
            .values()
            .filter(|item| item.delivered_at.map_or(false, |at| at >= cutoff))
            .map(|item| item.id)
            .collect()
    }
}

/// Process-local store. Holds nothing across restarts.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn like_count(&self) -> usize {
        self.store.read().await.likes.len()
    }

    pub async fn item(&self, id: ItemId) -> Option<Item> {
        self.store.read().await.items.get(&id).cloned()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> where Self: Sized {
        Ok(MemoryStorage::new())
    }
}

#[async_trait]
impl DigestStore for MemoryStorage {
    async fn apply_decay(&self, rate: f64, floor: f64) -> Result<()> {
        validate_decay(rate, floor)?;
        let mut store = self.store.write().await;
        for weight in store.tag_weights.values_mut() {
            weight.decay(rate, floor);
        }
        Ok(())
    }

    async fn recently_delivered_ids(&self, window: Duration) -> Result<HashSet<ItemId>> {
        let cutoff = delivery_cutoff(Utc::now(), window)?;
        Ok(self.store.read().await.recently_delivered_ids(cutoff))
    }

    async fn all_tag_weights(&self) -> Result<HashMap<String, TagWeight>> {
        Ok(self.store.read().await.tag_weights.clone())
    }

    async fn boost(&self, tag: &str, delta: f64) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .tag_weights
            .entry(tag.to_string())
            .or_insert_with(|| TagWeight::new(tag))
            .boost(delta);
        Ok(())
    }

    async fn save_item(&self, item: &Item) -> Result<()> {
        self.store.write().await.save_item(item);
        Ok(())
    }

    async fn mark_delivered(&self, id: ItemId, when: DateTime<Utc>, message_id: MessageId) -> Result<()> {
        let mut store = self.store.write().await;
        let item = store
            .items
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))?;
        item.mark_delivered(when, message_id);
        Ok(())
    }

    async fn item_by_message_id(&self, message_id: MessageId) -> Result<Option<Item>> {
        let store = self.store.read().await;
        Ok(store
            .items
            .values()
            .find(|item| item.message_id == Some(message_id))
            .cloned())
    }

    async fn is_liked(&self, item_id: ItemId) -> Result<bool> {
        Ok(self.store.read().await.likes.contains_key(&item_id))
    }

    async fn record_like(&self, item_id: ItemId, when: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .likes
            .entry(item_id)
            .or_insert(Like { item_id, liked_at: when });
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.read().await.settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.store
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: ItemId) -> Item {
        Item {
            id,
            title: format!("Story {}", id),
            url: format!("https://example.com/{}", id),
            summary: "summary".to_string(),
            tags: vec!["rust".to_string()],
            engagement_score: 10,
            fetched_at: Utc::now(),
            delivered_at: None,
            message_id: None,
        }
    }

    #[tokio::test]
    async fn test_memory_storage_delivery_roundtrip() {
        let storage = MemoryStorage::new();
        storage.save_item(&item(1)).await.unwrap();
        storage.save_item(&item(2)).await.unwrap();
        storage.mark_delivered(1, Utc::now(), 100).await.unwrap();

        let recent = storage.recently_delivered_ids(Duration::days(7)).await.unwrap();
        assert_eq!(recent, HashSet::from([1]));

        let found = storage.item_by_message_id(100).await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert!(storage.item_by_message_id(101).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recency_window_excludes_old_deliveries() {
        let storage = MemoryStorage::new();
        storage.save_item(&item(1)).await.unwrap();
        storage
            .mark_delivered(1, Utc::now() - Duration::days(8), 5)
            .await
            .unwrap();

        let recent = storage.recently_delivered_ids(Duration::days(7)).await.unwrap();
        assert!(recent.is_empty());

        assert!(matches!(
            storage.recently_delivered_ids(Duration::MAX).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_resave_keeps_delivery_stamp() {
        let storage = MemoryStorage::new();
        storage.save_item(&item(3)).await.unwrap();
        storage.mark_delivered(3, Utc::now(), 9).await.unwrap();
        storage.save_item(&item(3)).await.unwrap();

        assert_eq!(storage.item(3).await.unwrap().message_id, Some(9));
    }

    #[tokio::test]
    async fn test_mark_delivered_unknown_item() {
        let storage = MemoryStorage::new();
        let result = storage.mark_delivered(404, Utc::now(), 1).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_boost_and_decay() {
        let storage = MemoryStorage::new();
        storage.boost("go", 0.5).await.unwrap();
        storage.boost("go", 0.5).await.unwrap();

        let weights = storage.all_tag_weights().await.unwrap();
        assert_eq!(weights["go"].weight, 2.0);
        assert_eq!(weights["go"].occurrences, 2);

        storage.apply_decay(0.5, 0.1).await.unwrap();
        let weights = storage.all_tag_weights().await.unwrap();
        assert_eq!(weights["go"].weight, 1.0);

        assert!(storage.apply_decay(1.5, 0.1).await.is_err());
    }

    #[tokio::test]
    async fn test_record_like_is_idempotent() {
        let storage = MemoryStorage::new();
        assert!(!storage.is_liked(1).await.unwrap());
        storage.record_like(1, Utc::now()).await.unwrap();
        storage.record_like(1, Utc::now()).await.unwrap();
        assert!(storage.is_liked(1).await.unwrap());
        assert_eq!(storage.like_count().await, 1);
    }

    #[tokio::test]
    async fn test_settings() {
        let storage = MemoryStorage::new();
        assert!(storage.get_setting("chat_id").await.unwrap().is_none());
        storage.set_setting("chat_id", "123").await.unwrap();
        storage.set_setting("chat_id", "456").await.unwrap();
        assert_eq!(storage.get_setting("chat_id").await.unwrap().as_deref(), Some("456"));
    }
}
