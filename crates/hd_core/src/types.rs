use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feed-native story identifier.
pub type ItemId = i64;

/// Identifier the delivery channel assigned to a sent message.
pub type MessageId = i64;

/// A story as returned by the feed, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetail {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    pub score: u32,
    pub descendants: u32,
}

/// Summarizer output for one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub tags: Vec<String>,
}

/// An enriched story. Append-only once persisted; only the delivery
/// stamp is filled in after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub engagement_score: u32,
    pub fetched_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub message_id: Option<MessageId>,
}

impl Item {
    pub fn from_story(story: StoryDetail, summary: Summary, fetched_at: DateTime<Utc>) -> Self {
        Self {
            id: story.id,
            title: story.title,
            url: story.url,
            summary: summary.summary,
            tags: summary.tags,
            engagement_score: story.score,
            fetched_at,
            delivered_at: None,
            message_id: None,
        }
    }

    pub fn mark_delivered(&mut self, at: DateTime<Utc>, message_id: MessageId) {
        self.delivered_at = Some(at);
        self.message_id = Some(message_id);
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }
}

/// Learned preference for one topic tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagWeight {
    pub tag: String,
    pub weight: f64,
    pub occurrences: u32,
}

/// Record that positive feedback for an item has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub item_id: ItemId,
    pub liked_at: DateTime<Utc>,
}
