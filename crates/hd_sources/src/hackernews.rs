use async_trait::async_trait;
use hd_core::{Error, Feed, ItemId, Result, StoryDetail};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const DISCUSSION_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct HnItem {
    id: ItemId,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    descendants: Option<u32>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    dead: bool,
}

/// Hacker News via the public Firebase API.
#[derive(Debug, Clone)]
pub struct HackerNewsFeed {
    client: Client,
    base_url: String,
}

impl HackerNewsFeed {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::Feed(format!("{}: {}", url, e)))?;
        Ok(response.json().await?)
    }
}

impl Default for HackerNewsFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn an item payload into a story. `null`, deleted, dead and
/// non-story items count as missing.
fn story_from_value(id: ItemId, value: serde_json::Value) -> Result<StoryDetail> {
    if value.is_null() {
        return Err(Error::NotFound(format!("story {}", id)));
    }
    let item: HnItem = serde_json::from_value(value)?;
    if item.deleted || item.dead {
        return Err(Error::NotFound(format!("story {} was removed", id)));
    }
    if item.kind.as_deref().is_some_and(|kind| kind != "story") {
        return Err(Error::NotFound(format!("item {} is not a story", id)));
    }
    let title = item
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::NotFound(format!("story {} has no title", id)))?;

    Ok(StoryDetail {
        id: item.id,
        title,
        url: item
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("{}{}", DISCUSSION_URL, item.id)),
        score: item.score.unwrap_or(0),
        descendants: item.descendants.unwrap_or(0),
    })
}

#[async_trait]
impl Feed for HackerNewsFeed {
    async fn top_stories(&self) -> Result<Vec<ItemId>> {
        let value = self.get_json("topstories.json").await?;
        serde_json::from_value(value).map_err(|e| Error::Feed(format!("Malformed top stories: {}", e)))
    }

    async fn get_item(&self, id: ItemId) -> Result<StoryDetail> {
        let value = self.get_json(&format!("item/{}.json", id)).await?;
        story_from_value(id, value)
    }
}
