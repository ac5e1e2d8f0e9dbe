use async_trait::async_trait;
use crate::types::{ItemId, StoryDetail};
use crate::Result;

#[async_trait]
pub trait Feed: Send + Sync {
    /// Story ids in feed order, best first.
    async fn top_stories(&self) -> Result<Vec<ItemId>>;

    /// Fails with `Error::NotFound` when the feed has no such story.
    async fn get_item(&self, id: ItemId) -> Result<StoryDetail>;
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Plain-text body of the page at `url`. May legitimately be empty.
    async fn extract(&self, url: &str) -> Result<String>;
}
