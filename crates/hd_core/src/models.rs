use async_trait::async_trait;
use crate::types::Summary;
use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Produce a short summary and a small set of topic tags.
    /// Any error means the caller drops the item.
    async fn summarize(&self, title: &str, content: &str) -> Result<Summary>;
}
