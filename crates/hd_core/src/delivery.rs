use async_trait::async_trait;
use crate::types::{Item, MessageId};
use crate::Result;

#[async_trait]
pub trait Sender: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver one digest item and return the channel's message id.
    async fn deliver(&self, item: &Item) -> Result<MessageId>;
}
