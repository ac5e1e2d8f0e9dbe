use std::sync::atomic::{AtomicI64, Ordering};
use async_trait::async_trait;
use hd_core::{Item, MessageId, Result, Sender};
use tracing::info;
use super::format::format_item;

/// Logs each entry instead of sending it. Message ids count up from 1.
#[derive(Debug, Default)]
pub struct ConsoleSender {
    last_id: AtomicI64,
}

impl ConsoleSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Sender for ConsoleSender {
    fn name(&self) -> &str {
        "Console"
    }

    async fn deliver(&self, item: &Item) -> Result<MessageId> {
        let message_id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        info!("📨 [{}] {}", message_id, format_item(item));
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_console_ids_increase() {
        let sender = ConsoleSender::new();
        let item = Item {
            id: 9,
            title: "t".to_string(),
            url: "https://example.com".to_string(),
            summary: "s".to_string(),
            tags: vec![],
            engagement_score: 0,
            fetched_at: Utc::now(),
            delivered_at: None,
            message_id: None,
        };
        assert_eq!(sender.deliver(&item).await.unwrap(), 1);
        assert_eq!(sender.deliver(&item).await.unwrap(), 2);
    }
}
