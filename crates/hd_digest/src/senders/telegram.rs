use std::fmt;
use std::sync::Arc;
use async_trait::async_trait;
use hd_core::storage::settings;
use hd_core::{DigestStore, Error, Item, MessageId, Result, Sender};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use super::format::format_item;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: MessageId,
}

fn message_id_from(response: ApiResponse<SentMessage>) -> Result<MessageId> {
    if !response.ok {
        return Err(Error::Delivery(
            response.description.unwrap_or_else(|| "Telegram rejected the message".to_string()),
        ));
    }
    response
        .result
        .map(|message| message.message_id)
        .ok_or_else(|| Error::Delivery("Telegram response carried no message".to_string()))
}

fn redacted(err: reqwest::Error) -> Error {
    Error::Delivery(err.without_url().to_string())
}

/// Sends digest entries through the Telegram Bot API. The destination
/// chat is read from the `chat_id` setting on every delivery.
pub struct TelegramSender {
    client: Arc<Client>,
    token: String,
    api_url: String,
    store: Arc<dyn DigestStore>,
}

impl TelegramSender {
    pub fn new(token: String, store: Arc<dyn DigestStore>) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(Error::Config("Telegram bot token is required".to_string()));
        }
        Ok(Self {
            client: Arc::new(Client::new()),
            token,
            api_url: DEFAULT_API_URL.to_string(),
            store,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn chat_id(&self) -> Result<String> {
        self.store
            .get_setting(settings::CHAT_ID)
            .await?
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::Config("No chat_id setting; nowhere to deliver".to_string()))
    }
}

impl fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSender")
            .field("client", &"<reqwest::Client>")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[async_trait]
impl Sender for TelegramSender {
    fn name(&self) -> &str {
        "Telegram"
    }

    async fn deliver(&self, item: &Item) -> Result<MessageId> {
        let chat_id = self.chat_id().await?;
        let request = SendMessage {
            chat_id: &chat_id,
            text: format_item(item),
            parse_mode: "HTML",
        };

        // Error statuses still carry the JSON envelope with a description.
        // The request URL holds the token, so it is dropped from errors.
        let response = self.client
            .post(format!("{}/bot{}/sendMessage", self.api_url, self.token))
            .json(&request)
            .send()
            .await
            .map_err(redacted)?
            .json::<ApiResponse<SentMessage>>()
            .await
            .map_err(redacted)?;

        let message_id = message_id_from(response)?;
        debug!("Delivered item {} as message {}", item.id, message_id);
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hd_storage::MemoryStorage;

    fn item() -> Item {
        Item {
            id: 1,
            title: "t".to_string(),
            url: "https://example.com".to_string(),
            summary: "s".to_string(),
            tags: vec![],
            engagement_score: 1,
            fetched_at: Utc::now(),
            delivered_at: None,
            message_id: None,
        }
    }

    #[test]
    fn test_response_parsing() {
        let ok: ApiResponse<SentMessage> =
            serde_json::from_str(r#"{"ok": true, "result": {"message_id": 4321, "chat": {"id": 1}}}"#).unwrap();
        assert_eq!(message_id_from(ok).unwrap(), 4321);

        let rejected: ApiResponse<SentMessage> =
            serde_json::from_str(r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#)
                .unwrap();
        match message_id_from(rejected) {
            Err(Error::Delivery(msg)) => assert_eq!(msg, "Bad Request: chat not found"),
            other => panic!("expected delivery error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_chat_id_is_config_error() {
        let store = Arc::new(MemoryStorage::new());
        let sender = TelegramSender::new("123:abc".to_string(), store).unwrap();
        assert!(matches!(sender.deliver(&item()).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_transport_errors_hide_token() {
        let store = Arc::new(MemoryStorage::new());
        store.set_setting(settings::CHAT_ID, "42").await.unwrap();
        let sender = TelegramSender::new("123456:SUPERSECRET".to_string(), store)
            .unwrap()
            .with_api_url("http://127.0.0.1:1");

        match sender.deliver(&item()).await {
            Err(Error::Delivery(msg)) => assert!(!msg.contains("SUPERSECRET"), "token leaked: {}", msg),
            other => panic!("expected delivery error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_is_required_and_redacted() {
        let store: Arc<dyn DigestStore> = Arc::new(MemoryStorage::new());
        assert!(TelegramSender::new(" ".to_string(), store.clone()).is_err());

        let sender = TelegramSender::new("123:secret".to_string(), store)
            .unwrap()
            .with_api_url("http://localhost:8081/");
        let debug = format!("{:?}", sender);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("http://localhost:8081\""));
    }
}
