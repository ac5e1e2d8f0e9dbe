use std::sync::Arc;
use hd_core::{DigestStore, Error, Result, Sender};
use tracing::info;

pub mod console;
pub mod format;
pub mod telegram;

pub use console::ConsoleSender;
pub use format::format_item;
pub use telegram::TelegramSender;

/// Build the sender named by `kind` (`telegram` or `console`).
pub fn create_sender(
    kind: &str,
    telegram_token: Option<String>,
    store: Arc<dyn DigestStore>,
) -> Result<Arc<dyn Sender>> {
    let sender: Arc<dyn Sender> = match kind {
        "console" => Arc::new(ConsoleSender::new()),
        "telegram" => {
            let token = telegram_token
                .ok_or_else(|| Error::Config("The telegram sender needs a bot token".to_string()))?;
            Arc::new(TelegramSender::new(token, store)?)
        }
        other => return Err(Error::Config(format!("Unknown sender: {}", other))),
    };
    info!("Delivering through {}", sender.name());
    Ok(sender)
}
