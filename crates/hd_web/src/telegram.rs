//! The slice of the Telegram `Update` object the webhook cares about.

use hd_core::MessageId;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message_reaction: Option<MessageReactionUpdated>,
}

#[derive(Debug, Deserialize)]
pub struct MessageReactionUpdated {
    pub message_id: MessageId,
    #[serde(default)]
    pub new_reaction: Vec<ReactionType>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionType {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl Update {
    /// The message id and the first emoji reaction accepted by `matches`.
    pub fn reaction<F>(&self, matches: F) -> Option<(MessageId, &str)>
    where
        F: Fn(&str) -> bool,
    {
        let update = self.message_reaction.as_ref()?;
        update
            .new_reaction
            .iter()
            .filter(|r| r.kind == "emoji")
            .filter_map(|r| r.emoji.as_deref())
            .find(|emoji| matches(emoji))
            .map(|emoji| (update.message_id, emoji))
    }
}
