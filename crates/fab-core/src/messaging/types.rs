use crate::domain::{ChatId, UserId};

/// One inbound update as delivered by the messenger.
///
/// `id` is the delivery cursor position; updates the assistant cannot use
/// (stickers, edits, service messages) arrive with `message: None` so the
/// cursor still advances past them.
#[derive(Clone, Debug)]
pub struct InboundUpdate {
    pub id: i64,
    pub message: Option<TextMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Single-use grid of reply labels shown under the input field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// All options on a single row.
    pub fn single_row(options: &[&str]) -> Self {
        Self {
            rows: vec![options.iter().map(|s| s.to_string()).collect()],
        }
    }

    /// Two options per row; an odd count leaves the last option alone.
    pub fn pairs(options: &[String]) -> Self {
        Self {
            rows: options.chunks(2).map(|c| c.to_vec()).collect(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_reply_keyboards: bool,
    pub max_message_len: usize,
}
