use std::time::Duration;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InboundUpdate, MessagingCapabilities, ReplyKeyboard},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation; delivery is pull-based so the
/// assistant owns the cursor and the processing order.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Long-poll for updates with id >= `cursor` (all pending when `None`).
    async fn fetch_updates(
        &self,
        cursor: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<InboundUpdate>>;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<MessageRef>;
}
