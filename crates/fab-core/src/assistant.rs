//! Receive loop: pulls updates, routes commands and answers, sends replies.
//!
//! Updates are handled one at a time in arrival order, so the conversation
//! store is only ever touched from this loop.

use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    commands::{help_text, Command},
    conversation::{ConversationMachine, Reply},
    domain::ChatId,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InboundUpdate, ReplyKeyboard, TextMessage},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    pub timeout: Duration,
    pub error_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            error_backoff: Duration::from_secs(1),
        }
    }
}

pub struct Assistant {
    machine: ConversationMachine,
    messenger: Arc<dyn MessagingPort>,
    poll: PollConfig,
    cursor: Option<i64>,
}

impl Assistant {
    pub fn new(
        machine: ConversationMachine,
        messenger: Arc<dyn MessagingPort>,
        poll: PollConfig,
    ) -> Self {
        Self {
            machine,
            messenger,
            poll,
            cursor: None,
        }
    }

    /// Next update id to request.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    /// Fetch one batch and process it. Returns how many updates were consumed.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self
            .messenger
            .fetch_updates(self.cursor, self.poll.timeout)
            .await
            .map_err(|e| match e {
                Error::Delivery(_) => e,
                other => Error::Delivery(other.to_string()),
            })?;

        let count = updates.len();
        for update in updates {
            // Advance first: a message is never handed to the machine twice.
            let next = update.id + 1;
            self.cursor = Some(self.cursor.map_or(next, |c| c.max(next)));
            self.handle_update(&update).await;
        }
        Ok(count)
    }

    /// Poll until `shutdown` resolves. Delivery failures never end the loop.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let backoff = self.poll.error_backoff;
        tracing::info!("receive loop started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping receive loop");
                    break;
                }
                res = self.poll_once() => {
                    if let Err(e) = res {
                        tracing::warn!(error = %e, "polling failed, retrying");
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }

    pub async fn handle_update(&mut self, update: &InboundUpdate) {
        let Some(msg) = update.message.as_ref() else {
            tracing::debug!(update_id = update.id, "ignoring non-text update");
            return;
        };
        if msg.text.trim().is_empty() {
            return;
        }
        tracing::info!(
            update_id = update.id,
            user = %msg.user_id,
            username = msg.username.as_deref().unwrap_or("unknown"),
            "message received"
        );

        match Command::parse(&msg.text) {
            Some(cmd) => self.handle_command(msg, cmd).await,
            None => {
                if let Some(reply) = self.machine.submit(msg.user_id, &msg.text).await {
                    self.send(msg.chat_id, reply).await;
                }
            }
        }
    }

    async fn handle_command(&mut self, msg: &TextMessage, cmd: Command) {
        let reply = match cmd {
            Command::StartExpense => self.machine.start(msg.user_id),
            Command::Cancel => self.machine.cancel(msg.user_id),
            Command::Help => Reply {
                text: help_text(),
                keyboard: None,
            },
            Command::Unknown(name) => {
                tracing::debug!(command = %name, "ignoring unknown command");
                return;
            }
        };
        self.send(msg.chat_id, reply).await;
    }

    async fn send(&self, chat_id: ChatId, reply: Reply) {
        let caps = self.messenger.capabilities();
        let (text, keyboard) = match reply.keyboard {
            Some(kb) if !caps.supports_reply_keyboards => (inline_options(&reply.text, &kb), None),
            kb => (reply.text, kb),
        };
        let text = truncate_chars(&text, caps.max_message_len);

        if let Err(e) = self
            .messenger
            .send_text(chat_id, &text, keyboard.as_ref())
            .await
        {
            tracing::warn!(chat = chat_id.0, error = %e, "failed to send reply");
        }
    }
}

fn inline_options(text: &str, keyboard: &ReplyKeyboard) -> String {
    let options = keyboard.labels().collect::<Vec<_>>().join(" | ");
    format!("{text}\n\n{options}")
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
