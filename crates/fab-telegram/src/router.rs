use std::{sync::Arc, time::Duration};

use teloxide::prelude::*;

use fab_core::{
    assistant::{Assistant, PollConfig},
    config::Config,
    conversation::{ConversationMachine, LocalClock},
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    state::InMemoryStateStore,
    writer::ExpenseWriter,
};

use crate::TelegramMessenger;

/// Extra time the HTTP client waits beyond the long-poll timeout.
const POLL_HTTP_SLACK: Duration = Duration::from_secs(10);

fn build_bot(cfg: &Config) -> anyhow::Result<Bot> {
    // teloxide's default client times out before a 30s long poll completes.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(cfg.poll_timeout + POLL_HTTP_SLACK)
        .build()?;
    Ok(Bot::with_client(cfg.telegram_bot_token.clone(), client))
}

/// Run the long-polling receive loop until Ctrl-C.
pub async fn run_polling(cfg: Arc<Config>, writer: Arc<dyn ExpenseWriter>) -> anyhow::Result<()> {
    let bot = build_bot(&cfg)?;

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "finance assistant started"),
        Err(e) => tracing::warn!(error = %e, "could not fetch bot identity"),
    }

    // Throttle outbound sends to stay clear of Telegram flood limits; 429s are
    // still retried once at the adapter layer.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let machine = ConversationMachine::new(
        Box::new(InMemoryStateStore::default()),
        writer,
        Arc::new(LocalClock),
    );
    let assistant = Assistant::new(
        machine,
        messenger,
        PollConfig {
            timeout: cfg.poll_timeout,
            error_backoff: cfg.poll_error_backoff,
        },
    );

    assistant
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("finance assistant stopped");
    Ok(())
}
