//! The four-step expense dialogue.
//!
//! description -> amount -> date (today / yesterday / custom) -> category,
//! then the record goes to the writer and the user's state is dropped.

use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};

use crate::{
    domain::{Category, UserId},
    messaging::types::ReplyKeyboard,
    state::{ConversationState, Stage, StateStore},
    writer::ExpenseWriter,
};

pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub const LABEL_TODAY: &str = "Hoje";
pub const LABEL_YESTERDAY: &str = "Ontem";
pub const LABEL_CUSTOM_DATE: &str = "Data personalizada";

const PROMPT_DESCRIPTION: &str = "💰 Vamos registrar um gasto!\n\nO que você comprou?";
const PROMPT_AMOUNT: &str = "💵 Quanto você gastou? (ex: 300,00)";
const PROMPT_DATE: &str = "📅 Quando foi?";
const PROMPT_CUSTOM_DATE: &str = "📝 Digite a data no formato DD/MM/AAAA:";
const PROMPT_CATEGORY: &str = "📂 Escolha a categoria:";
const CANCELLED: &str = "❌ Operação cancelada.";

/// Source of "today" for date keywords.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// What to send back to the user after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateChoice {
    Today,
    Yesterday,
    Custom,
}

fn date_choice(text: &str) -> Option<DateChoice> {
    match text.trim().to_lowercase().as_str() {
        "hoje" | "today" => Some(DateChoice::Today),
        "ontem" | "yesterday" => Some(DateChoice::Yesterday),
        "data personalizada" | "custom date" => Some(DateChoice::Custom),
        _ => None,
    }
}

pub fn date_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::single_row(&[LABEL_TODAY, LABEL_YESTERDAY, LABEL_CUSTOM_DATE])
}

pub fn category_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::pairs(&Category::labels())
}

/// Per-user expense dialogue driver.
pub struct ConversationMachine {
    store: Box<dyn StateStore>,
    writer: Arc<dyn ExpenseWriter>,
    clock: Arc<dyn Clock>,
}

impl ConversationMachine {
    pub fn new(
        store: Box<dyn StateStore>,
        writer: Arc<dyn ExpenseWriter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            writer,
            clock,
        }
    }

    pub fn is_active(&self, user_id: UserId) -> bool {
        self.store.get(user_id).is_some()
    }

    /// Begin a new dialogue, discarding any unfinished one.
    pub fn start(&mut self, user_id: UserId) -> Reply {
        tracing::info!(user = %user_id, "starting expense conversation");
        self.store.set(ConversationState::new(user_id));
        Reply::text(PROMPT_DESCRIPTION)
    }

    pub fn cancel(&mut self, user_id: UserId) -> Reply {
        if self.store.delete(user_id).is_some() {
            tracing::info!(user = %user_id, "conversation cancelled");
        }
        Reply::text(CANCELLED)
    }

    /// Feed one answer. `None` when the user has no dialogue in progress.
    pub async fn submit(&mut self, user_id: UserId, text: &str) -> Option<Reply> {
        let mut st = self.store.get(user_id)?;
        tracing::debug!(user = %user_id, stage = ?st.stage, "answer received");

        let reply = match st.stage {
            Stage::AwaitingDescription => {
                st.description = Some(text.to_string());
                st.stage = Stage::AwaitingAmount;
                Reply::text(PROMPT_AMOUNT)
            }
            Stage::AwaitingAmount => {
                st.amount_raw = Some(text.to_string());
                st.stage = Stage::AwaitingDate;
                Reply::with_keyboard(PROMPT_DATE, date_keyboard())
            }
            Stage::AwaitingDate => {
                let today = self.clock.today();
                let resolved = match date_choice(text) {
                    Some(DateChoice::Today) => Some(today),
                    Some(DateChoice::Yesterday) => today.checked_sub_days(Days::new(1)),
                    Some(DateChoice::Custom) => {
                        st.stage = Stage::AwaitingCustomDate;
                        self.store.set(st);
                        return Some(Reply::text(PROMPT_CUSTOM_DATE));
                    }
                    None => None,
                };
                st.date_text = Some(match resolved {
                    Some(d) => d.format(DATE_FORMAT).to_string(),
                    // Anything else is taken as a typed date; checked on write.
                    None => text.to_string(),
                });
                st.stage = Stage::AwaitingCategory;
                Reply::with_keyboard(PROMPT_CATEGORY, category_keyboard())
            }
            Stage::AwaitingCustomDate => {
                st.date_text = Some(text.to_string());
                st.stage = Stage::AwaitingCategory;
                Reply::with_keyboard(PROMPT_CATEGORY, category_keyboard())
            }
            Stage::AwaitingCategory => {
                st.category = Some(text.to_string());
                st.stage = Stage::Done;
                return Some(self.finish(st).await);
            }
            Stage::Done => {
                self.store.delete(user_id);
                return None;
            }
        };

        self.store.set(st);
        Some(reply)
    }

    async fn finish(&mut self, st: ConversationState) -> Reply {
        // State goes away whatever the write outcome is.
        self.store.delete(st.user_id);

        let Some(record) = st.to_record() else {
            tracing::warn!(user = %st.user_id, "incomplete conversation reached the final step");
            return Reply::text("❌ Erro ao salvar gasto: dados incompletos.");
        };

        match self.writer.write(&record).await {
            Ok(receipt) => Reply::text(format!(
                "✅ Gasto registrado com sucesso!\n\n\
                 📝 Item: {}\n\
                 💵 Valor: {}\n\
                 📅 Data: {}\n\
                 📂 Categoria: {}\n\n\
                 📄 Aba {}, linha {}",
                record.description,
                receipt.amount_display,
                record.date_text,
                record.category,
                receipt.tab,
                receipt.row
            )),
            Err(e) => {
                tracing::error!(user = %st.user_id, error = %e, "failed to save expense");
                Reply::text(e.user_message())
            }
        }
    }
}
