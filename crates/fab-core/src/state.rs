use std::collections::HashMap;

use crate::domain::{ExpenseRecord, UserId};

/// Position within the expense dialogue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    AwaitingDescription,
    AwaitingAmount,
    AwaitingDate,
    AwaitingCustomDate,
    AwaitingCategory,
    Done,
}

/// One user's in-progress expense dialogue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    pub user_id: UserId,
    pub stage: Stage,
    pub description: Option<String>,
    pub amount_raw: Option<String>,
    pub date_text: Option<String>,
    pub category: Option<String>,
}

impl ConversationState {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            stage: Stage::AwaitingDescription,
            description: None,
            amount_raw: None,
            date_text: None,
            category: None,
        }
    }

    /// The finished record, once every field is filled in.
    pub fn to_record(&self) -> Option<ExpenseRecord> {
        Some(ExpenseRecord {
            description: self.description.clone()?,
            amount_raw: self.amount_raw.clone()?,
            date_text: self.date_text.clone()?,
            category: self.category.clone()?,
        })
    }
}

/// Per-user conversation storage, keyed by user id.
pub trait StateStore: Send {
    fn get(&self, user_id: UserId) -> Option<ConversationState>;
    fn set(&mut self, state: ConversationState);
    fn delete(&mut self, user_id: UserId) -> Option<ConversationState>;
}

/// Process-memory store. Entries never expire.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: HashMap<UserId, ConversationState>,
}

impl InMemoryStateStore {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, user_id: UserId) -> Option<ConversationState> {
        self.states.get(&user_id).cloned()
    }

    fn set(&mut self, state: ConversationState) {
        self.states.insert(state.user_id, state);
    }

    fn delete(&mut self, user_id: UserId) -> Option<ConversationState> {
        self.states.remove(&user_id)
    }
}
