//! Hand-written test doubles for the core ports.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    amount::{format_brl, normalize_amount, AmountInput},
    conversation::Clock,
    domain::{ChatId, ExpenseRecord, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InboundUpdate, MessagingCapabilities, ReplyKeyboard},
    },
    store::{CellWrite, TabHandle, TabularStore},
    writer::{ExpenseWriter, WriteReceipt, WriteResult},
    Result,
};

pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn ymd(y: i32, m: u32, d: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Workbook kept in memory; cells keyed by (row, column).
#[derive(Default)]
pub struct MemoryStore {
    tabs: Mutex<BTreeMap<String, BTreeMap<(u32, u32), String>>>,
    batches: Mutex<Vec<Vec<CellWrite>>>,
    row_reads: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_tabs(names: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut tabs = store.tabs.lock().unwrap();
            for n in names {
                tabs.insert(n.to_string(), BTreeMap::new());
            }
        }
        store
    }

    pub fn set(&self, tab: &str, row: u32, column: u32, value: &str) {
        self.tabs
            .lock()
            .unwrap()
            .get_mut(tab)
            .expect("tab exists")
            .insert((row, column), value.to_string());
    }

    pub fn get(&self, tab: &str, row: u32, column: u32) -> Option<String> {
        self.tabs.lock().unwrap().get(tab)?.get(&(row, column)).cloned()
    }

    pub fn batches(&self) -> Vec<Vec<CellWrite>> {
        self.batches.lock().unwrap().clone()
    }

    /// Number of `rows_values` calls served.
    pub fn row_reads(&self) -> usize {
        *self.row_reads.lock().unwrap()
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn open_tab(&self, name: &str) -> Result<TabHandle> {
        let tabs = self.tabs.lock().unwrap();
        if tabs.contains_key(name) {
            return Ok(TabHandle {
                name: name.to_string(),
            });
        }
        Err(Error::TabNotFound {
            tab: name.to_string(),
            available: tabs.keys().cloned().collect(),
        })
    }

    async fn column_values(&self, tab: &TabHandle, column: u32) -> Result<Vec<String>> {
        let tabs = self.tabs.lock().unwrap();
        let cells = tabs.get(&tab.name).ok_or_else(|| Error::Store("gone".into()))?;
        let last = cells
            .keys()
            .filter(|(_, c)| *c == column)
            .map(|(r, _)| *r)
            .max()
            .unwrap_or(0);
        Ok((1..=last)
            .map(|r| cells.get(&(r, column)).cloned().unwrap_or_default())
            .collect())
    }

    async fn rows_values(
        &self,
        tab: &TabHandle,
        first: u32,
        last: u32,
    ) -> Result<Vec<Vec<String>>> {
        *self.row_reads.lock().unwrap() += 1;
        let tabs = self.tabs.lock().unwrap();
        let cells = tabs.get(&tab.name).ok_or_else(|| Error::Store("gone".into()))?;
        Ok((first..=last)
            .map(|row| {
                let width = cells
                    .keys()
                    .filter(|(r, _)| *r == row)
                    .map(|(_, c)| *c)
                    .max()
                    .unwrap_or(0);
                (1..=width)
                    .map(|c| cells.get(&(row, c)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect())
    }

    async fn batch_write(&self, cells: &[CellWrite]) -> Result<()> {
        let mut tabs = self.tabs.lock().unwrap();
        if let Some(c) = cells.iter().find(|c| !tabs.contains_key(&c.tab)) {
            return Err(Error::Store(format!("unknown tab {}", c.tab)));
        }
        for c in cells {
            if let Some(t) = tabs.get_mut(&c.tab) {
                t.insert((c.row, c.column), c.value.clone());
            }
        }
        self.batches.lock().unwrap().push(cells.to_vec());
        Ok(())
    }
}

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

/// Writer that records every call; succeeds unless built with `failing`.
#[derive(Default)]
pub struct RecordingWriter {
    records: Mutex<Vec<ExpenseRecord>>,
    fail_with: Option<ErrorFactory>,
}

impl RecordingWriter {
    pub fn failing(f: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_with: Some(Box::new(f)),
        }
    }

    pub fn records(&self) -> Vec<ExpenseRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExpenseWriter for RecordingWriter {
    async fn write(&self, record: &ExpenseRecord) -> WriteResult {
        self.records.lock().unwrap().push(record.clone());
        if let Some(f) = &self.fail_with {
            return Err(f());
        }
        let amount = normalize_amount(&AmountInput::from(record.amount_raw.as_str()))?;
        Ok(WriteReceipt {
            tab: "test".to_string(),
            row: 14,
            amount,
            amount_display: format_brl(amount),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

/// Messenger serving scripted update batches and recording sends.
pub struct FakeMessenger {
    pub supports_reply_keyboards: bool,
    batches: Mutex<VecDeque<Result<Vec<InboundUpdate>>>>,
    cursors: Mutex<Vec<Option<i64>>>,
    sent: Mutex<Vec<SentMessage>>,
    next_id: Mutex<i32>,
}

impl Default for FakeMessenger {
    fn default() -> Self {
        Self {
            supports_reply_keyboards: true,
            batches: Mutex::new(VecDeque::new()),
            cursors: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }
}

impl FakeMessenger {
    /// A transport that cannot render reply keyboards.
    pub fn without_reply_keyboards() -> Self {
        Self {
            supports_reply_keyboards: false,
            ..Self::default()
        }
    }

    pub fn push_batch(&self, updates: Vec<InboundUpdate>) {
        self.batches.lock().unwrap().push_back(Ok(updates));
    }

    pub fn push_error(&self, err: Error) {
        self.batches.lock().unwrap().push_back(Err(err));
    }

    pub fn cursors(&self) -> Vec<Option<i64>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_reply_keyboards: self.supports_reply_keyboards,
            max_message_len: 4096,
        }
    }

    async fn fetch_updates(
        &self,
        cursor: Option<i64>,
        _timeout: Duration,
    ) -> Result<Vec<InboundUpdate>> {
        self.cursors.lock().unwrap().push(cursor);
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> Result<MessageRef> {
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        let mut id = self.next_id.lock().unwrap();
        let message_id = MessageId(*id);
        *id += 1;
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }
}
