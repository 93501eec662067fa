//! Appends finished expense records to the month tab of the workbook.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{
    amount::{format_brl, normalize_amount, AmountInput},
    domain::ExpenseRecord,
    errors::Error,
    store::{CellWrite, TabHandle, TabularStore},
    Result,
};

pub const HEADER_MARKER: &str = "nome da divida";
pub const HEADER_SCAN_FIRST: u32 = 8;
pub const HEADER_SCAN_LAST: u32 = 25;
pub const DEFAULT_HEADER_ROW: u32 = 13;
pub const MIN_DATA_ROW: u32 = 14;

pub const COL_DESCRIPTION: u32 = 16; // P
pub const COL_DATE: u32 = 17; // Q
pub const COL_CATEGORY: u32 = 18; // R
pub const COL_AMOUNT: u32 = 19; // S

/// Where the header row of a tab was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderRow {
    Found(u32),
    /// No marker in the scanned range; the layout's usual row is assumed.
    Defaulted,
}

impl HeaderRow {
    pub fn row(self) -> u32 {
        match self {
            HeaderRow::Found(r) => r,
            HeaderRow::Defaulted => DEFAULT_HEADER_ROW,
        }
    }
}

/// Confirmation of a successful write.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteReceipt {
    pub tab: String,
    pub row: u32,
    pub amount: f64,
    pub amount_display: String,
}

pub type WriteResult = Result<WriteReceipt>;

/// Destination for finished expense records.
#[async_trait]
pub trait ExpenseWriter: Send + Sync {
    async fn write(&self, record: &ExpenseRecord) -> WriteResult;
}

/// `DD/MM/YYYY` -> date.
pub fn parse_record_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").map_err(|_| Error::DateFormat {
        input: text.to_string(),
    })
}

/// Month tab for a date: `MM-YYYY`.
pub fn tab_name_for(date: NaiveDate) -> String {
    date.format("%m-%Y").to_string()
}

/// Lowercase with diacritics removed (`Dívida` -> `divida`).
pub fn fold_text(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// First row to write: past the header, never above the data area, and
/// below everything already in the amount column.
pub fn next_free_row(header: HeaderRow, amount_column_len: usize) -> u32 {
    let start = MIN_DATA_ROW.max(header.row() + 1);
    let after_last = u32::try_from(amount_column_len)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1);
    start.max(after_last)
}

#[derive(Default)]
struct TabLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TabLocks {
    async fn lock_tab(&self, tab: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(tab.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Record writer over a [`TabularStore`].
///
/// Writing the same record twice appends two rows; there is no deduplication.
pub struct SheetWriter {
    store: Arc<dyn TabularStore>,
    tab_locks: TabLocks,
}

impl SheetWriter {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self {
            store,
            tab_locks: TabLocks::default(),
        }
    }

    /// Scans the header band with a single ranged read.
    pub async fn find_header_row(&self, tab: &TabHandle) -> Result<HeaderRow> {
        let rows = self
            .store
            .rows_values(tab, HEADER_SCAN_FIRST, HEADER_SCAN_LAST)
            .await?;
        let found = (HEADER_SCAN_FIRST..=HEADER_SCAN_LAST)
            .zip(rows.iter())
            .find(|(_, cells)| cells.iter().any(|c| fold_text(c).contains(HEADER_MARKER)))
            .map(|(row, _)| row);
        Ok(found.map_or(HeaderRow::Defaulted, HeaderRow::Found))
    }
}

#[async_trait]
impl ExpenseWriter for SheetWriter {
    async fn write(&self, record: &ExpenseRecord) -> WriteResult {
        let date = parse_record_date(&record.date_text)?;
        let tab_name = tab_name_for(date);
        let tab = self.store.open_tab(&tab_name).await?;

        // Amount is validated before touching the row layout.
        let amount = normalize_amount(&AmountInput::from(record.amount_raw.as_str()))?;
        let amount_display = format_brl(amount);

        // Next-row lookup and the batch must not interleave for one tab.
        let _guard = self.tab_locks.lock_tab(&tab.name).await;

        let header = self.find_header_row(&tab).await?;
        if header == HeaderRow::Defaulted {
            tracing::debug!(tab = %tab.name, "header marker not found, assuming default row");
        }
        let amount_len = self.store.column_values(&tab, COL_AMOUNT).await?.len();
        let row = next_free_row(header, amount_len);

        let cell = |column: u32, value: &str| CellWrite {
            tab: tab.name.clone(),
            row,
            column,
            value: value.to_string(),
        };
        let cells = [
            cell(COL_DESCRIPTION, &record.description),
            cell(COL_DATE, &record.date_text),
            cell(COL_CATEGORY, &record.category),
            cell(COL_AMOUNT, &amount_display),
        ];
        self.store.batch_write(&cells).await?;

        tracing::info!(
            tab = %tab.name,
            row,
            description = %record.description,
            amount = %amount_display,
            category = %record.category,
            "expense saved"
        );

        Ok(WriteReceipt {
            tab: tab.name,
            row,
            amount,
            amount_display,
        })
    }
}
