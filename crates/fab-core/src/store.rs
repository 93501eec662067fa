use async_trait::async_trait;

use crate::Result;

/// An opened tab of the workbook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabHandle {
    pub name: String,
}

/// One cell write, addressed by tab and 1-indexed row/column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellWrite {
    pub tab: String,
    pub row: u32,
    pub column: u32,
    pub value: String,
}

/// Hexagonal port for the spreadsheet holding the expense tabs.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Open a tab by name; `Error::TabNotFound` (with the existing names) if absent.
    async fn open_tab(&self, name: &str) -> Result<TabHandle>;

    /// Values of a column from row 1 down to its last populated cell.
    async fn column_values(&self, tab: &TabHandle, column: u32) -> Result<Vec<String>>;

    /// Rows `first..=last` in one read, each from column 1 to its last
    /// populated cell. Trailing empty rows may be omitted.
    async fn rows_values(
        &self,
        tab: &TabHandle,
        first: u32,
        last: u32,
    ) -> Result<Vec<Vec<String>>>;

    /// Apply all writes or none.
    async fn batch_write(&self, cells: &[CellWrite]) -> Result<()>;
}
