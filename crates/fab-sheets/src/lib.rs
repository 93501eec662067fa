//! Google Sheets adapter.
//!
//! Implements the `fab-core` TabularStore port over the Sheets v4 REST API,
//! authenticating as a service account.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use fab_core::{
    errors::Error,
    store::{CellWrite, TabHandle, TabularStore},
    Result,
};

pub mod a1;
pub mod auth;

use auth::{ServiceAccountAuth, ServiceAccountKey};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Every line of a ranged read as strings; numbers and bools rendered as text.
fn lines(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .into_iter()
        .map(|line| line.into_iter().map(cell_text).collect())
        .collect()
}

fn first_line(range: ValueRange) -> Vec<String> {
    lines(range).into_iter().next().unwrap_or_default()
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

fn batch_update_body(cells: &[CellWrite]) -> Value {
    let data: Vec<Value> = cells
        .iter()
        .map(|c| {
            json!({
                "range": a1::cell(&c.tab, c.row, c.column),
                "values": [[c.value]],
            })
        })
        .collect();
    json!({
        "valueInputOption": "USER_ENTERED",
        "data": data,
    })
}

pub struct GoogleSheetsStore {
    spreadsheet_id: String,
    http: reqwest::Client,
    auth: ServiceAccountAuth,
}

impl GoogleSheetsStore {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        credentials_json: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build failed: {e}")))?;
        let key = ServiceAccountKey::from_json(credentials_json)?;
        let auth = ServiceAccountAuth::new(key, http.clone())?;
        tracing::info!(account = %auth.client_email(), "google sheets store ready");

        Ok(Self {
            spreadsheet_id: spreadsheet_id.into(),
            http,
            auth,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API)
            .map_err(|e| Error::External(format!("bad sheets url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::External("bad sheets url".to_string()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Store(format!("sheets request error: {e}")))?;
        let body = Self::check(resp)
            .await?
            .bytes()
            .await
            .map_err(|e| Error::Store(format!("sheets response error: {e}")))?;
        decode(&body)
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(Error::Store(format!(
            "sheets request failed: {status} {}",
            body.chars().take(200).collect::<String>()
        )))
    }

    pub async fn tab_titles(&self) -> Result<Vec<String>> {
        let meta: SpreadsheetMeta = self
            .get_json(self.url(&[])?, &[("fields", "sheets.properties.title")])
            .await?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    async fn read_range(&self, range: &str, major_dimension: &str) -> Result<ValueRange> {
        self.get_json(
            self.url(&["values", range])?,
            &[("majorDimension", major_dimension)],
        )
        .await
    }
}

#[async_trait]
impl TabularStore for GoogleSheetsStore {
    async fn open_tab(&self, name: &str) -> Result<TabHandle> {
        let available = self.tab_titles().await?;
        if available.iter().any(|t| t == name) {
            return Ok(TabHandle {
                name: name.to_string(),
            });
        }
        Err(Error::TabNotFound {
            tab: name.to_string(),
            available,
        })
    }

    async fn column_values(&self, tab: &TabHandle, column: u32) -> Result<Vec<String>> {
        let vr = self
            .read_range(&a1::whole_column(&tab.name, column), "COLUMNS")
            .await?;
        Ok(first_line(vr))
    }

    async fn rows_values(
        &self,
        tab: &TabHandle,
        first: u32,
        last: u32,
    ) -> Result<Vec<Vec<String>>> {
        let vr = self
            .read_range(&a1::row_span(&tab.name, first, last), "ROWS")
            .await?;
        Ok(lines(vr))
    }

    async fn batch_write(&self, cells: &[CellWrite]) -> Result<()> {
        if cells.is_empty() {
            return Ok(());
        }
        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(self.url(&["values:batchUpdate"])?)
            .bearer_auth(token)
            .json(&batch_update_body(cells))
            .send()
            .await
            .map_err(|e| Error::Store(format!("sheets request error: {e}")))?;
        Self::check(resp).await?;
        Ok(())
    }
}
