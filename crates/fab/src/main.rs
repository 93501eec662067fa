use std::sync::Arc;

use fab_core::{config::Config, writer::SheetWriter};
use fab_sheets::GoogleSheetsStore;

#[tokio::main]
async fn main() -> Result<(), fab_core::Error> {
    fab_core::logging::init("fab")?;

    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(GoogleSheetsStore::new(
        cfg.spreadsheet_id.clone(),
        &cfg.google_credentials,
        cfg.http_timeout,
    )?);
    let writer = Arc::new(SheetWriter::new(store));
    tracing::info!(spreadsheet = %cfg.spreadsheet_id, "writing expenses to spreadsheet");

    fab_telegram::router::run_polling(cfg, writer)
        .await
        .map_err(|e| fab_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
