/// Core error type for the finance assistant.
///
/// Adapter crates map their specific errors into this type so the assistant
/// can handle failures consistently (user-facing message vs logged and skipped).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("tab '{tab}' not found; available tabs: {}", .available.join(", "))]
    TabNotFound { tab: String, available: Vec<String> },

    #[error("invalid date '{input}': expected DD/MM/YYYY")]
    DateFormat { input: String },

    #[error("invalid amount '{input}'")]
    AmountFormat { input: String },

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Text shown to the user when saving an expense fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::TabNotFound { tab, available } => format!(
                "❌ Aba '{tab}' não encontrada! Abas disponíveis: {}",
                available.join(", ")
            ),
            other => format!("❌ Erro ao salvar gasto: {other}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
