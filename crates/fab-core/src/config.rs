use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub telegram_bot_token: String,
    pub spreadsheet_id: String,
    pub google_credentials: String,

    // Polling
    pub poll_timeout: Duration,
    pub poll_error_backoff: Duration,

    // Outbound HTTP
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env, map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required
        let telegram_bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;
        let spreadsheet_id = get("SHEET_ID")
            .ok_or_else(|| Error::Config("SHEET_ID environment variable is required".to_string()))?;
        let google_credentials = get("GOOGLE_CREDENTIALS").ok_or_else(|| {
            Error::Config("GOOGLE_CREDENTIALS environment variable is required".to_string())
        })?;
        if serde_json::from_str::<serde_json::Value>(&google_credentials).is_err() {
            return Err(Error::Config(
                "GOOGLE_CREDENTIALS must contain the service account JSON".to_string(),
            ));
        }

        // Timeouts
        let poll_timeout = Duration::from_secs(parse_u64(get("POLL_TIMEOUT_SECS")).unwrap_or(30));
        let poll_error_backoff =
            Duration::from_millis(parse_u64(get("POLL_ERROR_BACKOFF_MS")).unwrap_or(1000));
        let http_timeout = Duration::from_secs(parse_u64(get("HTTP_TIMEOUT_SECS")).unwrap_or(10));

        Ok(Self {
            telegram_bot_token,
            spreadsheet_id,
            google_credentials,
            poll_timeout,
            poll_error_backoff,
            http_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const CREDS: &str = r#"{"client_email":"bot@example.iam.gserviceaccount.com"}"#;

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("SHEET_ID", "sheet"),
            ("GOOGLE_CREDENTIALS", CREDS),
        ]))
        .unwrap();

        assert_eq!(cfg.telegram_bot_token, "123:abc");
        assert_eq!(cfg.spreadsheet_id, "sheet");
        assert_eq!(cfg.poll_timeout, Duration::from_secs(30));
        assert_eq!(cfg.poll_error_backoff, Duration::from_millis(1000));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn falls_back_to_telegram_bot_token() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("SHEET_ID", "sheet"),
            ("GOOGLE_CREDENTIALS", CREDS),
            ("POLL_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(cfg.telegram_bot_token, "t");
        assert_eq!(cfg.poll_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = Config::from_lookup(lookup(&[("SHEET_ID", "s"), ("GOOGLE_CREDENTIALS", CREDS)]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("BOT_TOKEN")));

        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("GOOGLE_CREDENTIALS", CREDS)]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("SHEET_ID")));

        let err = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("SHEET_ID", "s"),
            ("GOOGLE_CREDENTIALS", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("GOOGLE_CREDENTIALS")));
    }

    #[test]
    fn rejects_credentials_that_are_not_json() {
        let err = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("SHEET_ID", "s"),
            ("GOOGLE_CREDENTIALS", "not json"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv("# comment\nBOT_TOKEN=\"abc\"\n\nSHEET_ID = 'x'\nbroken\n");
        assert_eq!(
            parsed,
            vec![
                ("BOT_TOKEN".to_string(), "abc".to_string()),
                ("SHEET_ID".to_string(), "x".to_string()),
            ]
        );
    }
}
