//! Service-account OAuth: a signed JWT exchanged for a short-lived access token.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use fab_core::{errors::Error, Result};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
// Refresh this long before the token actually expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Fields of the service-account key JSON that signing needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid GOOGLE_CREDENTIALS: {e}")))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

fn claims_for(key: &ServiceAccountKey, now_secs: u64) -> Claims {
    Claims {
        iss: key.client_email.clone(),
        scope: SHEETS_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now_secs,
        exp: now_secs + TOKEN_LIFETIME.as_secs(),
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("invalid service account private key: {e}")))?;
        Ok(Self {
            key,
            encoding_key,
            http,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Current access token, fetching a new one when close to expiry.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = now_secs();
        if let Some(tok) = cached.as_ref() {
            if now + REFRESH_MARGIN.as_secs() < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }

        let fresh = self.fetch_token(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch_token(&self, now: u64) -> Result<CachedToken> {
        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &claims_for(&self.key, now),
            &self.encoding_key,
        )
        .map_err(|e| Error::External(format!("jwt signing failed: {e}")))?;

        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Store(format!("token request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "token request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Store(format!("token response error: {e}")))?;
        let tok: TokenResponse = serde_json::from_slice(&body)?;

        tracing::debug!(account = %self.key.client_email, "obtained sheets access token");
        Ok(CachedToken {
            value: tok.access_token,
            expires_at: now + tok.expires_in.unwrap_or(TOKEN_LIFETIME.as_secs()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_json_with_default_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"type":"service_account","client_email":"bot@p.iam.gserviceaccount.com","private_key":"k"}"#,
        )
        .unwrap();
        assert_eq!(key.client_email, "bot@p.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(!format!("{key:?}").contains("private_key"));
    }

    #[test]
    fn missing_fields_are_config_errors() {
        let err = ServiceAccountKey::from_json(r#"{"client_email":"x"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_private_key_is_rejected_up_front() {
        let key = ServiceAccountKey {
            client_email: "x".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        };
        let err = ServiceAccountAuth::new(key, reqwest::Client::new()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn claims_cover_one_hour() {
        let key = ServiceAccountKey {
            client_email: "bot@x".to_string(),
            private_key: String::new(),
            token_uri: "https://token".to_string(),
        };
        let c = claims_for(&key, 1_000);
        assert_eq!(
            c,
            Claims {
                iss: "bot@x".to_string(),
                scope: SHEETS_SCOPE.to_string(),
                aud: "https://token".to_string(),
                iat: 1_000,
                exp: 4_600,
            }
        );
    }
}
