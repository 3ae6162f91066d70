//! Google Sheets implementation of the mirror
//!
//! Talks to the Sheets REST API v4 with `ureq`. Authentication uses the
//! service-account JWT bearer flow: a short-lived assertion signed RS256 is
//! exchanged for an access token, which is cached until shortly before it
//! expires. All HTTP calls are blocking and run on the blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};
use ureq::Agent;

use super::{HEADER, SheetMirror};
use crate::config::MirrorConfig;
use crate::errors::{Result, SheetlinkerError};
use crate::storage::MirrorRow;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Assertion lifetime accepted by Google (max 1 hour)
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh the access token this long before it expires
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The subset of a service-account JSON key we need.
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

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(SheetlinkerError::mirror_config(
                "service-account key is missing client_email or private_key",
            ));
        }
        Ok(key)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| SheetlinkerError::mirror_config(format!("invalid base64 credentials: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| SheetlinkerError::mirror_config(format!("credentials are not UTF-8: {}", e)))?;
        Self::from_json(&json)
    }

    /// Load the key from `credentials_file`, falling back to the base64 env var.
    pub fn load(config: &MirrorConfig) -> Result<Option<Self>> {
        if let Some(path) = config.credentials_file.as_deref().filter(|p| !p.is_empty()) {
            let json = std::fs::read_to_string(path)?;
            return Self::from_json(&json).map(Some);
        }

        match std::env::var(&config.credentials_env) {
            Ok(encoded) if !encoded.trim().is_empty() => Self::from_base64(&encoded).map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

struct Inner {
    agent: Agent,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    worksheet: String,
    token: Mutex<Option<CachedToken>>,
}

/// Google Sheets worksheet addressed by spreadsheet id + tab name.
#[derive(Clone)]
pub struct GoogleSheet {
    inner: Arc<Inner>,
}

impl GoogleSheet {
    pub fn new(config: &MirrorConfig, key: ServiceAccountKey) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.request_timeout_secs.max(1))))
            .build()
            .into();

        Self {
            inner: Arc::new(Inner {
                agent,
                key,
                spreadsheet_id: config.spreadsheet_id.clone(),
                worksheet: config.worksheet.clone(),
                token: Mutex::new(None),
            }),
        }
    }

    /// Run a blocking Sheets call on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || op(inner.as_ref()))
            .await
            .map_err(|e| SheetlinkerError::mirror_unavailable(format!("sheet task failed: {}", e)))?
    }
}

impl Inner {
    fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock();
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_TTL_SECS,
        };
        let signing_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &signing_key,
        )?;

        let response: TokenResponse = self
            .agent
            .post(&self.key.token_uri)
            .send_form([("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])?
            .into_body()
            .read_json()?;

        let lifetime = Duration::from_secs(response.expires_in.max(120));
        debug!("Obtained Sheets access token valid for {:?}", lifetime);

        *cached = Some(CachedToken {
            value: response.access_token.clone(),
            refresh_at: Instant::now() + lifetime - TOKEN_REFRESH_MARGIN,
        });
        Ok(response.access_token)
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        let quoted = format!("'{}'!{}", self.worksheet.replace('\'', "''"), range);
        format!(
            "{}/{}/values/{}{}",
            SHEETS_API,
            self.spreadsheet_id,
            urlencoding::encode(&quoted),
            suffix
        )
    }

    fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "");
        trace!("GET {}", url);
        let body: ValueRange = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token()?))
            .call()?
            .into_body()
            .read_json()?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    fn put_values(&self, range: &str, values: serde_json::Value) -> Result<()> {
        let url = self.values_url(range, "?valueInputOption=RAW");
        trace!("PUT {}", url);
        self.agent
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.access_token()?))
            .send_json(json!({ "majorDimension": "ROWS", "values": values }))?;
        Ok(())
    }

    fn append_values(&self, values: serde_json::Value) -> Result<()> {
        let url = self.values_url(
            "A:C",
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        trace!("POST {}", url);
        self.agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token()?))
            .send_json(json!({ "majorDimension": "ROWS", "values": values }))?;
        Ok(())
    }

    fn clear_values(&self) -> Result<()> {
        let url = self.values_url("A:Z", ":clear");
        trace!("POST {}", url);
        self.agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token()?))
            .send_json(json!({}))?;
        Ok(())
    }
}

/// Cell values come back as strings for formatted output, but numbers and
/// booleans are accepted too.
fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn row_json(values: &MirrorRow) -> serde_json::Value {
    json!([[values.short_code, values.original_url, values.clicks]])
}

#[async_trait]
impl SheetMirror for GoogleSheet {
    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        let range = format!("A{}:C{}", row, row);
        self.blocking(move |inner| {
            Ok(inner.get_values(&range)?.into_iter().next().unwrap_or_default())
        })
        .await
    }

    async fn find_rows(&self, short_code: &str) -> Result<Vec<usize>> {
        let code = short_code.to_string();
        self.blocking(move |inner| {
            let column = inner.get_values("A:A")?;
            Ok(column
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(_, cells)| cells.first().is_some_and(|c| *c == code))
                .map(|(idx, _)| idx + 1)
                .collect())
        })
        .await
    }

    async fn update_row(&self, row: usize, values: &MirrorRow) -> Result<()> {
        let range = format!("A{}:C{}", row, row);
        let body = row_json(values);
        self.blocking(move |inner| inner.put_values(&range, body)).await
    }

    async fn append_row(&self, values: &MirrorRow) -> Result<()> {
        let body = row_json(values);
        self.blocking(move |inner| inner.append_values(body)).await
    }

    async fn append_header(&self) -> Result<()> {
        self.blocking(|inner| inner.append_values(json!([HEADER]))).await
    }

    async fn clear(&self) -> Result<()> {
        self.blocking(|inner| inner.clear_values()).await
    }

    fn name(&self) -> &'static str {
        "google-sheets"
    }
}
