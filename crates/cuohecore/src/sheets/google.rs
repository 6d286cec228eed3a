//! Google Sheets backend.
//!
//! Auth is the OAuth2 JWT-bearer grant for a service account. The credential is
//! decoded in memory from base64 and never touches the disk.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex, OnceCell};

use super::{SheetStore, Worksheet};
use crate::config;
use crate::error::{AppError, AppResult};

/// The fields of a service-account JSON key that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_base64(encoded: &str) -> AppResult<Self> {
        let bytes = STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;
}

/// A fixed bearer token, for pre-issued tokens and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> AppResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges signed assertions for access tokens and caches them until shortly before expiry.
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(config::sheets::DEFAULT_TOKEN_URI)
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: config::sheets::SCOPES,
            aud: self.token_uri(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    async fn fetch(&self) -> AppResult<CachedToken> {
        let now = Utc::now();
        let assertion = self.signed_assertion(now)?;

        let response = self
            .http
            .post(self.token_uri())
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }

        let body: TokenResponse = response.json().await?;
        log::debug!("Fetched Google access token, valid for {}s", body.expires_in);
        Ok(CachedToken {
            token: body.access_token,
            expires_at: now + ChronoDuration::seconds(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        let margin = ChronoDuration::seconds(config::sheets::TOKEN_REFRESH_MARGIN_SECS);

        if let Some(token) = cached.as_ref() {
            if token.expires_at - margin > Utc::now() {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// How the spreadsheet is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpreadsheetRef {
    Id(String),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

pub struct GoogleSheets {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    spreadsheet: SpreadsheetRef,
    resolved_id: OnceCell<String>,
    sheets_base: String,
    drive_base: String,
}

impl GoogleSheets {
    pub fn new(http: reqwest::Client, tokens: Arc<dyn TokenSource>, spreadsheet: SpreadsheetRef) -> Self {
        Self {
            http,
            tokens,
            spreadsheet,
            resolved_id: OnceCell::new(),
            sheets_base: config::sheets::SHEETS_API_BASE.to_string(),
            drive_base: config::sheets::DRIVE_API_BASE.to_string(),
        }
    }

    /// Points the client at other API hosts (emulators, mock servers).
    pub fn with_endpoints(mut self, sheets_base: impl Into<String>, drive_base: impl Into<String>) -> Self {
        self.sheets_base = sheets_base.into().trim_end_matches('/').to_string();
        self.drive_base = drive_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Backend for the configured spreadsheet using a base64 service-account key.
    pub fn from_service_account(encoded_key: &str) -> AppResult<Self> {
        let key = ServiceAccountKey::from_base64(encoded_key)?;
        log::info!("Google service account: {}", key.client_email);

        let http = reqwest::Client::builder().timeout(config::network::timeout()).build()?;
        let tokens = Arc::new(ServiceAccountTokens::new(key, http.clone()));
        let spreadsheet = match config::sheets::ID.as_ref() {
            Some(id) => SpreadsheetRef::Id(id.clone()),
            None => SpreadsheetRef::Name(config::sheets::NAME.clone()),
        };
        Ok(Self::new(http, tokens, spreadsheet))
    }

    /// Spreadsheet id, looked up by name through Drive on first use.
    pub async fn spreadsheet_id(&self) -> AppResult<&str> {
        let id = self
            .resolved_id
            .get_or_try_init(|| async {
                match &self.spreadsheet {
                    SpreadsheetRef::Id(id) => Ok(id.clone()),
                    SpreadsheetRef::Name(name) => self.find_by_name(name).await,
                }
            })
            .await?;
        Ok(id.as_str())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<String> {
        let token = self.tokens.access_token().await?;
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );

        let response = self
            .http
            .get(format!("{}/drive/v3/files", self.drive_base))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }

        let list: DriveFileList = response.json().await?;
        let file = list
            .files
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Sheets(format!("spreadsheet '{}' not found or not shared", name)))?;
        log::info!("Resolved spreadsheet '{}' to {}", name, file.id);
        Ok(file.id)
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn append_row(&self, sheet: Worksheet, cells: Vec<String>) -> AppResult<()> {
        let spreadsheet_id = self.spreadsheet_id().await?;
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v4/spreadsheets/{}/values/{}!A1:append",
                self.sheets_base, spreadsheet_id, sheet
            ))
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [cells] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_response(response).await);
        }
        Ok(())
    }
}
