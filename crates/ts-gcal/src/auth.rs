//! Cached OAuth tokens and their renewal.
//!
//! The token set is the one written by Google's installed-app flow
//! (`token.json`); client credentials come from the console download
//! (`credentials.json`). Renewal uses the `refresh_token` grant only.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GcalError;

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Tokens expiring within this window are renewed before use.
const EXPIRY_SKEW_MS: i64 = 60_000;

/// OAuth client id and secret for the installed application.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl OAuthCredentials {
    /// Reads a client secret file. Both `installed` and `web` clients are
    /// accepted.
    pub fn load(path: &Path) -> Result<Self, GcalError> {
        #[derive(Deserialize)]
        struct CredentialsFile {
            installed: Option<OAuthCredentials>,
            web: Option<OAuthCredentials>,
        }

        let content = std::fs::read_to_string(path).map_err(|source| GcalError::Credentials {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CredentialsFile = serde_json::from_str(&content).map_err(|err| GcalError::Auth {
            message: format!("invalid credentials file {}: {err}", path.display()),
        })?;
        file.installed.or(file.web).ok_or_else(|| GcalError::Auth {
            message: format!(
                "{} has neither an `installed` nor a `web` client",
                path.display()
            ),
        })
    }
}

/// Token set as stored in `token.json`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
    /// `scope`, `token_type` and anything else, written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expiry_date", &self.expiry_date)
            .finish_non_exhaustive()
    }
}

impl TokenSet {
    /// True when the access token has expired or is about to. A token
    /// without a recorded expiry is used until the API rejects it.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date
            .is_some_and(|expiry| now.timestamp_millis() + EXPIRY_SKEW_MS >= expiry)
    }
}

/// The `token.json` file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<TokenSet, GcalError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| GcalError::TokenCache {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|err| {
            GcalError::InvalidResponse(format!("token cache {}: {err}", self.path.display()))
        })
    }

    pub fn save(&self, tokens: &TokenSet) -> Result<(), GcalError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GcalError::TokenCache {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(tokens)
            .map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|source| GcalError::TokenCache {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "token cache updated");
        Ok(())
    }
}

/// Everything a client needs to renew its access token and persist it.
#[derive(Debug, Clone)]
pub struct TokenRefresh {
    pub credentials: OAuthCredentials,
    pub tokens: TokenSet,
    pub cache: TokenCache,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Exchanges the refresh token for a new access token.
///
/// Google normally omits `refresh_token` from the response; the cached one
/// is kept in that case.
pub(crate) async fn refresh_tokens(
    http: &reqwest::Client,
    credentials: &OAuthCredentials,
    tokens: &TokenSet,
    now: DateTime<Utc>,
) -> Result<TokenSet, GcalError> {
    let refresh_token = tokens
        .refresh_token
        .as_deref()
        .ok_or_else(|| GcalError::Auth {
            message: "cached token has no refresh_token, authorize again".to_string(),
        })?;

    let response = http
        .post(&credentials.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GcalError::Auth {
            message: format!("token refresh failed with status {status}: {body}"),
        });
    }

    let refreshed: RefreshResponse = serde_json::from_str(&body)
        .map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
    tracing::info!("refreshed calendar access token");

    Ok(TokenSet {
        access_token: refreshed.access_token,
        refresh_token: refreshed
            .refresh_token
            .or_else(|| tokens.refresh_token.clone()),
        expiry_date: refreshed
            .expires_in
            .map(|secs| now.timestamp_millis() + secs * 1000),
        extra: tokens.extra.clone(),
    })
}
