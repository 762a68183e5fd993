//! Google Calendar event source for timesplit.
//!
//! Fetches single-occurrence events from one calendar via the `events.list`
//! endpoint, and decodes the same JSON shape from files for offline runs.
//! The initial authorization is left to the identity provider; this crate
//! reads the cached token set and renews it with the refresh token.

mod auth;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use ts_core::{CalendarEvent, EventTime};

pub use auth::{OAuthCredentials, TokenCache, TokenRefresh, TokenSet};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const GOOGLE_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_PAGE_SIZE: u32 = 250;

/// Event source errors.
#[derive(Debug, Error)]
pub enum GcalError {
    /// The provided access token was invalid.
    #[error("invalid access token: {reason}")]
    InvalidAccessToken { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The endpoint URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// The cached token file could not be read or written.
    #[error("token cache {}: {source}", path.display())]
    TokenCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The client credentials file could not be read.
    #[error("failed to read credentials {}: {source}", path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The access token could not be renewed.
    #[error("authorization failed: {message}")]
    Auth { message: String },
}

/// Filter applied to `events.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    /// Lower bound on event end time (Google's `timeMin`).
    pub time_min: DateTime<Utc>,
    pub page_size: u32,
}

impl EventQuery {
    pub fn new(calendar_id: impl Into<String>, time_min: DateTime<Utc>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_min,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    fn params(&self, page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (
                "timeMin",
                self.time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("maxResults", self.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }
}

/// Google Calendar API client.
pub struct Client {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    refresh: Option<TokenRefresh>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("refreshable", &self.refresh.is_some())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client with the given access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, or if the
    /// HTTP client fails to build.
    pub fn new(access_token: impl Into<String>) -> Result<Self, GcalError> {
        let access_token = access_token.into();

        if access_token.is_empty() {
            return Err(GcalError::InvalidAccessToken {
                reason: "access token cannot be empty",
            });
        }
        if access_token.trim().is_empty() {
            return Err(GcalError::InvalidAccessToken {
                reason: "access token cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(GcalError::ClientBuild)?;

        Ok(Self {
            http,
            access_token,
            base_url: GOOGLE_CALENDAR_API_URL.to_string(),
            refresh: None,
        })
    }

    /// Lets the client renew its access token when it expires or is
    /// rejected, writing the new token set back to the cache.
    #[must_use]
    pub fn with_refresh(mut self, refresh: TokenRefresh) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn events_url(&self, calendar_id: &str) -> Result<reqwest::Url, GcalError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|err| GcalError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| GcalError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }

    /// Renews the access token. Returns `false` when the client has no
    /// refresh configuration.
    async fn refresh_access_token(&mut self) -> Result<bool, GcalError> {
        let Some(refresh) = &mut self.refresh else {
            return Ok(false);
        };

        let tokens =
            auth::refresh_tokens(&self.http, &refresh.credentials, &refresh.tokens, Utc::now())
                .await?;
        refresh.cache.save(&tokens)?;
        self.access_token.clone_from(&tokens.access_token);
        refresh.tokens = tokens;
        Ok(true)
    }

    /// Lists all matching events, following pagination.
    ///
    /// An expired token is renewed up front; a 401 triggers one renewal and
    /// a retry of the same page.
    pub async fn list_events(
        &mut self,
        query: &EventQuery,
    ) -> Result<Vec<CalendarEvent>, GcalError> {
        let url = self.events_url(&query.calendar_id)?;
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut renewed_after_rejection = false;

        if self
            .refresh
            .as_ref()
            .is_some_and(|refresh| refresh.tokens.needs_refresh(Utc::now()))
        {
            tracing::debug!("access token expired, refreshing");
            self.refresh_access_token().await?;
        }

        loop {
            let response = self
                .http
                .get(url.clone())
                .bearer_auth(&self.access_token)
                .query(&query.params(page_token.as_deref()))
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !renewed_after_rejection {
                renewed_after_rejection = true;
                if self.refresh_access_token().await? {
                    tracing::info!("access token rejected, retrying with a renewed token");
                    continue;
                }
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(parse_api_error(&body).unwrap_or_else(|| GcalError::Api {
                    message: format!("status {status}: {body}"),
                }));
            }

            let page = parse_events_page(&body)?;
            tracing::debug!(
                calendar_id = %query.calendar_id,
                items = page.events.len(),
                "fetched events page"
            );
            events.extend(page.events);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(count = events.len(), "fetched calendar events");
        Ok(events)
    }
}

/// One decoded page of `events.list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsPage {
    pub events: Vec<CalendarEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    #[serde(default)]
    items: Vec<WireEvent>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<WireTime>,
    #[serde(default)]
    end: Option<WireTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTime {
    #[serde(default)]
    date_time: Option<DateTime<chrono::FixedOffset>>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl WireTime {
    fn into_event_time(self) -> Option<EventTime> {
        self.date_time
            .map(EventTime::DateTime)
            .or_else(|| self.date.map(EventTime::Date))
    }
}

impl WireEvent {
    fn into_event(self) -> Option<CalendarEvent> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }

        let title = self.summary.unwrap_or_default();
        let start = self.start.and_then(WireTime::into_event_time);
        let end = self.end.and_then(WireTime::into_event_time);
        match (start, end) {
            (Some(start), Some(end)) => Some(CalendarEvent::new(start, end, title)),
            _ => {
                tracing::warn!(id = ?self.id, %title, "skipping event without start or end");
                None
            }
        }
    }
}

/// Decodes one page of an `events.list` response.
pub fn parse_events_page(body: &str) -> Result<EventsPage, GcalError> {
    let page: WirePage =
        serde_json::from_str(body).map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
    Ok(EventsPage {
        events: page
            .items
            .into_iter()
            .filter_map(WireEvent::into_event)
            .collect(),
        next_page_token: page.next_page_token,
    })
}

/// Decodes events from a saved `events.list` response.
///
/// Accepts either a single page object or an array of pages.
pub fn events_from_json(body: &str) -> Result<Vec<CalendarEvent>, GcalError> {
    if body.trim_start().starts_with('[') {
        let pages: Vec<serde_json::Value> = serde_json::from_str(body)
            .map_err(|err| GcalError::InvalidResponse(err.to_string()))?;
        let mut events = Vec::new();
        for page in pages {
            events.extend(parse_events_page(&page.to_string())?.events);
        }
        return Ok(events);
    }
    Ok(parse_events_page(body)?.events)
}

fn parse_api_error(body: &str) -> Option<GcalError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| GcalError::Api {
            message: payload.error.message,
        })
}
