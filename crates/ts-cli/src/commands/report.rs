//! Report command for printing time allocation statistics.
//!
//! This module implements `timesplit report`: load events (from Google
//! Calendar or a saved `events.list` response), categorize them, aggregate,
//! and render as human-readable text or JSON.

use std::fmt::Write as _;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_core::{
    Bucket, CalendarEvent, Categorizer, CategoryBuckets, MeasurementConfig, Report, aggregate,
    categorize_events,
};
use ts_gcal::{Client, EventQuery, OAuthCredentials, TokenCache, TokenRefresh};

use crate::{Config, ReportArgs};

/// Printed instead of a report when the source yields nothing.
pub const NO_EVENTS_MESSAGE: &str = "No upcoming events found.";

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub measurement: MeasurementConfig,
    pub event_count: usize,
    pub buckets: CategoryBuckets,
    /// `None` when there were no events; aggregation is skipped entirely.
    pub report: Option<Report>,
}

// ========== Event Loading ==========

/// Loads events from `input` (a file, or `-` for stdin) or the calendar API.
fn load_events(input: Option<&Path>, config: &Config) -> Result<Vec<CalendarEvent>> {
    match input {
        Some(path) if path == Path::new("-") => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read events from stdin")?;
            ts_gcal::events_from_json(&body).context("invalid events JSON on stdin")
        }
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            ts_gcal::events_from_json(&body)
                .with_context(|| format!("invalid events JSON in {}", path.display()))
        }
        None => fetch_events(config),
    }
}

/// Fetches events from Google Calendar with the configured or cached token.
fn fetch_events(config: &Config) -> Result<Vec<CalendarEvent>> {
    let mut client = match &config.access_token {
        Some(token) => {
            Client::new(token.clone()).context("failed to create calendar client")?
        }
        None => cached_client(config)?,
    };
    let query = EventQuery::new(config.calendar_id.clone(), config.time_min);
    tracing::debug!(?query, "fetching calendar events");

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime
        .block_on(client.list_events(&query))
        .context("failed to fetch calendar events")
}

/// Builds a client from the token cache, renewable when client credentials
/// are present.
fn cached_client(config: &Config) -> Result<Client> {
    let cache = TokenCache::new(config.token_path.clone());
    let tokens = cache.load().with_context(|| {
        format!(
            "no usable access token at {} (authorize first or set TIMESPLIT_ACCESS_TOKEN)",
            config.token_path.display()
        )
    })?;
    let client =
        Client::new(tokens.access_token.clone()).context("failed to create calendar client")?;

    if !config.credentials_path.exists() {
        tracing::warn!(
            path = %config.credentials_path.display(),
            "client credentials not found, expired tokens cannot be renewed"
        );
        return Ok(client);
    }

    let credentials = OAuthCredentials::load(&config.credentials_path)
        .context("failed to load client credentials")?;
    Ok(client.with_refresh(TokenRefresh {
        credentials,
        tokens,
        cache,
    }))
}

// ========== Report Generation ==========

/// Categorizes and aggregates events.
pub fn build_report(
    events: &[CalendarEvent],
    categorizer: &Categorizer,
    measurement: MeasurementConfig,
    generated_at: DateTime<Utc>,
    timezone: String,
) -> ReportData {
    if events.is_empty() {
        return ReportData {
            generated_at,
            timezone,
            measurement,
            event_count: 0,
            buckets: CategoryBuckets::new(&categorizer.config().categories),
            report: None,
        };
    }

    let buckets = categorize_events(categorizer, events);
    let report = aggregate(&buckets, &measurement);
    tracing::info!(
        events = events.len(),
        discarded = buckets.discarded(),
        total_hours = report.total_hours,
        "report computed"
    );

    ReportData {
        generated_at,
        timezone,
        measurement,
        event_count: events.len(),
        buckets,
        report: Some(report),
    }
}

// ========== Text Output ==========

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "HOURS SPENT OVER {} MEASURED DAYS",
        data.measurement.measured_days
    )
    .unwrap();

    let Some(report) = &data.report else {
        writeln!(output).unwrap();
        writeln!(output, "{NO_EVENTS_MESSAGE}").unwrap();
        return output;
    };

    // BY CATEGORY section
    writeln!(output).unwrap();
    writeln!(output, "BY CATEGORY").unwrap();
    writeln!(output, "───────────").unwrap();
    for total in &report.per_category {
        writeln!(output, "{:<14}{:>5}h", total.category.as_str(), total.hours).unwrap();
    }

    // SUMMARY section
    writeln!(output).unwrap();
    writeln!(output, "SUMMARY").unwrap();
    writeln!(output, "───────").unwrap();
    writeln!(output, "{:<16}{:>4}h", "Total hours:", report.total_hours).unwrap();
    writeln!(output, "{:<16}{:>4}h", "Avg hours/day:", report.avg_hours_per_day).unwrap();
    writeln!(output, "{:<16}{:>4}h", "Avg hours/week:", report.avg_hours_per_week).unwrap();
    writeln!(output, "{:<16}{:>5}", "Avg effort:", report.avg_effort.to_string()).unwrap();

    // SPLITS section
    writeln!(output).unwrap();
    writeln!(output, "SPLITS").unwrap();
    writeln!(output, "──────").unwrap();
    for split in &report.splits {
        writeln!(
            output,
            "{:<14}{:>6}",
            split.category.as_str(),
            split.percentage.to_string()
        )
        .unwrap();
    }

    // Raw bucket contents for auditing
    writeln!(output).unwrap();
    writeln!(output, "=== DETAIL ===").unwrap();
    for bucket in data.buckets.iter() {
        write_bucket(&mut output, bucket);
    }

    writeln!(output).unwrap();
    writeln!(output, "Discarded events: {}", data.buckets.discarded()).unwrap();

    output
}

fn write_bucket(output: &mut String, bucket: &Bucket) {
    writeln!(output, "{}", bucket.category).unwrap();
    if bucket.entries.is_empty() {
        writeln!(output, "  (none)").unwrap();
        return;
    }
    for entry in &bucket.entries {
        writeln!(output, "  {:>7.2}h  {}", entry.duration_hours, entry.title).unwrap();
    }
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub timezone: &'a str,
    pub measured_days: u32,
    pub event_count: usize,
    pub discarded: usize,
    pub report: Option<&'a Report>,
    pub detail: Vec<&'a Bucket>,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: &data.timezone,
        measured_days: data.measurement.measured_days,
        event_count: data.event_count,
        discarded: data.buckets.discarded(),
        report: data.report.as_ref(),
        detail: data.buckets.iter().collect(),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run<W: Write>(writer: &mut W, args: &ReportArgs, config: &Config) -> Result<()> {
    let categorizer =
        Categorizer::new(config.categories.clone()).context("invalid category configuration")?;
    let events = load_events(args.input.as_deref(), config)?;

    let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
    let data = build_report(
        &events,
        &categorizer,
        config.measurement,
        Utc::now(),
        timezone,
    );

    if args.json {
        let output = format_report_json(&data)?;
        writeln!(writer, "{output}")?;
    } else {
        let output = format_report(&data);
        write!(writer, "{output}")?;
    }

    Ok(())
}
