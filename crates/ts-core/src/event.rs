//! Calendar events as supplied by an event source.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of a calendar event.
///
/// All-day events only carry a date; timed events carry an offset-aware
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl EventTime {
    /// Resolves to an instant. A date resolves to local midnight.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => dt.with_timezone(&Utc),
            Self::Date(date) => local_midnight_to_utc(*date),
        }
    }
}

/// Converts a local date at midnight to UTC.
///
/// DST overlap picks the earlier instant. A DST gap at midnight resolves to
/// the first hour that exists on that date.
fn local_midnight_to_utc(date: NaiveDate) -> DateTime<Utc> {
    let mut naive = date.and_time(chrono::NaiveTime::MIN);
    for _ in 0..24 {
        if let Some(dt) = Local.from_local_datetime(&naive).earliest() {
            return dt.with_timezone(&Utc);
        }
        naive += chrono::Duration::hours(1);
    }
    // No local representation at all; treat the date as UTC.
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// A single calendar entry. Never mutated after the source produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: EventTime,
    pub end: EventTime,
    /// Free-text title (the calendar "summary").
    pub title: String,
}

impl CalendarEvent {
    pub fn new(start: EventTime, end: EventTime, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
        }
    }

    /// Duration in hours, rounded to two decimals.
    ///
    /// Events that end before they start are clamped to zero hours.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_hours(&self) -> f64 {
        let ms = (self.end.to_utc() - self.start.to_utc()).num_milliseconds();
        if ms < 0 {
            tracing::warn!(
                title = %self.title,
                duration_ms = ms,
                "event ends before it starts, counting as 0h"
            );
            return 0.0;
        }
        round_hundredths(ms as f64 / 3_600_000.0)
    }
}

/// Rounds to two decimal places.
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> EventTime {
        EventTime::DateTime(DateTime::parse_from_rfc3339(rfc3339).unwrap())
    }

    #[test]
    fn duration_of_timed_event() {
        let event = CalendarEvent::new(
            at("2019-04-01T09:00:00+01:00"),
            at("2019-04-01T10:30:00+01:00"),
            "Admin",
        );
        assert!((event.duration_hours() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_across_offsets() {
        // 09:00 BST is 08:00 UTC
        let event = CalendarEvent::new(
            at("2019-04-01T09:00:00+01:00"),
            at("2019-04-01T10:00:00+00:00"),
            "Sync",
        );
        assert!((event.duration_hours() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_rounds_to_two_decimals() {
        // 20 minutes = 0.3333h
        let event = CalendarEvent::new(
            at("2019-04-01T09:00:00Z"),
            at("2019-04-01T09:20:00Z"),
            "Standup",
        );
        assert!((event.duration_hours() - 0.33).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_duration_is_clamped() {
        let event = CalendarEvent::new(
            at("2019-04-01T10:00:00Z"),
            at("2019-04-01T09:00:00Z"),
            "Backwards",
        );
        assert!(event.duration_hours().abs() < f64::EPSILON);
    }

    #[test]
    fn all_day_event_spans_whole_days() {
        let start = EventTime::Date(NaiveDate::from_ymd_opt(2019, 4, 2).unwrap());
        let end = EventTime::Date(NaiveDate::from_ymd_opt(2019, 4, 3).unwrap());
        let event = CalendarEvent::new(start, end, "Offsite");
        // 23, 24 or 25 depending on a DST change in the local zone
        let hours = event.duration_hours();
        assert!((23.0..=25.0).contains(&hours), "got {hours}");
    }

    #[test]
    fn date_resolves_to_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2019, 4, 2).unwrap();
        let utc = EventTime::Date(date).to_utc();
        let local = utc.with_timezone(&Local);
        assert_eq!(local.date_naive(), date);
    }

    #[test]
    fn round_hundredths_examples() {
        assert!((round_hundredths(1.234) - 1.23).abs() < f64::EPSILON);
        assert!((round_hundredths(1.235_000_1) - 1.24).abs() < f64::EPSILON);
        assert!(round_hundredths(0.0).abs() < f64::EPSILON);
    }
}
