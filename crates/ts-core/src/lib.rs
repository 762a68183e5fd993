//! Core domain logic for calendar time reports.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: calendar entries and their durations
//! - Categorization: keyword tagging of event titles into category buckets
//! - Aggregation: per-category totals, averages and percentage splits

mod aggregate;
mod categorize;
pub mod config;
pub mod event;
pub mod types;

pub use aggregate::{CategorySplit, CategoryTotal, Percentage, Report, aggregate};
pub use categorize::{
    Bucket, CategorizedEntry, Categorizer, Classification, CategoryBuckets, categorize_events,
};
pub use config::{CategoryConfig, ConfigError, ExclusionRule, FallbackRule, MeasurementConfig};
pub use event::{CalendarEvent, EventTime};
pub use types::{CategoryName, ValidationError};
