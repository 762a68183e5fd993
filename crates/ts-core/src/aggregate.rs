//! Time allocation statistics over filled category buckets.
//!
//! Every statistic is built from the rounded value before it, never from raw
//! durations:
//!
//! 1. Per-category total = round(sum of entry hours)
//! 2. Total = sum of rounded per-category totals
//! 3. Average per day = round(total / measured days)
//! 4. Average per week = round(average per day * workdays per week)
//! 5. Effort = round(average per week * 100 / nominal week hours)
//! 6. Split = round(category total * 100 / (measured days * nominal day hours))

use std::fmt;

use serde::{Serialize, Serializer};

use crate::categorize::CategoryBuckets;
use crate::config::MeasurementConfig;
use crate::types::CategoryName;

/// A whole-number percentage, rendered as `"71%"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percentage(pub i64);

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Rounded hours for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: CategoryName,
    pub hours: i64,
}

/// Share of the measurement window spent on one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySplit {
    pub category: CategoryName,
    pub percentage: Percentage,
}

/// Summary statistics for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub per_category: Vec<CategoryTotal>,
    pub total_hours: i64,
    pub avg_hours_per_day: i64,
    pub avg_hours_per_week: i64,
    pub avg_effort: Percentage,
    pub splits: Vec<CategorySplit>,
}

impl Report {
    pub fn total_for(&self, category: &str) -> Option<i64> {
        self.per_category
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.hours)
    }

    pub fn split_for(&self, category: &str) -> Option<Percentage> {
        self.splits
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.percentage)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    value.round() as i64
}

/// Computes the report. An empty set of buckets yields all zeros.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(buckets: &CategoryBuckets, measurement: &MeasurementConfig) -> Report {
    let per_category: Vec<CategoryTotal> = buckets
        .iter()
        .map(|bucket| CategoryTotal {
            category: bucket.category.clone(),
            hours: round(bucket.total_hours()),
        })
        .collect();

    let total_hours: i64 = per_category.iter().map(|t| t.hours).sum();

    let avg_hours_per_day = round(total_hours as f64 / f64::from(measurement.measured_days));
    let avg_hours_per_week =
        round(avg_hours_per_day as f64 * f64::from(measurement.workdays_per_week));
    let avg_effort = Percentage(round(
        avg_hours_per_week as f64 * 100.0 / f64::from(measurement.nominal_week_hours),
    ));

    let denominator = f64::from(measurement.split_denominator_hours());
    let splits = per_category
        .iter()
        .map(|t| CategorySplit {
            category: t.category.clone(),
            percentage: Percentage(round(t.hours as f64 * 100.0 / denominator)),
        })
        .collect();

    tracing::debug!(
        total_hours,
        avg_hours_per_day,
        avg_hours_per_week,
        %avg_effort,
        "aggregated buckets"
    );

    Report {
        per_category,
        total_hours,
        avg_hours_per_day,
        avg_hours_per_week,
        avg_effort,
        splits,
    }
}
