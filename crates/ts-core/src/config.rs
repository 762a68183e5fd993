//! Categorization rules and measurement constants.
//!
//! Both structures deserialize with per-field defaults, so a partial TOML
//! table only overrides the fields it names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CategoryName;

/// Errors raised when a configuration cannot drive the categorizer or the
/// aggregator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No categories were configured.
    #[error("at least one category must be configured")]
    NoCategories,

    /// A category appears more than once in the priority list.
    #[error("category '{name}' is listed more than once")]
    DuplicateCategory { name: CategoryName },

    /// A rule has an empty trigger substring.
    #[error("{rule} rule has an empty trigger")]
    EmptyTrigger { rule: &'static str },

    /// A rule refers to a category that is not in the priority list.
    #[error("{rule} rule refers to unknown category '{name}'")]
    UnknownCategory {
        rule: &'static str,
        name: CategoryName,
    },

    /// A measurement constant that is used as a divisor was zero.
    #[error("measurement.{field} must be greater than zero")]
    ZeroMeasurement { field: &'static str },
}

/// Suppresses assignment to one category when the title contains a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    /// Substring tested against the lower-cased title.
    pub trigger: String,
    /// Category that must not receive the event when the trigger is present.
    pub suppresses: CategoryName,
}

/// Secondary keyword check applied when no category keyword was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackRule {
    /// Substring tested against the lower-cased title.
    pub trigger: String,
    /// Target category. `None` discards the event from every bucket.
    #[serde(default)]
    pub category: Option<CategoryName>,
}

/// Ordered category list plus the exclusion and fallback tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Category names in priority order.
    pub categories: Vec<CategoryName>,
    /// Exclusion rules, evaluated independently for every keyword hit.
    pub exclusions: Vec<ExclusionRule>,
    /// Fallback chain, first matching trigger wins.
    pub fallbacks: Vec<FallbackRule>,
    /// Bucket for titles that match nothing at all.
    pub default_category: CategoryName,
}

const DEFAULT_CATEGORIES: [&str; 16] = [
    "admin",
    "email",
    "b2b",
    "etg",
    "hr",
    "people api",
    "unfocused",
    "career",
    "timesheets",
    "people",
    "mentoring",
    "pip",
    "vms",
    "facebook",
    "competencies",
    "other",
];

const DEFAULT_EXCLUSIONS: [(&str, &str); 6] = [
    ("api", "people"),
    ("pip", "people"),
    ("admin", "email"),
    ("mentoring", "people"),
    ("career", "mentoring"),
    ("competencies", "career"),
];

// "unfocussed" is the common misspelling seen in calendar titles.
const DEFAULT_FALLBACKS: [(&str, Option<&str>); 5] = [
    ("unfocussed", Some("unfocused")),
    ("meeting", Some("admin")),
    ("mba", Some("career")),
    ("squad", Some("people")),
    ("lunch", None),
];

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES
                .into_iter()
                .map(CategoryName::from_static)
                .collect(),
            exclusions: DEFAULT_EXCLUSIONS
                .into_iter()
                .map(|(trigger, suppresses)| ExclusionRule {
                    trigger: trigger.to_string(),
                    suppresses: CategoryName::from_static(suppresses),
                })
                .collect(),
            fallbacks: DEFAULT_FALLBACKS
                .into_iter()
                .map(|(trigger, category)| FallbackRule {
                    trigger: trigger.to_string(),
                    category: category.map(CategoryName::from_static),
                })
                .collect(),
            default_category: CategoryName::from_static("other"),
        }
    }
}

impl CategoryConfig {
    /// Checks that every rule refers to a configured category.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let mut seen = HashSet::new();
        for name in &self.categories {
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateCategory { name: name.clone() });
            }
        }

        let check_known = |rule: &'static str, name: &CategoryName| {
            if seen.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::UnknownCategory {
                    rule,
                    name: name.clone(),
                })
            }
        };

        for exclusion in &self.exclusions {
            if exclusion.trigger.trim().is_empty() {
                return Err(ConfigError::EmptyTrigger { rule: "exclusion" });
            }
            check_known("exclusion", &exclusion.suppresses)?;
        }

        for fallback in &self.fallbacks {
            if fallback.trigger.trim().is_empty() {
                return Err(ConfigError::EmptyTrigger { rule: "fallback" });
            }
            if let Some(category) = &fallback.category {
                check_known("fallback", category)?;
            }
        }

        check_known("default", &self.default_category)
    }
}

/// Fixed constants of the measurement window.
///
/// The per-category split denominator is `measured_days * nominal_day_hours`
/// (170 hours by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Days in the measurement window.
    pub measured_days: u32,
    /// Working days in a week, used to scale the daily average.
    pub workdays_per_week: u32,
    /// Nominal hours in a work week, the effort denominator.
    pub nominal_week_hours: u32,
    /// Nominal hours in a working day.
    pub nominal_day_hours: u32,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            measured_days: 17,
            workdays_per_week: 5,
            nominal_week_hours: 35,
            nominal_day_hours: 10,
        }
    }
}

impl MeasurementConfig {
    /// Hours available over the whole measurement window.
    pub const fn split_denominator_hours(&self) -> u32 {
        self.measured_days * self.nominal_day_hours
    }

    /// Rejects zero-valued constants.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.measured_days == 0 {
            return Err(ConfigError::ZeroMeasurement {
                field: "measured_days",
            });
        }
        if self.workdays_per_week == 0 {
            return Err(ConfigError::ZeroMeasurement {
                field: "workdays_per_week",
            });
        }
        if self.nominal_week_hours == 0 {
            return Err(ConfigError::ZeroMeasurement {
                field: "nominal_week_hours",
            });
        }
        if self.nominal_day_hours == 0 {
            return Err(ConfigError::ZeroMeasurement {
                field: "nominal_day_hours",
            });
        }
        Ok(())
    }
}
