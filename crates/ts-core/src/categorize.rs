//! Keyword categorization of event titles.
//!
//! # Algorithm Summary
//!
//! 1. Lower-case the title once
//! 2. Scan categories in priority order, testing each name as a substring
//! 3. A keyword hit is dropped when any exclusion rule for that category
//!    fires; the scan continues either way
//! 4. Every surviving hit is a tag, so one event can land in several buckets
//! 5. With no tags, the fallback chain decides: first trigger present wins,
//!    otherwise the default category

use serde::Serialize;

use crate::config::{CategoryConfig, ConfigError};
use crate::event::CalendarEvent;
use crate::types::CategoryName;

/// Outcome of classifying a single title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// Counted under every listed category.
    Tagged { categories: Vec<CategoryName> },
    /// Not counted anywhere; `trigger` is the fallback substring that fired.
    Discarded { trigger: String },
}

impl Classification {
    /// Categories the event is counted under (empty when discarded).
    pub fn categories(&self) -> &[CategoryName] {
        match self {
            Self::Tagged { categories } => categories,
            Self::Discarded { .. } => &[],
        }
    }
}

/// Classifies titles against a validated [`CategoryConfig`].
#[derive(Debug, Clone)]
pub struct Categorizer {
    config: CategoryConfig,
}

impl Categorizer {
    /// Validates the configuration and normalizes trigger case.
    pub fn new(mut config: CategoryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        for exclusion in &mut config.exclusions {
            exclusion.trigger = exclusion.trigger.to_lowercase();
        }
        for fallback in &mut config.fallbacks {
            fallback.trigger = fallback.trigger.to_lowercase();
        }
        Ok(Self { config })
    }

    pub const fn config(&self) -> &CategoryConfig {
        &self.config
    }

    /// Tags `title` with every matching category that no exclusion
    /// suppresses.
    ///
    /// A title whose keyword hits are all suppressed goes through the
    /// fallback chain (`"people - api"` lands in `other`). Such events are
    /// intentionally counted, not dropped, so that only fallback discards
    /// leave the totals.
    pub fn classify(&self, title: &str) -> Classification {
        let title = title.to_lowercase();

        let categories: Vec<CategoryName> = self
            .config
            .categories
            .iter()
            .filter(|category| title.contains(category.as_str()))
            .filter(|category| !self.is_suppressed(&title, category))
            .cloned()
            .collect();

        if !categories.is_empty() {
            return Classification::Tagged { categories };
        }

        for fallback in &self.config.fallbacks {
            if title.contains(fallback.trigger.as_str()) {
                return match &fallback.category {
                    Some(category) => Classification::Tagged {
                        categories: vec![category.clone()],
                    },
                    None => Classification::Discarded {
                        trigger: fallback.trigger.clone(),
                    },
                };
            }
        }

        Classification::Tagged {
            categories: vec![self.config.default_category.clone()],
        }
    }

    fn is_suppressed(&self, title: &str, category: &CategoryName) -> bool {
        self.config
            .exclusions
            .iter()
            .any(|rule| rule.suppresses == *category && title.contains(rule.trigger.as_str()))
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        // The built-in tables always validate, see config tests.
        Self {
            config: CategoryConfig::default(),
        }
    }
}

/// An event's duration and title, as stored in a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedEntry {
    pub duration_hours: f64,
    pub title: String,
}

/// Entries counted under one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub category: CategoryName,
    pub entries: Vec<CategorizedEntry>,
}

impl Bucket {
    /// Raw floating-point sum of entry durations.
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|entry| entry.duration_hours).sum()
    }
}

/// One bucket per configured category, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBuckets {
    buckets: Vec<Bucket>,
    discarded: usize,
}

impl CategoryBuckets {
    /// Creates empty buckets for the given categories.
    pub fn new(categories: &[CategoryName]) -> Self {
        Self {
            buckets: categories
                .iter()
                .map(|category| Bucket {
                    category: category.clone(),
                    entries: Vec::new(),
                })
                .collect(),
            discarded: 0,
        }
    }

    /// Appends the entry to every tagged bucket.
    pub fn record(&mut self, classification: &Classification, entry: CategorizedEntry) {
        if let Classification::Discarded { trigger } = classification {
            tracing::debug!(title = %entry.title, %trigger, "entry discarded");
            self.discarded += 1;
            return;
        }

        for category in classification.categories() {
            match self.buckets.iter_mut().find(|b| b.category == *category) {
                Some(bucket) => bucket.entries.push(entry.clone()),
                None => tracing::warn!(%category, "no bucket for category, entry dropped"),
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    pub fn get(&self, category: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.category == category)
    }

    /// Number of events dropped by a discarding fallback rule.
    pub const fn discarded(&self) -> usize {
        self.discarded
    }

    /// Total entries across buckets. Multi-tagged events count once per bucket.
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }
}

/// Classifies every event in order and fills the buckets.
pub fn categorize_events(categorizer: &Categorizer, events: &[CalendarEvent]) -> CategoryBuckets {
    let mut buckets = CategoryBuckets::new(&categorizer.config().categories);

    for event in events {
        let classification = categorizer.classify(&event.title);
        tracing::debug!(title = %event.title, ?classification, "classified event");
        buckets.record(
            &classification,
            CategorizedEntry {
                duration_hours: event.duration_hours(),
                title: event.title.clone(),
            },
        );
    }

    buckets
}
