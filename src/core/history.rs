//! Reward redemption history.
//!
//! The history is an append-only log: records are added at the front so
//! that iteration yields the newest redemption first, and nothing already
//! recorded is ever changed or removed.

use super::category::Category;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Record of a single redemption.
///
/// Records are immutable values. Besides the UTC timestamp they carry the
/// local date (`dd/mm/yyyy`) and time (`HH:MM`) labels captured at the
/// moment of redemption, so they read the same no matter when they are
/// displayed.
///
/// # Example
///
/// ```rust
/// use punchcard::core::{Category, RewardRecord};
/// use chrono::Utc;
///
/// let coffee = Category::new("coffee", "Caffè", 10, "☕", "Caffè gratuito");
/// let record = RewardRecord::new(&coffee, Utc::now());
///
/// assert_eq!(record.category_id, "coffee");
/// assert_eq!(record.reward_description, "Caffè gratuito");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub id: Uuid,
    /// When the reward was redeemed
    pub timestamp: DateTime<Utc>,
    /// Local date label
    pub date: String,
    /// Local time label
    pub time: String,
    pub category_id: String,
    pub marker: String,
    pub reward_description: String,
}

impl RewardRecord {
    /// Stamp a redemption of `category` at `timestamp`.
    pub fn new(category: &Category, timestamp: DateTime<Utc>) -> Self {
        let local = timestamp.with_timezone(&Local);
        Self {
            id: Uuid::new_v4(),
            timestamp,
            date: local.format("%d/%m/%Y").to_string(),
            time: local.format("%H:%M").to_string(),
            category_id: category.id.clone(),
            marker: category.marker.clone(),
            reward_description: category.reward_description.clone(),
        }
    }
}

/// Newest-first log of redemptions.
///
/// # Example
///
/// ```rust
/// use punchcard::core::{Category, RewardHistory, RewardRecord};
/// use chrono::Utc;
///
/// let coffee = Category::new("coffee", "Caffè", 10, "☕", "Caffè gratuito");
/// let snack = Category::new("snack", "Merendina", 5, "🍪", "Merendina gratuita");
///
/// let mut history = RewardHistory::new();
/// history.record(RewardRecord::new(&coffee, Utc::now()));
/// history.record(RewardRecord::new(&snack, Utc::now()));
///
/// let ids: Vec<_> = history.iter().map(|r| r.category_id.as_str()).collect();
/// assert_eq!(ids, vec!["snack", "coffee"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardHistory {
    records: VecDeque<RewardRecord>,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
        }
    }

    /// Prepend a record so it becomes the newest entry.
    pub fn record(&mut self, entry: RewardRecord) {
        self.records.push_front(entry);
    }

    /// Snapshot of all records, newest first.
    pub fn all(&self) -> Vec<RewardRecord> {
        self.records.iter().cloned().collect()
    }

    /// Borrowing iterator over the records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &RewardRecord> {
        self.records.iter()
    }

    /// Most recent redemption, if any.
    pub fn latest(&self) -> Option<&RewardRecord> {
        self.records.front()
    }

    /// Number of redemptions recorded for one category.
    pub fn count_for(&self, category_id: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.category_id == category_id)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<RewardRecord>> for RewardHistory {
    /// Build a history from records that are already newest-first.
    fn from(records: Vec<RewardRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}
