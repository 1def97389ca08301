//! Bounded point counters, one per category.

use super::category::CategoryRegistry;
use super::error::LoyaltyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persisted form of the counters: category id to current count.
pub type PointsState = BTreeMap<String, u32>;

/// Mutable mapping from category id to point count.
///
/// Every count stays within `0..=max_points` of its category. Mutations
/// either fully apply or leave the store untouched.
#[derive(Clone, Debug)]
pub struct PointsStore {
    registry: Arc<CategoryRegistry>,
    counts: PointsState,
}

impl PointsStore {
    /// Create a store with every known category at zero.
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        let counts = registry.ids().map(|id| (id.to_string(), 0)).collect();
        Self { registry, counts }
    }

    /// Rebuild a store from persisted counts.
    ///
    /// Entries for categories outside the registry are dropped and counts
    /// above a category's maximum are clamped, so the result always satisfies
    /// the store's bounds. Returns the store and the number of entries that
    /// had to be adjusted.
    pub fn from_state(registry: Arc<CategoryRegistry>, state: &PointsState) -> (Self, usize) {
        let mut store = Self::new(registry);
        let mut adjusted = 0;

        for (id, &count) in state {
            let Ok(max) = store.registry.max_points_of(id) else {
                tracing::warn!(category = %id, count, "dropping points for unknown category");
                adjusted += 1;
                continue;
            };
            if count > max {
                tracing::warn!(category = %id, count, max, "clamping persisted points to maximum");
                adjusted += 1;
            }
            store.counts.insert(id.clone(), count.min(max));
        }

        (store, adjusted)
    }

    /// Current count for a category; zero if it was never set.
    pub fn get(&self, id: &str) -> Result<u32, LoyaltyError> {
        self.registry.max_points_of(id)?;
        Ok(self.counts.get(id).copied().unwrap_or(0))
    }

    /// Add one point, returning the new count.
    ///
    /// Fails with [`LoyaltyError::CategoryFull`] once the maximum is reached.
    pub fn increment(&mut self, id: &str) -> Result<u32, LoyaltyError> {
        let max_points = self.registry.max_points_of(id)?;
        let current = self.counts.get(id).copied().unwrap_or(0);
        if current >= max_points {
            return Err(LoyaltyError::CategoryFull {
                id: id.to_string(),
                max_points,
            });
        }

        let next = current + 1;
        self.counts.insert(id.to_string(), next);
        Ok(next)
    }

    /// Set a category back to zero.
    pub fn reset(&mut self, id: &str) -> Result<(), LoyaltyError> {
        self.registry.max_points_of(id)?;
        self.counts.insert(id.to_string(), 0);
        Ok(())
    }

    /// Progress of a single category.
    pub fn progress(&self, id: &str) -> Result<CategoryProgress, LoyaltyError> {
        let max_points = self.registry.max_points_of(id)?;
        let count = self.counts.get(id).copied().unwrap_or(0);
        Ok(CategoryProgress::new(id, count, max_points))
    }

    /// Progress of every category, in configured order.
    pub fn progress_all(&self) -> Vec<CategoryProgress> {
        self.registry
            .iter()
            .map(|c| {
                let count = self.counts.get(&c.id).copied().unwrap_or(0);
                CategoryProgress::new(&c.id, count, c.max_points)
            })
            .collect()
    }

    /// Copy of the counters, one entry per known category.
    pub fn state(&self) -> PointsState {
        self.registry
            .ids()
            .map(|id| (id.to_string(), self.counts.get(id).copied().unwrap_or(0)))
            .collect()
    }

    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        &self.registry
    }
}

/// How far a category is from its reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category_id: String,
    pub count: u32,
    pub max_points: u32,
    /// Points still missing before the reward can be claimed
    pub remaining: u32,
    /// Completion in the range `0.0..=100.0`
    pub percent: f64,
    pub redeemable: bool,
}

impl CategoryProgress {
    fn new(id: &str, count: u32, max_points: u32) -> Self {
        Self {
            category_id: id.to_string(),
            count,
            max_points,
            remaining: max_points.saturating_sub(count),
            percent: f64::from(count) / f64::from(max_points) * 100.0,
            redeemable: count >= max_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    fn registry() -> Arc<CategoryRegistry> {
        Arc::new(
            CategoryRegistry::new(vec![
                Category::new("coffee", "Caffè", 3, "☕", "Caffè gratuito"),
                Category::new("snack", "Merendina", 2, "🍪", "Merendina gratuita"),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn new_store_starts_at_zero() {
        let store = PointsStore::new(registry());
        assert_eq!(store.get("coffee").unwrap(), 0);
        assert_eq!(store.get("snack").unwrap(), 0);
        assert_eq!(store.state().len(), 2);
    }

    #[test]
    fn increment_stops_at_maximum() {
        let mut store = PointsStore::new(registry());

        assert_eq!(store.increment("snack").unwrap(), 1);
        assert_eq!(store.increment("snack").unwrap(), 2);

        let err = store.increment("snack").unwrap_err();
        assert!(matches!(err, LoyaltyError::CategoryFull { max_points: 2, .. }));
        assert_eq!(store.get("snack").unwrap(), 2);
    }

    #[test]
    fn categories_are_independent() {
        let mut store = PointsStore::new(registry());
        store.increment("coffee").unwrap();
        store.increment("coffee").unwrap();

        assert_eq!(store.get("coffee").unwrap(), 2);
        assert_eq!(store.get("snack").unwrap(), 0);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut store = PointsStore::new(registry());
        store.increment("coffee").unwrap();
        store.reset("coffee").unwrap();
        assert_eq!(store.get("coffee").unwrap(), 0);
    }

    #[test]
    fn unknown_category_never_mutates() {
        let mut store = PointsStore::new(registry());
        let before = store.state();

        assert!(matches!(
            store.increment("tea"),
            Err(LoyaltyError::UnknownCategory { .. })
        ));
        assert!(store.reset("tea").is_err());
        assert!(store.get("tea").is_err());
        assert_eq!(store.state(), before);
    }

    #[test]
    fn from_state_clamps_and_drops() {
        let mut persisted = PointsState::new();
        persisted.insert("coffee".to_string(), 7);
        persisted.insert("tea".to_string(), 1);

        let (store, adjusted) = PointsStore::from_state(registry(), &persisted);

        assert_eq!(adjusted, 2);
        assert_eq!(store.get("coffee").unwrap(), 3);
        assert_eq!(store.get("snack").unwrap(), 0);
        assert!(!store.state().contains_key("tea"));
    }

    #[test]
    fn progress_reports_remaining_points() {
        let mut store = PointsStore::new(registry());
        store.increment("snack").unwrap();

        let progress = store.progress("snack").unwrap();
        assert_eq!(progress.count, 1);
        assert_eq!(progress.remaining, 1);
        assert!((progress.percent - 50.0).abs() < f64::EPSILON);
        assert!(!progress.redeemable);

        store.increment("snack").unwrap();
        assert!(store.progress("snack").unwrap().redeemable);
    }

    #[test]
    fn progress_all_covers_every_category_in_order() {
        let mut store = PointsStore::new(registry());
        store.increment("coffee").unwrap();

        let progress = store.progress_all();

        let ids: Vec<_> = progress.iter().map(|p| p.category_id.as_str()).collect();
        assert_eq!(ids, vec!["coffee", "snack"]);
        assert_eq!(progress[0].count, 1);
        assert_eq!(progress[0].remaining, 2);
        assert_eq!(progress[1], store.progress("snack").unwrap());
    }
}
