//! Controller that accrues points and redeems rewards.

use crate::core::{
    CardHolder, CategoryProgress, CategoryRegistry, LoyaltyError, PointsStore, QrPayload,
    RewardHistory, RewardRecord,
};
use crate::persistence::{PersistenceAdapter, PersistenceError, Snapshot};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a successful `add_point`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointAdded {
    pub category_id: String,
    /// Count after the point was added
    pub count: u32,
    pub max_points: u32,
}

impl PointAdded {
    /// Points still missing before the reward can be claimed.
    pub fn remaining(&self) -> u32 {
        self.max_points.saturating_sub(self.count)
    }

    /// Whether this point filled the category.
    pub fn is_redeemable(&self) -> bool {
        self.count >= self.max_points
    }
}

/// Loyalty card controller.
///
/// Owns the point counters, the reward history and the holder identity, and
/// persists a snapshot through the injected adapter after every mutation. A mutation is only
/// committed in memory once its snapshot has been saved, so every failure
/// path leaves the card exactly as it was.
pub struct LoyaltyController<P: PersistenceAdapter> {
    points: PointsStore,
    history: RewardHistory,
    holder: CardHolder,
    adapter: P,
}

impl<P: PersistenceAdapter> LoyaltyController<P> {
    /// Load the card from the adapter.
    ///
    /// A record that cannot be decoded starts out empty while the others are
    /// kept. Failures to reach the storage at all are returned.
    pub fn load(registry: Arc<CategoryRegistry>, adapter: P) -> Result<Self, PersistenceError> {
        let snapshot = Snapshot {
            points: or_default_if_malformed(adapter.load_points())?,
            history: or_default_if_malformed(adapter.load_history())?,
            holder: or_default_if_malformed(adapter.load_holder())?,
        };
        Ok(Self::from_snapshot(registry, adapter, snapshot))
    }

    /// Load the card from the adapter, surfacing any unusable record.
    pub fn open(registry: Arc<CategoryRegistry>, adapter: P) -> Result<Self, PersistenceError> {
        let snapshot = adapter.load()?;
        Ok(Self::from_snapshot(registry, adapter, snapshot))
    }

    fn from_snapshot(registry: Arc<CategoryRegistry>, adapter: P, snapshot: Snapshot) -> Self {
        let (points, adjusted) = PointsStore::from_state(registry, &snapshot.points);
        if adjusted > 0 {
            warn!(adjusted, "persisted points did not match the category set");
        }

        info!(
            categories = points.registry().len(),
            rewards = snapshot.history.len(),
            "loyalty card loaded"
        );

        Self {
            points,
            history: snapshot.history,
            holder: snapshot.holder,
            adapter,
        }
    }

    /// Add one point to a category and persist the result.
    ///
    /// Fails with [`LoyaltyError::CategoryFull`] when the category already
    /// holds its maximum; the reward must be redeemed first.
    pub fn add_point(&mut self, category_id: &str) -> Result<PointAdded, LoyaltyError> {
        let mut points = self.points.clone();
        let count = points.increment(category_id)?;
        let max_points = points.registry().max_points_of(category_id)?;

        self.commit(points, self.history.clone(), self.holder.clone())?;

        debug!(category = %category_id, count, max_points, "point added");
        Ok(PointAdded {
            category_id: category_id.to_string(),
            count,
            max_points,
        })
    }

    /// Exchange a full category for its reward.
    ///
    /// Records the redemption, resets the category to zero and persists both
    /// as one operation. Fails with [`LoyaltyError::InsufficientPoints`] when
    /// the category is not full.
    pub fn redeem_reward(&mut self, category_id: &str) -> Result<RewardRecord, LoyaltyError> {
        let category = self.points.registry().describe(category_id)?.clone();
        let have = self.points.get(category_id)?;
        if have < category.max_points {
            return Err(LoyaltyError::InsufficientPoints {
                id: category.id,
                have,
                need: category.max_points,
            });
        }

        let record = RewardRecord::new(&category, Utc::now());

        let mut history = self.history.clone();
        history.record(record.clone());
        let mut points = self.points.clone();
        points.reset(category_id)?;

        self.commit(points, history, self.holder.clone())?;

        info!(
            category = %category.id,
            reward = %category.reward_description,
            total = self.history.len(),
            "reward redeemed"
        );
        Ok(record)
    }

    /// Wipe all points, history and holder identity, both stored and in memory.
    pub fn reset(&mut self) -> Result<(), LoyaltyError> {
        self.adapter.clear().map_err(|e| {
            warn!(error = %e, "stored snapshot could not be cleared");
            e
        })?;

        self.points = PointsStore::new(Arc::clone(self.points.registry()));
        self.history = RewardHistory::new();
        self.holder = CardHolder::default();

        info!("loyalty card reset");
        Ok(())
    }

    /// Set the holder's display name and persist it.
    ///
    /// Blank names are ignored and return `Ok(false)` without writing.
    pub fn set_holder_name(&mut self, name: &str) -> Result<bool, LoyaltyError> {
        let mut holder = self.holder.clone();
        if !holder.set_name(name) {
            return Ok(false);
        }

        self.commit(self.points.clone(), self.history.clone(), holder)?;
        debug!(name = %self.holder.display_name(), "holder name set");
        Ok(true)
    }

    /// Card number, generated and persisted on first call.
    pub fn card_number(&mut self) -> Result<String, LoyaltyError> {
        if let Some(number) = self.holder.card_number() {
            return Ok(number.to_string());
        }

        let mut holder = self.holder.clone();
        let number = holder.ensure_card_number().to_string();
        self.commit(self.points.clone(), self.history.clone(), holder)?;

        info!("card number assigned");
        Ok(number)
    }

    /// Data for the card's QR code, stamped with the current time.
    pub fn qr_payload(&mut self) -> Result<QrPayload, LoyaltyError> {
        let number = self.card_number()?;
        Ok(QrPayload::new(&number, self.holder.display_name(), Utc::now()))
    }

    pub fn holder(&self) -> &CardHolder {
        &self.holder
    }

    /// Current state, as persisted.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            points: self.points.state(),
            history: self.history.clone(),
            holder: self.holder.clone(),
        }
    }

    /// Current count of a category.
    pub fn count(&self, category_id: &str) -> Result<u32, LoyaltyError> {
        self.points.get(category_id)
    }

    pub fn progress(&self, category_id: &str) -> Result<CategoryProgress, LoyaltyError> {
        self.points.progress(category_id)
    }

    /// Progress of every category, in configured order.
    pub fn progress_all(&self) -> Vec<CategoryProgress> {
        self.points.progress_all()
    }

    pub fn history(&self) -> &RewardHistory {
        &self.history
    }

    pub fn registry(&self) -> &CategoryRegistry {
        self.points.registry()
    }

    pub fn adapter(&self) -> &P {
        &self.adapter
    }

    pub fn into_adapter(self) -> P {
        self.adapter
    }

    /// Save the candidate state, then make it current.
    fn commit(
        &mut self,
        points: PointsStore,
        history: RewardHistory,
        holder: CardHolder,
    ) -> Result<(), LoyaltyError> {
        let snapshot = Snapshot {
            points: points.state(),
            history,
            holder,
        };

        if let Err(e) = self.adapter.save(&snapshot) {
            warn!(error = %e, "snapshot write rejected, change discarded");
            return Err(e.into());
        }

        self.points = points;
        self.history = snapshot.history;
        self.holder = snapshot.holder;
        Ok(())
    }
}

fn or_default_if_malformed<T: Default>(
    loaded: Result<T, PersistenceError>,
) -> Result<T, PersistenceError> {
    match loaded {
        Err(e) if e.is_malformed() => {
            warn!(error = %e, "stored record unusable, starting it empty");
            Ok(T::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;
    use crate::persistence::{MemoryAdapter, HISTORY_RECORD, HOLDER_RECORD, POINTS_RECORD};

    fn registry() -> Arc<CategoryRegistry> {
        Arc::new(
            CategoryRegistry::new(vec![
                Category::new("coffee", "Caffè", 3, "☕", "Caffè gratuito"),
                Category::new("snack", "Merendina", 2, "🍪", "Merendina gratuita"),
            ])
            .unwrap(),
        )
    }

    fn controller() -> LoyaltyController<MemoryAdapter> {
        LoyaltyController::load(registry(), MemoryAdapter::new()).unwrap()
    }

    #[test]
    fn add_point_reports_new_count_and_persists() {
        let mut card = controller();

        let added = card.add_point("coffee").unwrap();

        assert_eq!(added.count, 1);
        assert_eq!(added.remaining(), 2);
        assert!(!added.is_redeemable());
        assert_eq!(card.adapter().writes(), 1);
        assert_eq!(card.adapter().load().unwrap(), card.snapshot());
    }

    #[test]
    fn last_point_makes_category_redeemable() {
        let mut card = controller();
        card.add_point("snack").unwrap();
        let added = card.add_point("snack").unwrap();

        assert!(added.is_redeemable());
        assert!(card.progress("snack").unwrap().redeemable);
    }

    #[test]
    fn full_category_rejects_points_without_writing() {
        let mut card = controller();
        card.add_point("snack").unwrap();
        card.add_point("snack").unwrap();

        let err = card.add_point("snack").unwrap_err();

        assert!(matches!(err, LoyaltyError::CategoryFull { .. }));
        assert_eq!(card.count("snack").unwrap(), 2);
        assert_eq!(card.adapter().writes(), 2);
    }

    #[test]
    fn redeem_resets_and_records() {
        let mut card = controller();
        for _ in 0..3 {
            card.add_point("coffee").unwrap();
        }

        let record = card.redeem_reward("coffee").unwrap();

        assert_eq!(record.category_id, "coffee");
        assert_eq!(record.reward_description, "Caffè gratuito");
        assert_eq!(card.count("coffee").unwrap(), 0);
        assert_eq!(card.history().latest(), Some(&record));
        assert_eq!(card.adapter().load().unwrap(), card.snapshot());
    }

    #[test]
    fn redeem_before_full_is_rejected() {
        let mut card = controller();
        card.add_point("coffee").unwrap();

        let err = card.redeem_reward("coffee").unwrap_err();

        assert!(matches!(
            err,
            LoyaltyError::InsufficientPoints { have: 1, need: 3, .. }
        ));
        assert_eq!(card.count("coffee").unwrap(), 1);
        assert!(card.history().is_empty());
    }

    #[test]
    fn unknown_category_is_rejected_everywhere() {
        let mut card = controller();

        assert!(matches!(
            card.add_point("tea"),
            Err(LoyaltyError::UnknownCategory { .. })
        ));
        assert!(matches!(
            card.redeem_reward("tea"),
            Err(LoyaltyError::UnknownCategory { .. })
        ));
        assert!(card.progress("tea").is_err());
        assert_eq!(card.adapter().writes(), 0);
    }

    #[test]
    fn failed_write_leaves_state_unchanged() {
        let mut card = controller();
        card.add_point("snack").unwrap();
        card.add_point("snack").unwrap();
        let before = card.snapshot();

        let mut adapter = card.into_adapter();
        adapter.set_fail_writes(true);
        let mut card = LoyaltyController::load(registry(), adapter).unwrap();

        assert!(matches!(
            card.add_point("coffee"),
            Err(LoyaltyError::Persistence(_))
        ));
        assert!(matches!(
            card.redeem_reward("snack"),
            Err(LoyaltyError::Persistence(_))
        ));
        assert!(card.reset().is_err());
        assert!(card.set_holder_name("Anna").is_err());
        assert!(card.card_number().is_err());
        assert_eq!(card.snapshot(), before);
    }

    #[test]
    fn reset_wipes_memory_and_storage() {
        let mut card = controller();
        card.add_point("snack").unwrap();
        card.add_point("snack").unwrap();
        card.redeem_reward("snack").unwrap();
        card.add_point("coffee").unwrap();

        card.reset().unwrap();

        assert!(card.history().is_empty());
        assert!(card.snapshot().points.values().all(|&count| count == 0));
        assert!(card.adapter().record(POINTS_RECORD).is_none());
        assert!(card.adapter().record(HISTORY_RECORD).is_none());
    }

    #[test]
    fn reset_forgets_the_holder() {
        let mut card = controller();
        card.set_holder_name("Giulia Rossi").unwrap();
        card.card_number().unwrap();

        card.reset().unwrap();

        assert_eq!(card.holder(), &CardHolder::default());
        assert!(card.adapter().record(HOLDER_RECORD).is_none());
    }

    #[test]
    fn load_defaults_only_the_malformed_record() {
        let mut source = controller();
        for _ in 0..2 {
            source.add_point("snack").unwrap();
        }
        source.redeem_reward("snack").unwrap();
        source.set_holder_name("Luca").unwrap();
        let history = source.history().clone();

        let adapter = source.into_adapter().with_record(POINTS_RECORD, "{garbage");
        let mut card = LoyaltyController::load(registry(), adapter).unwrap();

        assert_eq!(card.count("snack").unwrap(), 0);
        assert_eq!(card.history(), &history);
        assert_eq!(card.holder().display_name(), "Luca");

        card.add_point("coffee").unwrap();
        let stored = card.adapter().load().unwrap();
        assert_eq!(stored.history, history);
        assert_eq!(stored.points["coffee"], 1);
    }

    #[test]
    fn load_propagates_unreachable_storage() {
        let mut adapter = MemoryAdapter::new();
        adapter.set_fail_reads(true);

        let err = LoyaltyController::load(registry(), adapter).err().unwrap();

        assert!(matches!(err, PersistenceError::Unavailable(_)));
    }

    #[test]
    fn open_surfaces_malformed_snapshot() {
        let adapter = MemoryAdapter::new().with_record(POINTS_RECORD, "{\"coffee\":");

        let err = LoyaltyController::open(registry(), adapter).err().unwrap();

        assert!(err.is_malformed());
    }

    #[test]
    fn load_clamps_out_of_range_points() {
        let adapter = MemoryAdapter::new().with_record(POINTS_RECORD, r#"{"coffee": 9, "tea": 2}"#);

        let card = LoyaltyController::load(registry(), adapter).unwrap();

        assert_eq!(card.count("coffee").unwrap(), 3);
        assert!(!card.snapshot().points.contains_key("tea"));
    }

    #[test]
    fn progress_all_follows_registry_order() {
        let mut card = controller();
        card.add_point("snack").unwrap();

        let progress = card.progress_all();

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].category_id, "coffee");
        assert_eq!(progress[1].category_id, "snack");
        assert_eq!(progress[1].count, 1);
    }

    #[test]
    fn holder_identity_persists_across_loads() {
        let mut card = controller();

        assert!(!card.set_holder_name("   ").unwrap());
        assert_eq!(card.adapter().writes(), 0);

        assert!(card.set_holder_name("  Giulia Rossi ").unwrap());
        let number = card.card_number().unwrap();
        assert_eq!(card.card_number().unwrap(), number);
        assert_eq!(card.adapter().writes(), 2);

        let reloaded = LoyaltyController::load(registry(), card.into_adapter()).unwrap();
        assert_eq!(reloaded.holder().name.as_deref(), Some("Giulia Rossi"));
        assert_eq!(reloaded.holder().initials().as_deref(), Some("GR"));
        assert_eq!(reloaded.holder().card_number(), Some(number.as_str()));
    }

    #[test]
    fn qr_payload_uses_default_name_and_compact_number() {
        let mut card = controller();

        let payload = card.qr_payload().unwrap();

        assert_eq!(payload.user_name, "Cliente");
        assert_eq!(payload.card_number.len(), 12);
        assert!(payload.card_number.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            card.holder().card_number().map(|n| n.replace(' ', "")),
            Some(payload.card_number)
        );
    }
}
