//! Punchcard: a multi-category loyalty card
//!
//! Punchcard tracks customer progress across independent reward categories
//! (coffee, breakfast, ...), decides when a free reward may be claimed and
//! keeps an append-only history of redemptions. It follows a "pure core,
//! imperative shell" layout: the counters and history are plain values with
//! no side effects, while the controller orchestrates them and persists a
//! snapshot through an injected adapter.
//!
//! # Core Concepts
//!
//! - **Category**: one reward track with its own point cap and reward
//! - **Points**: bounded per-category counters, `0..=max_points`
//! - **Redemption**: exchanging a full category for its reward, resetting it
//! - **Snapshot**: counters plus history, as persisted
//!
//! # Example
//!
//! ```rust
//! use punchcard::controller::LoyaltyController;
//! use punchcard::core::{Category, CategoryRegistry, LoyaltyError};
//! use punchcard::persistence::MemoryAdapter;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(
//!     CategoryRegistry::new(vec![Category::new("coffee", "Caffè", 3, "☕", "Caffè gratuito")])
//!         .unwrap(),
//! );
//! let mut card = LoyaltyController::load(registry, MemoryAdapter::new()).unwrap();
//!
//! for _ in 0..3 {
//!     card.add_point("coffee").unwrap();
//! }
//! assert!(matches!(card.add_point("coffee"), Err(LoyaltyError::CategoryFull { .. })));
//!
//! let reward = card.redeem_reward("coffee").unwrap();
//! assert_eq!(reward.reward_description, "Caffè gratuito");
//! assert_eq!(card.count("coffee").unwrap(), 0);
//! ```

pub mod controller;
pub mod core;
pub mod persistence;
pub mod settings;

// Re-export commonly used types
pub use controller::{LoyaltyController, PointAdded};
pub use core::{
    CardHolder, Category, CategoryRegistry, LoyaltyError, QrPayload, RewardHistory, RewardRecord,
};
pub use persistence::{FileAdapter, MemoryAdapter, PersistenceAdapter, Snapshot};
pub use settings::Settings;
