//! Core loyalty card types and logic.
//!
//! This module contains the pure core of the card:
//! - Category definitions and the fixed registry
//! - Bounded per-category point counters
//! - The append-only redemption history
//! - The card holder's identity
//!
//! Nothing here performs I/O; persistence lives in [`crate::persistence`]
//! and orchestration in [`crate::controller`].

mod category;
mod error;
mod history;
mod holder;
mod points;

pub use category::{Category, CategoryIssue, CategoryRegistry, RegistryError};
pub use error::LoyaltyError;
pub use history::{RewardHistory, RewardRecord};
pub use holder::{generate_card_number, CardHolder, QrPayload, DEFAULT_HOLDER_NAME};
pub use points::{CategoryProgress, PointsState, PointsStore};
