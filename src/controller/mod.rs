//! The imperative shell around the pure core.
//!
//! [`LoyaltyController`] is the only way card state changes. Each operation
//! runs to completion before the next one starts, and returns an explicit
//! outcome (new count, reward record, or error) for the presentation layer
//! to render however it likes.

mod loyalty;

pub use loyalty::{LoyaltyController, PointAdded};
