//! Errors returned by loyalty card operations.

use crate::persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur when accruing or redeeming points.
///
/// `CategoryFull` and `InsufficientPoints` are expected outcomes the caller
/// surfaces to the customer. `UnknownCategory` signals a configuration or
/// programming mistake. Every variant leaves the card state untouched.
#[derive(Debug, Error)]
pub enum LoyaltyError {
    #[error("Unknown category '{id}'")]
    UnknownCategory { id: String },

    #[error("Category '{id}' is full ({max_points} points), redeem before continuing")]
    CategoryFull { id: String, max_points: u32 },

    #[error("Category '{id}' has {have} of {need} points required for a reward")]
    InsufficientPoints { id: String, have: u32, need: u32 },

    #[error("Snapshot could not be persisted: {0}")]
    Persistence(#[from] PersistenceError),
}

impl LoyaltyError {
    pub(crate) fn unknown(id: &str) -> Self {
        Self::UnknownCategory { id: id.to_string() }
    }

    /// Whether the caller can recover by doing something else first
    /// (redeeming a full category, or collecting more points).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CategoryFull { .. } | Self::InsufficientPoints { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_and_insufficient_are_recoverable() {
        let full = LoyaltyError::CategoryFull {
            id: "coffee".to_string(),
            max_points: 10,
        };
        let short = LoyaltyError::InsufficientPoints {
            id: "coffee".to_string(),
            have: 5,
            need: 10,
        };

        assert!(full.is_recoverable());
        assert!(short.is_recoverable());
        assert!(!LoyaltyError::unknown("tea").is_recoverable());
    }

    #[test]
    fn messages_name_the_category() {
        let err = LoyaltyError::CategoryFull {
            id: "snack".to_string(),
            max_points: 5,
        };
        assert_eq!(
            err.to_string(),
            "Category 'snack' is full (5 points), redeem before continuing"
        );
        assert_eq!(
            LoyaltyError::unknown("tea").to_string(),
            "Unknown category 'tea'"
        );
    }
}
