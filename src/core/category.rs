//! Reward categories and the fixed registry describing them.
//!
//! The registry is built once at startup and never changes afterwards.
//! Construction validates the whole category set and reports every problem
//! at once instead of stopping at the first one.

use super::error::LoyaltyError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// One independently tracked reward track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier used in snapshots and by callers
    pub id: String,
    /// Display name
    pub name: String,
    /// Points needed before the reward can be claimed
    pub max_points: u32,
    /// Short marker shown next to the reward (usually an emoji)
    pub marker: String,
    /// What the customer receives on redemption
    pub reward_description: String,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        max_points: u32,
        marker: impl Into<String>,
        reward_description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_points,
            marker: marker.into(),
            reward_description: reward_description.into(),
        }
    }
}

/// A single problem found while validating a category set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CategoryIssue {
    #[error("category set is empty")]
    NoCategories,

    #[error("category at position {position} has an empty id")]
    EmptyId { position: usize },

    #[error("category '{id}' must allow at least one point")]
    ZeroMaxPoints { id: String },

    #[error("category '{id}' is defined more than once")]
    DuplicateId { id: String },
}

/// Errors raised while building a [`CategoryRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid category set: {}", format_issues(.0))]
    Invalid(Vec<CategoryIssue>),
}

fn format_issues(issues: &[CategoryIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Static, read-only description of every reward category.
///
/// Iteration follows the order the categories were configured in.
#[derive(Clone, Debug)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl CategoryRegistry {
    /// Build a registry, accumulating every validation issue.
    pub fn new(categories: Vec<Category>) -> Result<Self, RegistryError> {
        match validate(&categories) {
            Validation::Success(_) => {
                let index = categories
                    .iter()
                    .enumerate()
                    .map(|(position, c)| (c.id.clone(), position))
                    .collect();
                Ok(Self { categories, index })
            }
            Validation::Failure(issues) => {
                Err(RegistryError::Invalid(issues.iter().cloned().collect()))
            }
        }
    }

    /// Look up a category by id.
    pub fn describe(&self, id: &str) -> Result<&Category, LoyaltyError> {
        self.index
            .get(id)
            .map(|&position| &self.categories[position])
            .ok_or_else(|| LoyaltyError::unknown(id))
    }

    /// Points needed to fill the given category.
    pub fn max_points_of(&self, id: &str) -> Result<u32, LoyaltyError> {
        self.describe(id).map(|c| c.max_points)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn validate(categories: &[Category]) -> Validation<Vec<()>, NonEmptyVec<CategoryIssue>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<CategoryIssue>>> = Vec::new();

    if categories.is_empty() {
        checks.push(Validation::fail(CategoryIssue::NoCategories));
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (position, category) in categories.iter().enumerate() {
        if category.id.trim().is_empty() {
            checks.push(Validation::fail(CategoryIssue::EmptyId { position }));
            continue;
        }

        if category.max_points == 0 {
            checks.push(Validation::fail(CategoryIssue::ZeroMaxPoints {
                id: category.id.clone(),
            }));
        }

        let occurrences = seen.entry(category.id.as_str()).or_insert(0);
        *occurrences += 1;
        // Report each duplicated id once.
        if *occurrences == 2 {
            checks.push(Validation::fail(CategoryIssue::DuplicateId {
                id: category.id.clone(),
            }));
        }
    }

    Validation::all_vec(checks)
}
