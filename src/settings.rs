//! Startup configuration: the category set and where snapshots live.
//!
//! Settings are layered: built-in defaults, then an optional TOML or JSON
//! file, then `PUNCHCARD__*` environment variables
//! (e.g. `PUNCHCARD__STORAGE__DIR=/var/lib/punchcard`).

use crate::controller::LoyaltyController;
use crate::core::{Category, CategoryRegistry, RegistryError};
use crate::persistence::{FileAdapter, PersistenceError, SnapshotFormat};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "PUNCHCARD";

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Complete startup configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_categories")]
    pub categories: Vec<CategorySettings>,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// One configured reward category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySettings {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub max_points: u32,
    #[serde(default)]
    pub marker: String,
    pub reward_description: String,
}

/// Where and how snapshots are stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub format: SnapshotFormat,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            format: SnapshotFormat::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    ///
    /// A missing file is not an error; the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(
            categories = settings.categories.len(),
            dir = %settings.storage.dir.display(),
            format = ?settings.storage.format,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Build the validated category registry.
    pub fn registry(&self) -> Result<Arc<CategoryRegistry>, RegistryError> {
        let categories = self
            .categories
            .iter()
            .map(|c| {
                let name = if c.name.is_empty() { &c.id } else { &c.name };
                Category::new(
                    c.id.clone(),
                    name.clone(),
                    c.max_points,
                    c.marker.clone(),
                    c.reward_description.clone(),
                )
            })
            .collect();
        CategoryRegistry::new(categories).map(Arc::new)
    }

    /// Adapter for the configured storage directory and format.
    pub fn file_adapter(&self) -> FileAdapter {
        FileAdapter::new(self.storage.dir.clone(), self.storage.format)
    }

    /// Open the configured card, loading whatever snapshot is on disk.
    pub fn open_card(&self) -> Result<LoyaltyController<FileAdapter>, SettingsError> {
        let registry = self.registry()?;
        Ok(LoyaltyController::load(registry, self.file_adapter())?)
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("punchcard-data")
}

fn default_categories() -> Vec<CategorySettings> {
    let category = |id: &str, name: &str, max_points, marker: &str, reward: &str| {
        CategorySettings {
            id: id.to_string(),
            name: name.to_string(),
            max_points,
            marker: marker.to_string(),
            reward_description: reward.to_string(),
        }
    };

    vec![
        category("coffee", "Caffè", 10, "☕", "Caffè gratuito"),
        category("breakfast", "Colazione", 8, "🥐", "Colazione gratuita"),
        category("aperitivo", "Aperitivo", 6, "🍹", "Aperitivo con stuzzichini gratuito"),
        category("snack", "Merendina", 5, "🍪", "Merendina per bambini gratuita"),
    ]
}
