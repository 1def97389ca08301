//! Snapshot persistence for the loyalty card.
//!
//! A snapshot is stored as three independent records: the point counters,
//! the reward history and the card holder. A record that was never written
//! defaults on its own, and a record that fails to decode does not take the
//! others down with it. Adapters decide where the records live; the
//! [`SnapshotFormat`] decides how they are encoded.

use crate::core::{CardHolder, PointsState, RewardHistory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod error;
mod file;
mod memory;

pub use error::PersistenceError;
pub use file::FileAdapter;
pub use memory::MemoryAdapter;

/// Name of the record holding the point counters
pub const POINTS_RECORD: &str = "points";

/// Name of the record holding the reward history
pub const HISTORY_RECORD: &str = "history";

/// Name of the record holding the card holder identity
pub const HOLDER_RECORD: &str = "holder";

/// Every record name, in write order
pub const RECORDS: [&str; 3] = [POINTS_RECORD, HISTORY_RECORD, HOLDER_RECORD];

/// Complete persisted representation of the card at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Category id to current count
    pub points: PointsState,
    /// Redemptions, newest first
    pub history: RewardHistory,
    #[serde(default)]
    pub holder: CardHolder,
}

/// Boundary responsible for durably storing and retrieving snapshots.
///
/// The controller is the only writer: it loads once at startup and saves
/// after every successful mutation. `save` and `clear` must be all-or-nothing
/// across records; a failed call leaves every stored record as it was.
pub trait PersistenceAdapter {
    /// Encoding of the stored records.
    fn format(&self) -> SnapshotFormat;

    /// Raw contents of a record, `None` if it was never written.
    fn read_record(&self, record: &'static str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace every stored record with the given snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    /// Remove every stored record.
    fn clear(&mut self) -> Result<(), PersistenceError>;

    fn load_points(&self) -> Result<PointsState, PersistenceError> {
        self.load_record(POINTS_RECORD)
    }

    fn load_history(&self) -> Result<RewardHistory, PersistenceError> {
        self.load_record(HISTORY_RECORD)
    }

    fn load_holder(&self) -> Result<CardHolder, PersistenceError> {
        self.load_record(HOLDER_RECORD)
    }

    /// Decode one record, defaulting it when absent.
    ///
    /// A record that exists but cannot be decoded yields
    /// [`PersistenceError::MalformedSnapshot`].
    fn load_record<T: DeserializeOwned + Default>(
        &self,
        record: &'static str,
    ) -> Result<T, PersistenceError> {
        match self.read_record(record)? {
            Some(bytes) => self.format().decode(record, &bytes),
            None => Ok(T::default()),
        }
    }

    /// Load all records, failing on the first unusable one.
    fn load(&self) -> Result<Snapshot, PersistenceError> {
        Ok(Snapshot {
            points: self.load_points()?,
            history: self.load_history()?,
            holder: self.load_holder()?,
        })
    }
}

/// Encoding used for stored records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Human-readable JSON
    #[default]
    Json,
    /// Compact bincode
    Binary,
}

impl SnapshotFormat {
    /// File extension for records in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "bin",
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, PersistenceError> {
        match self {
            Self::Json => serde_json::to_vec_pretty(value)
                .map_err(|e| PersistenceError::SerializationFailed(e.to_string())),
            Self::Binary => bincode::serialize(value)
                .map_err(|e| PersistenceError::SerializationFailed(e.to_string())),
        }
    }

    pub fn decode<T: DeserializeOwned>(
        self,
        record: &'static str,
        bytes: &[u8],
    ) -> Result<T, PersistenceError> {
        let malformed = |reason: String| PersistenceError::MalformedSnapshot { record, reason };
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string())),
            Self::Binary => bincode::deserialize(bytes).map_err(|e| malformed(e.to_string())),
        }
    }
}

/// Encode every record of a snapshot, in [`RECORDS`] order.
pub(crate) fn encode_records(
    format: SnapshotFormat,
    snapshot: &Snapshot,
) -> Result<Vec<(&'static str, Vec<u8>)>, PersistenceError> {
    Ok(vec![
        (POINTS_RECORD, format.encode(&snapshot.points)?),
        (HISTORY_RECORD, format.encode(&snapshot.history)?),
        (HOLDER_RECORD, format.encode(&snapshot.holder)?),
    ])
}
