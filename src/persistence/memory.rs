//! In-memory adapter, the test double for the card's storage.

use super::{encode_records, PersistenceAdapter, PersistenceError, Snapshot, SnapshotFormat};
use std::collections::BTreeMap;

/// Keeps every record as encoded bytes in memory.
///
/// Records go through the same encoding as on disk, so round-trip behavior
/// matches the file adapter. Reads and writes can be made to fail to
/// exercise the controller's failure paths.
#[derive(Clone, Debug, Default)]
pub struct MemoryAdapter {
    format: SnapshotFormat,
    records: BTreeMap<&'static str, Vec<u8>>,
    writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: SnapshotFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Seed raw record contents, as if written by an earlier session.
    pub fn with_record(mut self, record: &'static str, bytes: impl AsRef<[u8]>) -> Self {
        self.records.insert(record, bytes.as_ref().to_vec());
        self
    }

    /// Make every subsequent read fail.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make every subsequent `save` and `clear` fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn record(&self, record: &str) -> Option<&[u8]> {
        self.records.get(record).map(Vec::as_slice)
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes {
            return Err(PersistenceError::Unavailable(
                "memory adapter is rejecting writes".to_string(),
            ));
        }
        Ok(())
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn format(&self) -> SnapshotFormat {
        self.format
    }

    fn read_record(&self, record: &'static str) -> Result<Option<Vec<u8>>, PersistenceError> {
        if self.fail_reads {
            return Err(PersistenceError::Unavailable(
                "memory adapter is rejecting reads".to_string(),
            ));
        }
        Ok(self.records.get(record).cloned())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.check_writable()?;
        let encoded = encode_records(self.format, snapshot)?;
        self.records = encoded.into_iter().collect();
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.records.clear();
        Ok(())
    }
}
