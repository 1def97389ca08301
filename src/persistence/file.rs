//! Directory-backed adapter storing one file per record.

use super::{
    encode_records, PersistenceAdapter, PersistenceError, Snapshot, SnapshotFormat, RECORDS,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores `points.<ext>`, `history.<ext>` and `holder.<ext>` inside a directory.
///
/// A save stages every record in a temporary file before renaming any of
/// them into place. If a rename fails part way, the records already replaced
/// are restored from their previous contents, so a failed save leaves the
/// directory holding the last complete snapshot.
#[derive(Clone, Debug)]
pub struct FileAdapter {
    dir: PathBuf,
    format: SnapshotFormat,
}

/// Contents of a record before a mutation, `None` if it did not exist.
type Previous = (&'static str, Option<Vec<u8>>);

impl FileAdapter {
    pub fn new(dir: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a named record.
    pub fn record_path(&self, record: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", record, self.format.extension()))
    }

    fn temp_path(&self, record: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.tmp", record, self.format.extension()))
    }

    fn read_all(&self) -> Result<Vec<Previous>, PersistenceError> {
        RECORDS
            .iter()
            .map(|&record| self.read_record(record).map(|bytes| (record, bytes)))
            .collect()
    }

    fn write_record(&self, record: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.record_path(record);
        let temp_path = self.temp_path(record);

        fs::write(&temp_path, bytes).map_err(|e| PersistenceError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| PersistenceError::io(&path, e))?;
        Ok(())
    }

    fn remove_record(&self, record: &str) -> Result<(), PersistenceError> {
        let path = self.record_path(record);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    fn discard(staged: &[(&'static str, PathBuf)]) {
        for (_, temp_path) in staged {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to discard staged record"
                );
            }
        }
    }

    /// Put records back the way they were before a failed mutation.
    fn restore(&self, previous: &[Previous]) {
        for (record, bytes) in previous {
            let restored = match bytes {
                Some(bytes) => self.write_record(record, bytes),
                None => self.remove_record(record),
            };
            if let Err(e) = restored {
                tracing::warn!(record, error = %e, "failed to restore record");
            }
        }
    }
}

impl PersistenceAdapter for FileAdapter {
    fn format(&self) -> SnapshotFormat {
        self.format
    }

    fn read_record(&self, record: &'static str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.record_path(record);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let encoded = encode_records(self.format, snapshot)?;
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;
        let previous = self.read_all()?;

        let mut staged = Vec::with_capacity(encoded.len());
        for (record, bytes) in &encoded {
            let temp_path = self.temp_path(record);
            if let Err(e) = fs::write(&temp_path, bytes) {
                Self::discard(&staged);
                return Err(PersistenceError::io(temp_path, e));
            }
            staged.push((*record, temp_path));
        }

        for (done, (record, temp_path)) in staged.iter().enumerate() {
            let path = self.record_path(record);
            if let Err(e) = fs::rename(temp_path, &path) {
                Self::discard(&staged[done..]);
                self.restore(&previous[..done]);
                return Err(PersistenceError::io(path, e));
            }
        }

        tracing::debug!(dir = %self.dir.display(), format = ?self.format, "snapshot written");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        let previous = self.read_all()?;

        for (done, record) in RECORDS.iter().enumerate() {
            if let Err(e) = self.remove_record(record) {
                self.restore(&previous[..done]);
                return Err(e);
            }
        }

        tracing::debug!(dir = %self.dir.display(), "snapshot cleared");
        Ok(())
    }
}
