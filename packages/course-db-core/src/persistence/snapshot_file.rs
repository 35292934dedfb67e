//! On-disk snapshot envelope.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::record::Record;
use crate::table::TableSnapshot;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Versioned snapshot with a CRC32 over the serialized `snapshot` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile<R> {
    pub version: u32,
    pub checksum: u32,
    pub snapshot: TableSnapshot<R>,
}

impl<R: Record> SnapshotFile<R> {
    /// Wraps a table snapshot, computing its checksum.
    pub fn seal(snapshot: TableSnapshot<R>) -> Result<Self, DbError> {
        let checksum = checksum(&snapshot)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            checksum,
            snapshot,
        })
    }

    /// Verifies version and checksum, returning the inner snapshot.
    pub fn open(self) -> Result<TableSnapshot<R>, DbError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(DbError::DataCorruption(format!(
                "Unsupported snapshot version: {}",
                self.version
            )));
        }
        let actual = checksum(&self.snapshot)?;
        if actual != self.checksum {
            return Err(DbError::DataCorruption(format!(
                "Checksum mismatch for table '{}': expected {:08x}, got {:08x}",
                R::TABLE,
                self.checksum,
                actual
            )));
        }
        Ok(self.snapshot)
    }
}

fn checksum<R: Record>(snapshot: &TableSnapshot<R>) -> Result<u32, DbError> {
    let bytes =
        serde_json::to_vec(snapshot).map_err(|e| DbError::SerializationError(e.to_string()))?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}
