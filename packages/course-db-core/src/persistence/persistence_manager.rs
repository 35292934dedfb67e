//! Persistence manager for table snapshot files.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::config::DbConfig;
use crate::database::Database;
use crate::error::DbError;
use crate::record::Record;
use crate::table::Table;

use super::io_utils::{classify_io_error, retry_io_operation};
use super::snapshot_file::SnapshotFile;

/// Persistence manager for table snapshot files.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// When false every operation is a no-op
    enabled: bool,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            enabled: config.persistence_enabled,
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Returns the snapshot path for a table.
    pub fn table_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", table_name))
    }

    /// Loads every table snapshot into a fresh database.
    ///
    /// Missing snapshot files leave the corresponding table empty.
    ///
    /// # Returns
    /// `Result<Database, DbError>`; `DataCorruption` if a snapshot fails validation.
    pub fn load_database(&self) -> Result<Database, DbError> {
        let db = Database::new();
        if !self.enabled {
            return Ok(db);
        }
        self.load_table(&mut *db.courses_mut()?)?;
        self.load_table(&mut *db.students_mut()?)?;
        tracing::info!(
            "Loaded {} courses and {} students from {}",
            db.course_count()?,
            db.student_count()?,
            self.data_dir.display()
        );
        Ok(db)
    }

    /// Loads one table from its snapshot file, if present.
    pub fn load_table<R: Record>(&self, table: &mut Table<R>) -> Result<(), DbError> {
        let path = self.table_path(&table.name);
        if !path.exists() {
            tracing::debug!("No snapshot for table {} at {}", table.name, path.display());
            return Ok(());
        }

        let mut file =
            File::open(&path).map_err(|e| classify_io_error(e, "Failed to open snapshot file"))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| classify_io_error(e, "Failed to read snapshot file"))?;

        let sealed: SnapshotFile<R> = serde_json::from_slice(&contents).map_err(|e| {
            DbError::DataCorruption(format!("Failed to parse snapshot {}: {}", path.display(), e))
        })?;
        table.restore(sealed.open()?)
    }

    /// Flushes every table to disk.
    ///
    /// All tables are attempted; the first error is returned. On failure the
    /// database is marked dirty again so a later flush retries the write.
    pub fn flush_all_tables(&self, db: &Database) -> Result<(), DbError> {
        if !self.enabled {
            return Ok(());
        }
        let courses = db.courses().and_then(|table| self.flush_logged(&*table));
        let students = db.students().and_then(|table| self.flush_logged(&*table));
        tracing::debug!(
            "Flush completed: courses={}, students={}",
            courses.is_ok(),
            students.is_ok()
        );
        let result = courses.and(students);
        if result.is_err() {
            db.mark_dirty();
        }
        result
    }

    /// Flushes one table to disk with retries on transient errors.
    pub fn flush_table<R: Record>(&self, table: &Table<R>) -> Result<(), DbError> {
        if !self.enabled {
            return Ok(());
        }
        let sealed = SnapshotFile::seal(table.snapshot())?;
        let json = serde_json::to_vec_pretty(&sealed)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;
        let final_path = self.table_path(&table.name);

        retry_io_operation(
            || self.write_atomically(&final_path, &json),
            self.max_retries,
            self.retry_delay_ms,
            "flush_table",
        )
    }

    fn flush_logged<R: Record>(&self, table: &Table<R>) -> Result<(), DbError> {
        self.flush_table(table).inspect_err(|e| {
            tracing::error!("Failed to flush table {}: {}", table.name, e);
        })
    }

    fn write_atomically(&self, final_path: &Path, contents: &[u8]) -> Result<(), DbError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

        let temp_path = final_path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
        file.write_all(contents)
            .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))?;

        fs::rename(&temp_path, final_path)
            .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))
    }
}
