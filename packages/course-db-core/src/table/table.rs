//! Table storage and id sequence management.
//!
//! Each table has:
//! - Rows ordered by ascending id
//! - A monotonically increasing id sequence; ids are never reused

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::record::Record;

/// Serializable image of a table: its rows and the next id to hand out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot<R> {
    /// Next record ID to assign
    pub next_id: u64,
    /// Rows in ascending id order
    pub records: Vec<R>,
}

/// Ordered table of records.
#[derive(Debug)]
pub struct Table<R: Record> {
    /// Table name
    pub name: String,
    /// Rows keyed by id
    rows: BTreeMap<u64, R>,
    /// Next record ID to assign
    next_id: u64,
}

impl<R: Record> Table<R> {
    /// Creates an empty table named after the record type.
    pub fn new() -> Self {
        Self {
            name: R::TABLE.to_string(),
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Id the next insert will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Inserts a record built from `fields` under a fresh id.
    ///
    /// # Returns
    /// `Result<R, DbError>` containing the stored record.
    pub fn insert(&mut self, fields: R::Fields) -> Result<R, DbError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or_else(|| {
            DbError::DataCorruption(format!("id sequence exhausted in table '{}'", self.name))
        })?;
        let record = R::from_fields(id, fields);
        self.rows.insert(id, record.clone());
        Ok(record)
    }

    /// Looks up a record by id.
    pub fn get(&self, id: u64) -> Result<&R, DbError> {
        self.rows.get(&id).ok_or_else(|| self.not_found(id))
    }

    /// Mutates a record in place and returns its new state.
    ///
    /// The closure must not change the record's id.
    pub fn update<F>(&mut self, id: u64, f: F) -> Result<R, DbError>
    where
        F: FnOnce(&mut R),
    {
        let not_found = self.not_found(id);
        let record = self.rows.get_mut(&id).ok_or(not_found)?;
        f(record);
        debug_assert_eq!(record.id(), id);
        Ok(record.clone())
    }

    /// Removes a record by id.
    pub fn remove(&mut self, id: u64) -> Result<R, DbError> {
        self.rows.remove(&id).ok_or_else(|| self.not_found(id))
    }

    /// Iterates rows in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.values()
    }

    /// Copies the table into a serializable snapshot.
    pub fn snapshot(&self) -> TableSnapshot<R> {
        TableSnapshot {
            next_id: self.next_id,
            records: self.rows.values().cloned().collect(),
        }
    }

    /// Replaces the table contents with a snapshot.
    ///
    /// Rejects snapshots with duplicate ids or ids at or beyond `next_id`.
    pub fn restore(&mut self, snapshot: TableSnapshot<R>) -> Result<(), DbError> {
        let mut rows = BTreeMap::new();
        for record in snapshot.records {
            let id = record.id();
            if id == 0 || id >= snapshot.next_id {
                return Err(DbError::DataCorruption(format!(
                    "record id {} outside sequence (next_id={}) in table '{}'",
                    id, snapshot.next_id, self.name
                )));
            }
            if rows.insert(id, record).is_some() {
                return Err(DbError::DataCorruption(format!(
                    "duplicate record id {} in table '{}'",
                    id, self.name
                )));
            }
        }
        self.rows = rows;
        self.next_id = snapshot.next_id;
        Ok(())
    }

    fn not_found(&self, id: u64) -> DbError {
        DbError::RecordNotFound {
            table: self.name.clone(),
            id,
        }
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}
