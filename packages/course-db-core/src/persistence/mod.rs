//! Snapshot persistence for the database tables.
//!
//! Each table is written to `<data_dir>/<table>.json` as a versioned,
//! checksummed snapshot. Writes go through a temp file and an atomic rename.

pub mod io_utils;
mod persistence_manager;
mod snapshot_file;

pub use persistence_manager::PersistenceManager;
pub use snapshot_file::{SnapshotFile, SNAPSHOT_VERSION};

#[cfg(test)]
mod test;
