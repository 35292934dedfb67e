//! Core storage for the course service.
//!
//! Provides record types, an ordered in-memory table keyed by id,
//! the database container, configuration, and snapshot persistence.

pub mod config;
pub mod database;
pub mod error;
pub mod persistence;
pub mod record;
pub mod table;

pub use database::Database;
pub use error::DbError;
pub use record::{Course, CoursePatch, FieldMap, NewCourse, NewStudent, Record, Student};
