//! Integration tests for the core store.
//!
//! 1. Course CRUD scenarios against the database container
//! 2. Persistence across a restart

mod course_scenarios;
mod helpers;
mod restart;
