//! REST API server for the course service.
//!
//! Provides HTTP endpoints for course CRUD operations and request routing.

pub mod handlers;
pub mod router;
pub mod server;
