//! Tick-based request runtime.
//!
//! HTTP handlers enqueue [`ApiRequest`]s on an mpsc channel; a single runtime
//! thread applies them to the database in arrival order and answers each one
//! through its oneshot sender.

mod api_handlers;
mod api_request;
mod runtime;

pub use api_handlers::ApiHandlers;
pub use api_request::{ApiRequest, FlushCommand};
pub use runtime::{Runtime, RuntimeStats};

use course_db_core::error::DbError;
use tokio::sync::oneshot;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Response sender for API requests
pub type ResponseSender<T> = oneshot::Sender<Result<T>>;
