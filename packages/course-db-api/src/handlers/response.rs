//! JSON error envelope returned by every failed request.

use serde::Serialize;

/// Error payload inside the envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// HTTP status as a string, e.g. `"404"`
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `{"success": false, "error": {...}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ApiError,
}

/// Builds the envelope for `status`.
pub fn error_response(status: u16, message: String, details: Option<String>) -> ErrorResponse {
    ErrorResponse {
        success: false,
        error: ApiError {
            code: status.to_string(),
            message,
            details,
        },
    }
}
