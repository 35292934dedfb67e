//! Request utilities for HTTP endpoints.

use std::convert::Infallible;

use futures_util::stream;
use http_body_util::BodyExt;
use hyper::header::CONTENT_TYPE;
use hyper::{body::Bytes, Request, Response};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::time;

use crate::router::{AppState, RouterError};
use course_db_core::error::DbError;
use course_db_core::table::QueryParams;
use course_db_runtime::{ApiRequest, ResponseSender};

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Helper function to read request body with timeout
pub async fn read_request_body_with_timeout(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Bytes, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, req.collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Failed to read request body: {}", e)))?;
    Ok(body.to_bytes())
}

/// Helper function to wait for response with timeout
pub async fn wait_for_response_with_timeout<T>(
    rx: oneshot::Receiver<T>,
    timeout_ms: u64,
) -> Result<T, RouterError> {
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    time::timeout(timeout_duration, rx)
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| RouterError::InternalError(format!("Response channel closed: {}", e)))
}

/// Sends a request to the runtime and waits for its answer.
///
/// `build` receives the oneshot sender the runtime will answer on.
pub async fn dispatch<T, F>(state: &AppState, build: F) -> Result<T, RouterError>
where
    F: FnOnce(ResponseSender<T>) -> ApiRequest,
{
    let (tx, rx) = oneshot::channel();
    state
        .api_tx
        .send(build(tx))
        .await
        .map_err(|e| RouterError::InternalError(format!("Channel closed: {}", e)))?;

    wait_for_response_with_timeout(rx, state.config.response_timeout_ms)
        .await?
        .map_err(map_db_error_to_router_error)
}

/// Map DbError to appropriate RouterError
pub fn map_db_error_to_router_error(e: DbError) -> RouterError {
    match e {
        DbError::RecordNotFound { .. } => RouterError::NotFound(e.to_string()),
        DbError::InvalidField { .. } => RouterError::BadRequest(e.to_string()),
        DbError::QueueFull { .. } => RouterError::Unavailable(e.to_string()),
        DbError::Timeout => RouterError::Timeout,
        _ => RouterError::InternalError(format!("Runtime error: {}", e)),
    }
}

/// Parses the `{id}` route parameter.
///
/// A missing or non-numeric id cannot name a stored course, so it is
/// reported as not found rather than as a bad request.
pub fn parse_course_id(params: &MatchitParams<'_, '_>) -> Result<u64, RouterError> {
    let raw = params.get("id").unwrap_or_default();
    raw.parse()
        .map_err(|_| RouterError::NotFound(format!("Course '{}' not found", raw)))
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Serializes `value` and builds a JSON response.
pub fn json_response<T: Serialize>(status: u16, value: &T) -> Result<Response<Bytes>, RouterError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| RouterError::InternalError(format!("Failed to serialize response: {}", e)))?;
    build_response(status, json)
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Splits an `application/x-www-form-urlencoded` string into decoded pairs.
///
/// `+` decodes to a space. Pairs without `=` get an empty value.
fn form_pairs(input: &str) -> impl Iterator<Item = (String, String)> + '_ {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_form_component(key), decode_form_component(value))
        })
}

fn decode_form_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Parse query parameters from URL query string.
///
/// Recognises `name` (exact match), `limit` and `offset`; other keys are
/// ignored. An empty `name` applies no filter. Repeated keys keep the last value.
pub fn parse_query_params(query_str: Option<&str>) -> Result<QueryParams, RouterError> {
    let mut params = QueryParams::default();

    for (key, value) in form_pairs(query_str.unwrap_or_default()) {
        match key.as_str() {
            "name" => {
                params.name = (!value.is_empty()).then_some(value);
            }
            "limit" => {
                params.limit = Some(value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid limit value '{}': {}", value, e))
                })?);
            }
            "offset" => {
                params.offset = Some(value.parse().map_err(|e| {
                    RouterError::BadRequest(format!("Invalid offset value '{}': {}", value, e))
                })?);
            }
            _ => {}
        }
    }

    Ok(params)
}

/// Body encodings accepted by the course write endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
    Multipart { boundary: String },
}

impl BodyFormat {
    /// Picks the decoder from a `Content-Type` header. Anything unrecognised is JSON.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, RouterError> {
        let Some(content_type) = content_type else {
            return Ok(BodyFormat::Json);
        };
        let mime = content_type.split(';').next().unwrap_or_default().trim();

        if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Ok(BodyFormat::Form)
        } else if mime.eq_ignore_ascii_case("multipart/form-data") {
            let boundary = multer::parse_boundary(content_type).map_err(multipart_error)?;
            Ok(BodyFormat::Multipart { boundary })
        } else {
            Ok(BodyFormat::Json)
        }
    }
}

/// Decodes a request body into a field map.
///
/// JSON bodies must be an object. Form and multipart bodies yield string
/// values; multipart file parts are skipped. An empty body is an empty map.
pub async fn parse_body_fields(
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Map<String, Value>, RouterError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match BodyFormat::from_content_type(content_type)? {
        BodyFormat::Json => parse_json_fields(&body),
        BodyFormat::Form => {
            let text = std::str::from_utf8(&body)
                .map_err(|e| RouterError::BadRequest(format!("Form body is not UTF-8: {}", e)))?;
            Ok(form_pairs(text)
                .map(|(key, value)| (key, Value::String(value)))
                .collect())
        }
        BodyFormat::Multipart { boundary } => parse_multipart_fields(body, boundary).await,
    }
}

fn parse_json_fields(body: &[u8]) -> Result<Map<String, Value>, RouterError> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(RouterError::BadRequest(
            "Expected a JSON object".to_string(),
        )),
        Err(e) => Err(RouterError::BadRequest(format!(
            "Failed to parse request: {}",
            e
        ))),
    }
}

async fn parse_multipart_fields(
    body: Bytes,
    boundary: String,
) -> Result<Map<String, Value>, RouterError> {
    let stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut fields = Map::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await.map_err(multipart_error)?;
        fields.insert(name, Value::String(value));
    }

    Ok(fields)
}

fn multipart_error(e: multer::Error) -> RouterError {
    RouterError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Reads and decodes the body of a course write request.
pub async fn read_body_fields(
    req: Request<hyper::body::Incoming>,
    timeout_ms: u64,
) -> Result<Map<String, Value>, RouterError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = read_request_body_with_timeout(req, timeout_ms).await?;
    parse_body_fields(content_type.as_deref(), body).await
}
