//! Course resource handlers: list, retrieve, create, update, delete.

use hyper::{body::Bytes, Request, Response};

use crate::router::{AppState, RouterError};
use course_db_core::{CoursePatch, NewCourse};
use course_db_runtime::ApiRequest;

use super::request_utils::{
    build_empty_response, dispatch, json_response, map_db_error_to_router_error,
    parse_course_id, parse_query_params, read_body_fields, MatchitParams,
};

/// Lists courses.
///
/// # Endpoint
/// `GET /courses/`
///
/// # Query Parameters
/// - `name`: exact, case-sensitive match on the course name
/// - `limit`, `offset`: optional pagination window
///
/// # Response
/// - **200 OK**: JSON array of courses in id order
/// ```json
/// [{"id": 1, "name": "Django"}, {"id": 2, "name": "Rust"}]
/// ```
///
/// # Errors
/// - **400 Bad Request**: `limit` or `offset` is not a non-negative integer
///
/// # Example
/// ```bash
/// curl "http://localhost:8080/courses/?name=Django"
/// ```
pub async fn list_courses(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let query = parse_query_params(req.uri().query())?;

    let courses = dispatch(&state, |response| ApiRequest::ListCourses { query, response }).await?;

    json_response(200, &courses)
}

/// Retrieves a single course.
///
/// # Endpoint
/// `GET /courses/{id}/`
///
/// # Response
/// - **200 OK**: `{"id": 1, "name": "Django"}`
///
/// # Errors
/// - **404 Not Found**: No course with that id
pub async fn retrieve_course(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_course_id(&params)?;

    let course = dispatch(&state, |response| ApiRequest::RetrieveCourse { id, response }).await?;

    json_response(200, &course)
}

/// Creates a course.
///
/// # Endpoint
/// `POST /courses/`
///
/// # Request Body
/// JSON, form-encoded or multipart:
/// ```json
/// {"name": "Django"}
/// ```
///
/// # Response
/// - **201 Created**: The stored course with its assigned id
///
/// # Errors
/// - **400 Bad Request**: Body unparseable, `name` missing or not a string
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:8080/courses/ \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Django"}'
/// ```
pub async fn create_course(
    req: Request<hyper::body::Incoming>,
    _params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let fields = read_body_fields(req, state.config.request_timeout_ms).await?;
    let course = NewCourse::from_field_map(&fields).map_err(map_db_error_to_router_error)?;

    let created = dispatch(&state, |response| ApiRequest::CreateCourse { course, response }).await?;

    json_response(201, &created)
}

/// Partially updates a course.
///
/// # Endpoint
/// `PATCH /courses/{id}/`
///
/// # Request Body
/// ```json
/// {"name": "Django Advanced"}
/// ```
///
/// # Response
/// - **200 OK**: The course after the update
///
/// # Errors
/// - **400 Bad Request**: Body unparseable or `name` not a string
/// - **404 Not Found**: No course with that id
///
/// # Notes
/// - Omitting `name` leaves the course unchanged
/// - The id is never changed, even if the body carries one
pub async fn partial_update_course(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_course_id(&params)?;
    let fields = read_body_fields(req, state.config.request_timeout_ms).await?;
    let patch = CoursePatch::from_field_map(&fields).map_err(map_db_error_to_router_error)?;

    let updated = dispatch(&state, |response| ApiRequest::UpdateCourse {
        id,
        patch,
        response,
    })
    .await?;

    json_response(200, &updated)
}

/// Fully updates a course.
///
/// # Endpoint
/// `PUT /courses/{id}/`
///
/// # Response
/// - **200 OK**: The course after the update
///
/// # Errors
/// - **400 Bad Request**: Body unparseable, `name` missing or not a string
/// - **404 Not Found**: No course with that id
pub async fn replace_course(
    req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_course_id(&params)?;
    let fields = read_body_fields(req, state.config.request_timeout_ms).await?;
    let course = NewCourse::from_field_map(&fields).map_err(map_db_error_to_router_error)?;
    let patch = CoursePatch::from(course);

    let updated = dispatch(&state, |response| ApiRequest::UpdateCourse {
        id,
        patch,
        response,
    })
    .await?;

    json_response(200, &updated)
}

/// Deletes a course.
///
/// # Endpoint
/// `DELETE /courses/{id}/`
///
/// # Response
/// - **204 No Content**: Course removed
///
/// # Errors
/// - **404 Not Found**: No course with that id
pub async fn delete_course(
    _req: Request<hyper::body::Incoming>,
    params: MatchitParams<'_, '_>,
    state: AppState,
) -> Result<Response<Bytes>, RouterError> {
    let id = parse_course_id(&params)?;

    dispatch(&state, |response| ApiRequest::DeleteCourse { id, response }).await?;

    build_empty_response(204)
}
