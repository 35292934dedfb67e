//! HTTP endpoint implementations.

mod course_handlers;
pub mod request_utils;
pub mod response;

pub use course_handlers::{
    create_course, delete_course, list_courses, partial_update_course, replace_course,
    retrieve_course,
};
pub use response::{error_response, ApiError, ErrorResponse};
