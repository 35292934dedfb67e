//! API request types and implementations

use course_db_core::error::DbError;
use course_db_core::table::QueryParams;
use course_db_core::{Course, CoursePatch, NewCourse};

use crate::ResponseSender;

/// API request from REST server
#[derive(Debug)]
pub enum ApiRequest {
    /// List courses with filtering and optional pagination
    ListCourses {
        query: QueryParams,
        response: ResponseSender<Vec<Course>>,
    },
    /// Fetch one course
    RetrieveCourse {
        id: u64,
        response: ResponseSender<Course>,
    },
    /// Insert a course
    CreateCourse {
        course: NewCourse,
        response: ResponseSender<Course>,
    },
    /// Rewrite the fields present in `patch`
    UpdateCourse {
        id: u64,
        patch: CoursePatch,
        response: ResponseSender<Course>,
    },
    /// Remove a course
    DeleteCourse {
        id: u64,
        response: ResponseSender<()>,
    },
}

impl ApiRequest {
    /// Returns true if this request changes stored data.
    pub fn is_mutation(&self) -> bool {
        match self {
            ApiRequest::ListCourses { .. } => false,
            ApiRequest::RetrieveCourse { .. } => false,
            ApiRequest::CreateCourse { .. } => true,
            ApiRequest::UpdateCourse { .. } => true,
            ApiRequest::DeleteCourse { .. } => true,
        }
    }

    /// Answers the request with an error without executing it.
    pub fn reject(self, error: DbError) {
        // A dropped receiver means the caller gave up; nothing to do.
        // List and delete stay separate arms: their senders carry other payload types.
        match self {
            ApiRequest::RetrieveCourse { response, .. }
            | ApiRequest::CreateCourse { response, .. }
            | ApiRequest::UpdateCourse { response, .. } => {
                let _ = response.send(Err(error));
            }
            ApiRequest::ListCourses { response, .. } => {
                let _ = response.send(Err(error));
            }
            ApiRequest::DeleteCourse { response, .. } => {
                let _ = response.send(Err(error));
            }
        }
    }
}

/// Persistence flush command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushCommand {
    /// Flush all tables
    FlushAll,
}
