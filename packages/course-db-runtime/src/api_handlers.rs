//! API request handlers

use std::sync::Arc;

use course_db_core::database::Database;

use crate::api_request::ApiRequest;

/// Applies API requests to the database and sends back the results.
pub struct ApiHandlers {
    /// Database instance
    database: Arc<Database>,
}

impl ApiHandlers {
    /// Create new API handlers
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Handle API request
    ///
    /// Operation failures go to the caller through the response channel;
    /// a closed channel only means the caller stopped waiting.
    pub fn handle_api_request(&self, req: ApiRequest) {
        match req {
            ApiRequest::ListCourses { query, response } => {
                tracing::debug!("Listing courses with {:?}", query);
                let _ = response.send(self.database.list_courses(&query));
            }
            ApiRequest::RetrieveCourse { id, response } => {
                tracing::debug!("Retrieving course {}", id);
                let _ = response.send(self.database.get_course(id));
            }
            ApiRequest::CreateCourse { course, response } => {
                let result = self.database.create_course(course);
                match &result {
                    Ok(created) => tracing::info!("Created course {}", created.id),
                    Err(e) => tracing::warn!("Failed to create course: {}", e),
                }
                let _ = response.send(result);
            }
            ApiRequest::UpdateCourse {
                id,
                patch,
                response,
            } => {
                let result = self.database.update_course(id, patch);
                match &result {
                    Ok(_) => tracing::info!("Updated course {}", id),
                    Err(e) => tracing::debug!("Failed to update course {}: {}", id, e),
                }
                let _ = response.send(result);
            }
            ApiRequest::DeleteCourse { id, response } => {
                let result = self.database.delete_course(id).map(|_| ());
                match &result {
                    Ok(()) => tracing::info!("Deleted course {}", id),
                    Err(e) => tracing::debug!("Failed to delete course {}: {}", id, e),
                }
                let _ = response.send(result);
            }
        }
    }
}
