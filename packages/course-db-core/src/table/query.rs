//! Filtered and paginated reads over a table.

use super::Table;
use crate::record::{Course, Record};

/// List query: exact-match filters plus optional pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Exact, case-sensitive name filter
    pub name: Option<String>,
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Number of matching records to skip
    pub offset: Option<usize>,
}

impl QueryParams {
    /// Query matching every course whose name equals `name`.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns true if the course passes every filter.
    pub fn matches(&self, course: &Course) -> bool {
        match &self.name {
            Some(name) => course.name == *name,
            None => true,
        }
    }
}

impl<R: Record> Table<R> {
    /// Queries records in id order with a predicate and pagination window.
    ///
    /// # Arguments
    /// * `predicate` - Row filter
    /// * `limit` - Maximum number of records to return
    /// * `offset` - Number of matching records to skip
    ///
    /// # Performance
    /// - O(n) where n is number of records
    pub fn query<P>(&self, predicate: P, limit: Option<usize>, offset: Option<usize>) -> Vec<R>
    where
        P: Fn(&R) -> bool,
    {
        self.iter()
            .filter(|&record| predicate(record))
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

impl Table<Course> {
    /// Runs a course list query.
    pub fn query_courses(&self, params: &QueryParams) -> Vec<Course> {
        self.query(|course| params.matches(course), params.limit, params.offset)
    }
}
