//! Record types stored in the database tables.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DbError;

/// Decoded request body, keyed by field name.
pub type FieldMap = Map<String, Value>;

/// A row type that can live in a [`Table`](crate::table::Table).
///
/// The table owns id assignment: callers supply `Fields` and the table
/// builds the record with a freshly allocated id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Client-settable portion of the record.
    type Fields;

    /// Table name used in errors and snapshot file names.
    const TABLE: &'static str;

    /// Store-assigned identifier.
    fn id(&self) -> u64;

    /// Builds a record from an allocated id and its fields.
    fn from_fields(id: u64, fields: Self::Fields) -> Self;
}

/// A course row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
}

/// Fields for creating (or fully replacing) a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
}

impl NewCourse {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Builds a course from body fields. `name` is required; other fields are ignored.
    pub fn from_field_map(fields: &FieldMap) -> Result<Self, DbError> {
        string_field(fields, "name")?
            .map(Self::new)
            .ok_or_else(|| DbError::InvalidField {
                field: "name".to_string(),
                reason: "field is required".to_string(),
            })
    }
}

/// Partial course update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoursePatch {
    pub name: Option<String>,
}

impl CoursePatch {
    /// Builds a partial update from body fields. A missing `name` is left unchanged.
    pub fn from_field_map(fields: &FieldMap) -> Result<Self, DbError> {
        Ok(Self {
            name: string_field(fields, "name")?,
        })
    }

    /// Applies the patch in place. The id is never touched.
    pub fn apply(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name;
        }
    }
}

impl From<NewCourse> for CoursePatch {
    fn from(course: NewCourse) -> Self {
        Self {
            name: Some(course.name),
        }
    }
}

impl Record for Course {
    type Fields = NewCourse;
    const TABLE: &'static str = "courses";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_fields(id: u64, fields: NewCourse) -> Self {
        Self {
            id,
            name: fields.name,
        }
    }
}

fn string_field(fields: &FieldMap, field: &str) -> Result<Option<String>, DbError> {
    match fields.get(field) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(DbError::InvalidField {
            field: field.to_string(),
            reason: format!("expected a string, got {}", json_kind(other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A student row. Unrelated to courses; it only shares the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
}

impl NewStudent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Record for Student {
    type Fields = NewStudent;
    const TABLE: &'static str = "students";

    fn id(&self) -> u64 {
        self.id
    }

    fn from_fields(id: u64, fields: NewStudent) -> Self {
        Self {
            id,
            name: fields.name,
        }
    }
}
