//! Database container holding the course and student tables.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::DbError;
use crate::record::{Course, CoursePatch, NewCourse, NewStudent, Student};
use crate::table::{QueryParams, Table};

/// Database container. Each table sits behind its own lock, so course
/// operations never contend with student operations.
#[derive(Debug, Default)]
pub struct Database {
    courses: RwLock<Table<Course>>,
    students: RwLock<Table<Student>>,
    /// Set by every mutation, cleared when a flush is scheduled
    dirty: AtomicBool,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a course with a freshly assigned id.
    ///
    /// # Returns
    /// `Result<Course, DbError>` containing the stored course.
    pub fn create_course(&self, course: NewCourse) -> Result<Course, DbError> {
        let created = self.courses_mut()?.insert(course)?;
        self.mark_dirty();
        Ok(created)
    }

    /// Fetches a course by id.
    pub fn get_course(&self, id: u64) -> Result<Course, DbError> {
        self.courses()?.get(id).cloned()
    }

    /// Lists courses matching the query, in id order.
    pub fn list_courses(&self, query: &QueryParams) -> Result<Vec<Course>, DbError> {
        Ok(self.courses()?.query_courses(query))
    }

    /// Applies a partial update to a course.
    ///
    /// # Returns
    /// `Result<Course, DbError>` containing the course after the update.
    pub fn update_course(&self, id: u64, patch: CoursePatch) -> Result<Course, DbError> {
        let updated = self
            .courses_mut()?
            .update(id, |course| patch.apply(course))?;
        self.mark_dirty();
        Ok(updated)
    }

    /// Deletes a course by id.
    pub fn delete_course(&self, id: u64) -> Result<Course, DbError> {
        let removed = self.courses_mut()?.remove(id)?;
        self.mark_dirty();
        Ok(removed)
    }

    /// Number of stored courses.
    pub fn course_count(&self) -> Result<usize, DbError> {
        Ok(self.courses()?.len())
    }

    /// Creates a student with a freshly assigned id.
    pub fn create_student(&self, student: NewStudent) -> Result<Student, DbError> {
        let created = self.students_mut()?.insert(student)?;
        self.mark_dirty();
        Ok(created)
    }

    /// Fetches a student by id.
    pub fn get_student(&self, id: u64) -> Result<Student, DbError> {
        self.students()?.get(id).cloned()
    }

    /// Number of stored students.
    pub fn student_count(&self) -> Result<usize, DbError> {
        Ok(self.students()?.len())
    }

    /// Read access to the course table.
    pub fn courses(&self) -> Result<RwLockReadGuard<'_, Table<Course>>, DbError> {
        self.courses.read().map_err(|_| DbError::LockPoisoned)
    }

    /// Write access to the course table. Does not mark the database dirty.
    pub fn courses_mut(&self) -> Result<RwLockWriteGuard<'_, Table<Course>>, DbError> {
        self.courses.write().map_err(|_| DbError::LockPoisoned)
    }

    /// Read access to the student table.
    pub fn students(&self) -> Result<RwLockReadGuard<'_, Table<Student>>, DbError> {
        self.students.read().map_err(|_| DbError::LockPoisoned)
    }

    /// Write access to the student table. Does not mark the database dirty.
    pub fn students_mut(&self) -> Result<RwLockWriteGuard<'_, Table<Student>>, DbError> {
        self.students.write().map_err(|_| DbError::LockPoisoned)
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Returns whether there are unflushed changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Flags the store as holding changes that are not on disk.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_lifecycle() {
        let db = Database::new();
        let created = db.create_course(NewCourse::new("Django")).unwrap();
        assert_eq!(db.get_course(created.id).unwrap().name, "Django");

        let updated = db
            .update_course(
                created.id,
                CoursePatch {
                    name: Some("Django Advanced".to_string()),
                },
            )
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Django Advanced");

        db.delete_course(created.id).unwrap();
        assert_eq!(db.course_count().unwrap(), 0);
        assert!(matches!(
            db.get_course(created.id),
            Err(DbError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn test_students_do_not_affect_courses() {
        let db = Database::new();
        for i in 0..7 {
            db.create_student(NewStudent::new(format!("student-{}", i)))
                .unwrap();
        }
        for i in 0..14 {
            db.create_course(NewCourse::new(format!("course-{}", i)))
                .unwrap();
        }

        assert_eq!(db.course_count().unwrap(), 14);
        assert_eq!(db.student_count().unwrap(), 7);
        assert_eq!(db.list_courses(&QueryParams::default()).unwrap().len(), 14);
        // Course ids start at 1 regardless of how many students exist.
        assert_eq!(db.get_course(1).unwrap().name, "course-0");
    }

    #[test]
    fn test_dirty_flag() {
        let db = Database::new();
        assert!(!db.take_dirty());

        db.create_course(NewCourse::new("Rust")).unwrap();
        assert!(db.is_dirty());
        assert!(db.take_dirty());
        assert!(!db.is_dirty());

        // Failed mutations leave the flag alone.
        assert!(db.delete_course(99).is_err());
        assert!(!db.is_dirty());
    }
}
