//! Shared fixtures for integration tests.

use course_db_core::{Course, Database, NewCourse, NewStudent, Student};

/// Inserts `count` courses with distinct generated names.
pub fn make_courses(db: &Database, count: usize) -> Vec<Course> {
    (0..count)
        .map(|i| {
            db.create_course(NewCourse::new(format!("course-{}", i)))
                .expect("create course")
        })
        .collect()
}

/// Inserts `count` students with distinct generated names.
pub fn make_students(db: &Database, count: usize) -> Vec<Student> {
    (0..count)
        .map(|i| {
            db.create_student(NewStudent::new(format!("student-{}", i)))
                .expect("create student")
        })
        .collect()
}
