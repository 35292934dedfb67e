//! Course CRUD scenarios driven directly against the database.

use course_db_core::table::QueryParams;
use course_db_core::{CoursePatch, Database, DbError, NewCourse};
use ntest::timeout;

use super::helpers::{make_courses, make_students};

#[timeout(1000)]
#[test]
fn test_list_ignores_students() {
    let db = Database::new();
    make_students(&db, 7);
    let courses = make_courses(&db, 14);

    let listed = db.list_courses(&QueryParams::default()).unwrap();
    assert_eq!(listed.len(), courses.len());
    assert_eq!(listed, courses);
}

#[timeout(1000)]
#[test]
fn test_filter_by_name_returns_exact_subset() {
    let db = Database::new();
    make_students(&db, 15);
    let courses = make_courses(&db, 10);
    db.create_course(NewCourse::new(courses[5].name.clone()))
        .unwrap();

    let listed = db
        .list_courses(&QueryParams::by_name(courses[5].name.clone()))
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|c| c.name == courses[5].name));
    assert_eq!(listed[0], courses[5]);
}

#[timeout(1000)]
#[test]
fn test_update_tenth_of_thirty_three() {
    let db = Database::new();
    make_students(&db, 22);
    let courses = make_courses(&db, 33);
    let target = &courses[9];

    db.update_course(
        target.id,
        CoursePatch {
            name: Some("Django Advanced".to_string()),
        },
    )
    .unwrap();

    let fetched = db.get_course(target.id).unwrap();
    assert_eq!(fetched.id, target.id);
    assert_eq!(fetched.name, "Django Advanced");
    assert_eq!(db.get_course(courses[8].id).unwrap(), courses[8]);
}

#[timeout(1000)]
#[test]
fn test_delete_thirteenth_of_fourteen() {
    let db = Database::new();
    make_students(&db, 38);
    let courses = make_courses(&db, 14);
    let before = db.course_count().unwrap();

    db.delete_course(courses[12].id).unwrap();

    assert_eq!(db.course_count().unwrap(), before - 1);
    assert_eq!(db.student_count().unwrap(), 38);
    assert!(matches!(
        db.get_course(courses[12].id),
        Err(DbError::RecordNotFound { .. })
    ));
}
