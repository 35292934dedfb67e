//! Persistence across a simulated restart.

use course_db_core::config::DbConfig;
use course_db_core::persistence::PersistenceManager;
use course_db_core::table::QueryParams;
use course_db_core::Database;
use ntest::timeout;
use tempfile::tempdir;

use super::helpers::{make_courses, make_students};

#[timeout(2000)]
#[test]
fn test_restart_keeps_courses_and_students() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let persistence = PersistenceManager::new(&config);

    let db = Database::new();
    make_students(&db, 3);
    let courses = make_courses(&db, 5);
    persistence.flush_all_tables(&db).unwrap();
    drop(db);

    let reloaded = persistence.load_database().unwrap();
    assert_eq!(reloaded.list_courses(&QueryParams::default()).unwrap(), courses);
    assert_eq!(reloaded.student_count().unwrap(), 3);
    assert!(!reloaded.is_dirty());
}
