//! Tests for persistence module.

use std::fs;

use tempfile::tempdir;

use crate::config::DbConfig;
use crate::database::Database;
use crate::error::DbError;
use crate::persistence::{PersistenceManager, SnapshotFile};
use crate::record::{Course, NewCourse, NewStudent};
use crate::table::QueryParams;
use ntest::timeout;

fn config_for(dir: &std::path::Path) -> DbConfig {
    DbConfig {
        data_dir: dir.to_path_buf(),
        persistence_retry_delay_ms: 0,
        ..Default::default()
    }
}

#[timeout(1000)]
#[test]
fn test_flush_and_load_round_trip() {
    let temp_dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(&config_for(temp_dir.path()));

    let db = Database::new();
    for name in ["Django", "Rust", "Go"] {
        db.create_course(NewCourse::new(name)).unwrap();
    }
    db.create_student(NewStudent::new("Ann")).unwrap();
    db.delete_course(3).unwrap();

    persistence.flush_all_tables(&db).unwrap();
    assert!(temp_dir.path().join("courses.json").exists());
    assert!(temp_dir.path().join("students.json").exists());
    assert!(!temp_dir.path().join("courses.json.tmp").exists());

    let loaded = persistence.load_database().unwrap();
    let courses = loaded.list_courses(&QueryParams::default()).unwrap();
    assert_eq!(
        courses,
        vec![
            Course {
                id: 1,
                name: "Django".to_string()
            },
            Course {
                id: 2,
                name: "Rust".to_string()
            },
        ]
    );
    assert_eq!(loaded.student_count().unwrap(), 1);

    // The deleted id stays retired after a reload.
    let next = loaded.create_course(NewCourse::new("Zig")).unwrap();
    assert_eq!(next.id, 4);
}

#[timeout(1000)]
#[test]
fn test_load_from_empty_directory() {
    let temp_dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(&config_for(temp_dir.path()));

    let db = persistence.load_database().unwrap();
    assert_eq!(db.course_count().unwrap(), 0);
    assert_eq!(db.student_count().unwrap(), 0);
}

#[timeout(1000)]
#[test]
fn test_checksum_mismatch_is_corruption() {
    let temp_dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(&config_for(temp_dir.path()));

    let db = Database::new();
    db.create_course(NewCourse::new("Django")).unwrap();
    persistence.flush_all_tables(&db).unwrap();

    // Edit the payload without updating the checksum.
    let path = persistence.table_path("courses");
    let contents = fs::read_to_string(&path).unwrap();
    fs::write(&path, contents.replace("Django", "Flask")).unwrap();

    let err = persistence.load_database().unwrap_err();
    assert!(matches!(err, DbError::DataCorruption(ref msg) if msg.contains("Checksum")));
}

#[timeout(1000)]
#[test]
fn test_unsupported_version_is_corruption() {
    let temp_dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(&config_for(temp_dir.path()));

    let db = Database::new();
    db.create_course(NewCourse::new("Django")).unwrap();
    let mut sealed = SnapshotFile::seal(db.courses().unwrap().snapshot()).unwrap();
    sealed.version = 99;
    fs::write(
        persistence.table_path("courses"),
        serde_json::to_vec(&sealed).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        persistence.load_database(),
        Err(DbError::DataCorruption(_))
    ));
}

#[timeout(1000)]
#[test]
fn test_garbage_file_is_corruption() {
    let temp_dir = tempdir().unwrap();
    let persistence = PersistenceManager::new(&config_for(temp_dir.path()));
    fs::write(persistence.table_path("students"), b"not json").unwrap();

    assert!(matches!(
        persistence.load_database(),
        Err(DbError::DataCorruption(_))
    ));
}

#[timeout(1000)]
#[test]
fn test_disabled_persistence_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let config = DbConfig {
        persistence_enabled: false,
        ..config_for(temp_dir.path())
    };
    let persistence = PersistenceManager::new(&config);

    let db = Database::new();
    db.create_course(NewCourse::new("Django")).unwrap();
    persistence.flush_all_tables(&db).unwrap();

    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[timeout(1000)]
#[test]
fn test_failed_flush_keeps_database_dirty() {
    let temp_dir = tempdir().unwrap();
    let data_dir = temp_dir.path().join("data");
    fs::write(&data_dir, b"not a directory").unwrap();
    let persistence = PersistenceManager::new(&config_for(&data_dir));

    let db = Database::new();
    db.create_course(NewCourse::new("Django")).unwrap();
    assert!(db.take_dirty());

    assert!(persistence.flush_all_tables(&db).is_err());
    assert!(db.is_dirty());

    fs::remove_file(&data_dir).unwrap();
    assert!(db.take_dirty());
    persistence.flush_all_tables(&db).unwrap();
    assert!(!db.is_dirty());

    let loaded = persistence.load_database().unwrap();
    assert_eq!(loaded.course_count().unwrap(), 1);
}
