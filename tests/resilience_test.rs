mod helpers;

use hippograph::db;
use hippograph::memory::encode::encode_memory;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");

    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    assert!(db_path.exists());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn health_check_passes_on_valid_db() {
    let conn = helpers::test_db();

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert!(!report.sqlite_vec_version.is_empty());
    assert_eq!(report.event_count, 0);
    assert_eq!(report.vector_count, 0);
    assert_eq!(report.bond_count, 0);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn events_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("graph.db");

    let event_id = {
        let mut conn = db::open_database(&db_path).unwrap();
        encode_memory(
            &mut conn,
            &helpers::memory("persisted across restarts", 0.7),
            &helpers::test_embedding(3),
            "test-model",
        )
        .unwrap()
        .event_id
    };

    let conn = db::open_database(&db_path).unwrap();
    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.event_count, 1);
    assert_eq!(report.vector_count, 1);

    let nearest =
        hippograph::memory::nearest_events(&conn, &helpers::test_embedding(3), 1).unwrap();
    assert_eq!(nearest[0].0, event_id);
}
