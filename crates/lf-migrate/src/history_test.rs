use super::*;
use chrono::Utc;
use lf_db::DuckDbBackend;

fn record<'a>(filename: &'a str, fingerprint: &'a str, duration: i64) -> NewHistoryRecord<'a> {
    NewHistoryRecord {
        filename,
        fingerprint,
        executed_at: Utc::now().naive_utc(),
        duration_millis: duration,
    }
}

#[tokio::test]
async fn test_ensure_table_creates_missing_table() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");

    assert_eq!(store.state(), TableState::Unknown);
    assert!(store.ensure_table(&mut db, false).await.unwrap());
    assert_eq!(store.state(), TableState::Present);
    assert!(db.relation_exists("Migrations").await.unwrap());
}

#[tokio::test]
async fn test_ensure_table_in_preview_leaves_table_absent() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");

    assert!(!store.ensure_table(&mut db, true).await.unwrap());
    assert_eq!(store.state(), TableState::Absent);
    assert!(!db.relation_exists("Migrations").await.unwrap());
}

#[tokio::test]
async fn test_ensure_table_is_cached() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    // Dropping the table behind the store's back is not noticed: the
    // existence check runs once per store.
    db.execute("DROP TABLE \"Migrations\"").await.unwrap();
    assert!(store.ensure_table(&mut db, false).await.unwrap());
    assert!(!db.relation_exists("Migrations").await.unwrap());
}

#[tokio::test]
async fn test_ensure_table_finds_existing_table_in_preview() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    HistoryStore::new("Migrations")
        .ensure_table(&mut db, false)
        .await
        .unwrap();

    let mut store = HistoryStore::new("Migrations");
    assert!(store.ensure_table(&mut db, true).await.unwrap());
    assert_eq!(store.state(), TableState::Present);
}

#[tokio::test]
async fn test_insert_and_find() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    store
        .upsert(&mut db, &record("001_init.sql", "fp-1", 15), HistoryWrite::Insert)
        .await
        .unwrap();

    let by_fp = store
        .find_by_fingerprint(&mut db, "fp-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_fp.filename, "001_init.sql");
    assert_eq!(by_fp.duration_millis, 15);
    assert!(by_fp.executed_at.is_some());
    assert!(by_fp.id > 0);

    let by_name = store
        .find_by_filename(&mut db, "001_init.sql")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.fingerprint, "fp-1");

    assert!(store
        .find_by_fingerprint(&mut db, "fp-2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_ids_are_assigned() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    store
        .upsert(&mut db, &record("a.sql", "fp-a", 1), HistoryWrite::Insert)
        .await
        .unwrap();
    store
        .upsert(&mut db, &record("b.sql", "fp-b", 1), HistoryWrite::Insert)
        .await
        .unwrap();

    let a = store.find_by_fingerprint(&mut db, "fp-a").await.unwrap().unwrap();
    let b = store.find_by_fingerprint(&mut db, "fp-b").await.unwrap().unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_update_replaces_fingerprint_for_filename() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    store
        .upsert(&mut db, &record("001_init.sql", "old", 5), HistoryWrite::Insert)
        .await
        .unwrap();
    store
        .upsert(&mut db, &record("001_init.sql", "new", 9), HistoryWrite::Update)
        .await
        .unwrap();

    assert!(store
        .find_by_fingerprint(&mut db, "old")
        .await
        .unwrap()
        .is_none());
    let row = store
        .find_by_fingerprint(&mut db, "new")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.filename, "001_init.sql");
    assert_eq!(row.duration_millis, 9);
}

#[tokio::test]
async fn test_update_touches_every_row_for_filename() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    // A rename onto a filename that already has a row leaves two rows
    // under that name.
    store
        .upsert(&mut db, &record("002_seed.sql", "fp-a", 1), HistoryWrite::Insert)
        .await
        .unwrap();
    store
        .upsert(&mut db, &record("002_other.sql", "fp-b", 1), HistoryWrite::Insert)
        .await
        .unwrap();
    store
        .rename_filename(&mut db, "fp-b", "002_seed.sql")
        .await
        .unwrap();

    store
        .upsert(&mut db, &record("002_seed.sql", "fp-c", 2), HistoryWrite::Update)
        .await
        .unwrap();

    let rows = db
        .query_history(
            "SELECT \"Id\", \"Filename\", \"Hash\", CAST(\"ExecutionDate\" AS VARCHAR), \"Duration\" \
             FROM \"Migrations\" ORDER BY \"Id\"",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r.filename == "002_seed.sql" && r.fingerprint == "fp-c"));
}

#[tokio::test]
async fn test_rename_filename() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();

    store
        .upsert(&mut db, &record("001_old.sql", "fp", 1), HistoryWrite::Insert)
        .await
        .unwrap();
    store
        .rename_filename(&mut db, "fp", "001_new.sql")
        .await
        .unwrap();

    let row = store.find_by_fingerprint(&mut db, "fp").await.unwrap().unwrap();
    assert_eq!(row.filename, "001_new.sql");
    assert!(store
        .find_by_filename(&mut db, "001_old.sql")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_absent_table_simulates_empty_history() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, true).await.unwrap();

    assert!(store
        .find_by_fingerprint(&mut db, "fp")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .find_by_filename(&mut db, "a.sql")
        .await
        .unwrap()
        .is_none());
    store
        .upsert(&mut db, &record("a.sql", "fp", 1), HistoryWrite::Insert)
        .await
        .unwrap();
    assert!(!db.relation_exists("Migrations").await.unwrap());
}

#[tokio::test]
async fn test_custom_table_name_is_quoted() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("schema history");
    store.ensure_table(&mut db, false).await.unwrap();
    store
        .upsert(&mut db, &record("a.sql", "fp", 1), HistoryWrite::Insert)
        .await
        .unwrap();

    assert!(db.relation_exists("schema history").await.unwrap());
    assert!(store.find_by_fingerprint(&mut db, "fp").await.unwrap().is_some());
}

#[tokio::test]
async fn test_lookup_failure_names_table() {
    let mut db = DuckDbBackend::in_memory().unwrap();
    let mut store = HistoryStore::new("Migrations");
    store.ensure_table(&mut db, false).await.unwrap();
    db.execute("DROP TABLE \"Migrations\"").await.unwrap();

    let err = store.find_by_fingerprint(&mut db, "fp").await.unwrap_err();
    assert!(matches!(err, MigrateError::History { action: "lookup", .. }));
    assert!(err.to_string().contains("Migrations"));
}

#[test]
fn test_sqlserver_create_statement() {
    let sql = create_table_sql(Dialect::SqlServer, "Migrations");
    assert_eq!(sql.len(), 1);
    assert!(sql[0].starts_with("CREATE TABLE [Migrations]("));
    assert!(sql[0].contains("[Id] [int] IDENTITY(1,1) NOT NULL"));
    assert!(sql[0].contains("[Hash] [varchar](40)"));
    assert!(sql[0].contains("[Filename] [nvarchar](260)"));
}

#[test]
fn test_sequence_name_is_bare_identifier() {
    assert_eq!(sequence_name("schema history"), "schema_history_id_seq");
    assert_eq!(sequence_name("Migrations"), "Migrations_id_seq");
}
