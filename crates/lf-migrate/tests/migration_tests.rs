//! End-to-end runs against a DuckDB database file.
//!
//! Each test gets its own tempdir holding a `migrations/` directory and the
//! database file, so successive runs see the same history.

use lf_core::RunOptions;
use lf_db::DuckDbConnector;
use lf_migrate::{MigrateError, MigrationRunner, RunReport};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

struct Fixture {
    _dir: TempDir,
    scripts: PathBuf,
    db_path: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let scripts = dir.path().join("migrations");
        fs::create_dir(&scripts).unwrap();
        let db_path = dir.path().join("landfall.duckdb");
        Self {
            _dir: dir,
            scripts,
            db_path,
        }
    }

    fn write(&self, name: &str, sql: &str) {
        fs::write(self.scripts.join(name), sql).unwrap();
    }

    fn runner(&self) -> MigrationRunner {
        MigrationRunner::new(&self.scripts)
    }

    fn connector(&self) -> DuckDbConnector {
        DuckDbConnector::new(self.db_path.to_string_lossy().into_owned())
    }

    async fn run(&self, options: RunOptions) -> RunReport {
        self.runner()
            .run_all(&self.connector(), &options)
            .await
            .unwrap()
    }

    fn table_exists(&self, table: &str) -> bool {
        let conn = duckdb::Connection::open(&self.db_path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                duckdb::params![table],
                |row| row.get(0),
            )
            .unwrap();
        count > 0
    }

    fn row_count(&self, table: &str) -> i64 {
        let conn = duckdb::Connection::open(&self.db_path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    /// `(Filename, Hash)` pairs from the history table, in id order
    fn history(&self) -> Vec<(String, String)> {
        let conn = duckdb::Connection::open(&self.db_path).unwrap();
        let mut stmt = conn
            .prepare("SELECT \"Filename\", \"Hash\" FROM \"Migrations\" ORDER BY \"Id\"")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        rows.map(|r| r.unwrap()).collect()
    }
}

fn quiet() -> RunOptions {
    RunOptions {
        output: false,
        ..RunOptions::default()
    }
}

fn names(report: &RunReport) -> Vec<&str> {
    report.results.iter().map(|r| r.name.as_str()).collect()
}

const INIT_SQL: &str = "CREATE TABLE users (id INTEGER, name VARCHAR)\nGO\n";
const SEED_SQL: &str = "INSERT INTO users VALUES (1, 'ada')\ngo\nINSERT INTO users VALUES (2, 'grace')\n";

// ── Scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_scripts_applied_then_skipped() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);

    let first = fx.run(quiet()).await;
    assert_eq!(names(&first), vec!["001_init.sql", "002_seed.sql"]);
    assert!(first.results.iter().all(|r| !r.skipped));
    assert_eq!(first.summary(), None);
    assert_eq!(
        first.messages().collect::<Vec<_>>(),
        vec![
            "Successfully migrated 001_init.sql",
            "Successfully migrated 002_seed.sql"
        ]
    );

    let second = fx.run(quiet()).await;
    assert!(second.results.iter().all(|r| r.skipped));
    assert_eq!(second.messages().count(), 0);
    assert_eq!(
        second.summary().as_deref(),
        Some("2 previously applied migrations were skipped.")
    );

    assert_eq!(fx.row_count("users"), 2);
    assert_eq!(fx.history().len(), 2);
}

#[tokio::test]
async fn test_repeated_runs_change_nothing() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);

    fx.run(quiet()).await;
    let history = fx.history();
    for _ in 0..2 {
        let report = fx.run(quiet()).await;
        assert_eq!(report.skipped_count(), 2);
    }

    assert_eq!(fx.history(), history);
    assert_eq!(fx.row_count("users"), 2);
}

#[tokio::test]
async fn test_rename_is_recorded_not_reexecuted() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);
    fx.run(quiet()).await;

    fs::rename(
        fx.scripts.join("002_seed.sql"),
        fx.scripts.join("002_seed_users.sql"),
    )
    .unwrap();
    let report = fx.run(quiet()).await;

    assert_eq!(report.skipped_count(), 2);
    assert_eq!(
        report.messages().collect::<Vec<_>>(),
        vec!["Filename has changed in the database; updating 002_seed_users.sql"]
    );
    assert_eq!(fx.row_count("users"), 2);

    let filenames: Vec<String> = fx.history().into_iter().map(|(f, _)| f).collect();
    assert_eq!(filenames, vec!["001_init.sql", "002_seed_users.sql"]);

    // The rename is healed; the next run is silent.
    let again = fx.run(quiet()).await;
    assert_eq!(again.messages().count(), 0);
}

#[tokio::test]
async fn test_changed_content_stops_batch_without_force() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);
    fx.run(quiet()).await;

    fx.write("001_init.sql", "CREATE TABLE users (id INTEGER)\n");
    fx.write("003_more.sql", "INSERT INTO users VALUES (3, 'linus')\n");
    let failure = fx
        .runner()
        .run_all(&fx.connector(), &quiet())
        .await
        .unwrap_err();

    assert!(failure.completed.is_empty());
    match &failure.error {
        MigrateError::AlreadyMigrated {
            script,
            fingerprint,
        } => {
            assert_eq!(script, "001_init.sql");
            assert_eq!(fingerprint.len(), 36);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.row_count("users"), 2);
    assert_eq!(fx.history().len(), 2);
}

#[tokio::test]
async fn test_force_reapplies_changed_script() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);
    fx.run(quiet()).await;
    let before = fx.history();

    fx.write("002_seed.sql", "INSERT INTO users VALUES (3, 'linus')\n");
    let report = fx
        .run(RunOptions {
            force: true,
            ..quiet()
        })
        .await;

    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.applied_count(), 1);
    assert_eq!(fx.row_count("users"), 3);

    let after = fx.history();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].0, "002_seed.sql");
    assert_ne!(after[1].1, before[1].1);
}

#[tokio::test]
async fn test_failed_script_leaves_no_trace() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write(
        "002_broken.sql",
        "CREATE TABLE audit (id INTEGER)\nGO\nINSERT INTO nowhere VALUES (1)\n",
    );
    fx.write("003_seed.sql", SEED_SQL);

    let failure = fx
        .runner()
        .run_all(&fx.connector(), &quiet())
        .await
        .unwrap_err();

    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.completed[0].name, "001_init.sql");
    assert!(matches!(
        failure.error,
        MigrateError::StatementExecution { statement: 2, .. }
    ));

    assert!(fx.table_exists("users"));
    assert!(!fx.table_exists("audit"));
    assert_eq!(fx.row_count("users"), 0);
    let filenames: Vec<String> = fx.history().into_iter().map(|(f, _)| f).collect();
    assert_eq!(filenames, vec!["001_init.sql"]);
}

#[tokio::test]
async fn test_preview_leaves_database_untouched() {
    let fx = Fixture::new();
    // Each preview script is rolled back before the next one runs, so these
    // must not depend on each other.
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_orders.sql", "CREATE TABLE orders (id INTEGER)\n");

    let report = fx
        .run(RunOptions {
            preview: true,
            ..quiet()
        })
        .await;

    assert_eq!(report.applied_count(), 2);
    assert!(!fx.table_exists("Migrations"));
    assert!(!fx.table_exists("users"));
    assert!(!fx.table_exists("orders"));

    // A real run afterwards still has everything to do.
    let real = fx.run(quiet()).await;
    assert_eq!(real.applied_count(), 2);
}

#[tokio::test]
async fn test_preview_against_existing_history() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.run(quiet()).await;

    fx.write("002_seed.sql", SEED_SQL);
    let report = fx
        .run(RunOptions {
            preview: true,
            ..quiet()
        })
        .await;

    assert_eq!(report.skipped_count(), 1);
    assert_eq!(report.applied_count(), 1);
    assert_eq!(fx.row_count("users"), 0);
    assert_eq!(fx.history().len(), 1);
}

#[tokio::test]
async fn test_scripts_run_in_byte_order() {
    let fx = Fixture::new();
    // Each script depends on the one sorting before it.
    fx.write("b.sql", "INSERT INTO steps VALUES (2)\n");
    fx.write("a.sql", "INSERT INTO steps VALUES (1)\n");
    fx.write("B.sql", "CREATE TABLE steps (n INTEGER)\n");

    let report = fx.run(quiet()).await;

    assert_eq!(names(&report), vec!["B.sql", "a.sql", "b.sql"]);
    assert_eq!(fx.row_count("steps"), 2);
    let filenames: Vec<String> = fx.history().into_iter().map(|(f, _)| f).collect();
    assert_eq!(filenames, vec!["B.sql", "a.sql", "b.sql"]);
}

#[tokio::test]
async fn test_empty_scripts_are_excluded() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_blank.sql", "GO\n   \ngo\n");
    fx.write("003_nothing.sql", "");
    fx.write("notes.txt", "not a migration");

    let report = fx.run(quiet()).await;

    assert_eq!(names(&report), vec!["001_init.sql"]);
    assert_eq!(fx.history().len(), 1);
}

#[tokio::test]
async fn test_run_one_applies_named_script() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    fx.write("002_seed.sql", SEED_SQL);

    let report = fx
        .runner()
        .run_one(&fx.connector(), &quiet(), "001_init.sql")
        .await
        .unwrap();

    assert_eq!(names(&report), vec!["001_init.sql"]);
    assert!(fx.table_exists("users"));
    assert_eq!(fx.row_count("users"), 0);
    assert_eq!(fx.history().len(), 1);

    let full = fx.run(quiet()).await;
    assert_eq!(full.skipped_count(), 1);
    assert_eq!(full.applied_count(), 1);
}

#[tokio::test]
async fn test_run_one_missing_script_fails_before_connecting() {
    let fx = Fixture::new();

    let failure = fx
        .runner()
        .run_one(&fx.connector(), &quiet(), "404.sql")
        .await
        .unwrap_err();

    assert!(matches!(failure.error, MigrateError::Scripts(_)));
    assert!(!fx.db_path.exists());
}

#[tokio::test]
async fn test_missing_directory_fails_before_connecting() {
    let fx = Fixture::new();
    let runner = MigrationRunner::new(fx.scripts.join("absent"));

    let failure = runner
        .run_all(&fx.connector(), &quiet())
        .await
        .unwrap_err();

    assert!(failure.completed.is_empty());
    assert!(matches!(failure.error, MigrateError::Scripts(_)));
    assert!(!fx.db_path.exists());
}

#[tokio::test]
async fn test_unreachable_database_is_a_connection_error() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);
    let connector = DuckDbConnector::new(
        fx.scripts
            .join("no-such-dir")
            .join("db.duckdb")
            .to_string_lossy()
            .into_owned(),
    );

    let failure = fx
        .runner()
        .run_all(&connector, &quiet())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, MigrateError::Connection(_)));
}

#[tokio::test]
async fn test_custom_history_table() {
    let fx = Fixture::new();
    fx.write("001_init.sql", INIT_SQL);

    let runner = fx.runner().with_history_table("SchemaVersions");
    runner.run_all(&fx.connector(), &quiet()).await.unwrap();

    assert!(fx.table_exists("SchemaVersions"));
    assert!(!fx.table_exists("Migrations"));
    assert_eq!(fx.row_count("SchemaVersions"), 1);
}
