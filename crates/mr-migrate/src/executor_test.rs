use super::*;
use crate::applied::load_applied_set;
use crate::test_utils::{row_count, table_exists, task_for, write_script, FaultyDb, Faults};
use crate::task::MigrationOptions;
use mr_db::DuckDbBackend;
use std::sync::Arc;
use tempfile::tempdir;

fn duckdb() -> Arc<dyn Database> {
    Arc::new(DuckDbBackend::in_memory().unwrap())
}

fn faulty(faults: Faults) -> Arc<dyn Database> {
    Arc::new(FaultyDb::new(faults))
}

async fn applied_names(task: &MigrationTask) -> Vec<String> {
    load_applied_set(task.db.as_ref(), &task.versions_table())
        .await
        .unwrap()
        .iter()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_apply_records_script() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "001_init.sql",
        "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n",
    );
    let task = task_for(dir.path(), duckdb());

    let report = ScriptExecutor::new(&task)
        .apply("001_init.sql")
        .await
        .unwrap();

    assert_eq!(report.name, "001_init.sql");
    assert_eq!(report.statements, 3);
    assert_eq!(row_count(task.db.as_ref(), "t").await, Some(2));
    assert_eq!(applied_names(&task).await, vec!["001_init.sql"]);
}

#[tokio::test]
async fn test_second_statement_fails() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "002_partial.sql",
        "CREATE TABLE first_step (id INT);\n\
         INSERT INTO missing_table VALUES (1);\n\
         CREATE TABLE third_step (id INT);\n",
    );
    let task = task_for(dir.path(), duckdb());

    let err = ScriptExecutor::new(&task)
        .apply("002_partial.sql")
        .await
        .unwrap_err();

    match &err {
        MigrateError::StatementExec { at, .. } => {
            assert_eq!(at.script, "002_partial.sql");
            assert_eq!(at.index, 2);
            assert_eq!(at.line, 2);
        }
        other => panic!("expected StatementExec, got {other:?}"),
    }
    assert_eq!(err.script(), Some("002_partial.sql"));

    let db = task.db.as_ref();
    // Statement 1 stays committed, statement 3 never ran
    assert!(table_exists(db, "first_step").await);
    assert!(!table_exists(db, "third_step").await);
    // No bookkeeping record, the table was never even created
    assert!(!table_exists(db, "versions").await);
    assert!(applied_names(&task).await.is_empty());
}

#[tokio::test]
async fn test_empty_script_is_recorded() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "003_blank.sql", "  ;\n\n;\t\n");
    let task = task_for(dir.path(), duckdb());

    let report = ScriptExecutor::new(&task)
        .apply("003_blank.sql")
        .await
        .unwrap();

    assert_eq!(report.statements, 0);
    assert_eq!(applied_names(&task).await, vec!["003_blank.sql"]);
}

#[tokio::test]
async fn test_semicolon_in_literal_is_one_statement() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "004_literal.sql",
        "CREATE TABLE notes (body VARCHAR);\nINSERT INTO notes VALUES ('a; b; c');\n",
    );
    let task = task_for(dir.path(), duckdb());

    let report = ScriptExecutor::new(&task)
        .apply("004_literal.sql")
        .await
        .unwrap();

    assert_eq!(report.statements, 2);
    let bodies = task
        .db
        .query_strings("SELECT body FROM notes", &[])
        .await
        .unwrap();
    assert_eq!(bodies, vec!["a; b; c".to_string()]);
}

#[tokio::test]
async fn test_marker_delimiter() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "005_marker.sql",
        "CREATE TABLE a (id INT); CREATE TABLE b (id INT);\n--;;\nINSERT INTO a VALUES (1);\n",
    );
    let task = task_for(dir.path(), duckdb()).with_options(MigrationOptions {
        delimiter: StatementDelimiter::Marker("--;;".to_string()),
        ..MigrationOptions::default()
    });

    let report = ScriptExecutor::new(&task)
        .apply("005_marker.sql")
        .await
        .unwrap();

    assert_eq!(report.statements, 2);
    assert!(table_exists(task.db.as_ref(), "b").await);
    assert_eq!(row_count(task.db.as_ref(), "a").await, Some(1));
}

#[tokio::test]
async fn test_missing_script_is_read_error() {
    let dir = tempdir().unwrap();
    let task = task_for(dir.path(), duckdb());

    let err = ScriptExecutor::new(&task)
        .apply("gone.sql")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::ScriptRead { .. }));
}

#[tokio::test]
async fn test_non_utf8_script_is_read_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("bad.sql"), [0xff, 0xfe, 0x00]).unwrap();
    let task = task_for(dir.path(), duckdb());

    let err = ScriptExecutor::new(&task)
        .apply("bad.sql")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::ScriptRead { .. }));
}

#[tokio::test]
async fn test_unsplittable_script_runs_nothing() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "006_broken.sql",
        "CREATE TABLE never (id INT);\nINSERT INTO never VALUES ('unterminated);\n",
    );
    let task = task_for(dir.path(), duckdb());

    let err = ScriptExecutor::new(&task)
        .apply("006_broken.sql")
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::ScriptSplit { .. }));
    assert!(!table_exists(task.db.as_ref(), "never").await);
}

#[tokio::test]
async fn test_begin_failure() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "CREATE TABLE t (id INT);");
    let task = task_for(
        dir.path(),
        faulty(Faults {
            begin: true,
            ..Faults::default()
        }),
    );

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    assert!(matches!(err, MigrateError::TransactionBegin { .. }));
    assert_eq!(err.location().map(|at| at.index), Some(1));
}

#[tokio::test]
async fn test_commit_failure_rolls_back() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "CREATE TABLE t (id INT);");
    let task = task_for(
        dir.path(),
        faulty(Faults {
            commit: true,
            ..Faults::default()
        }),
    );

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    assert!(matches!(err, MigrateError::Commit { .. }));
    assert!(!err.needs_operator());
    assert!(!table_exists(task.db.as_ref(), "t").await);
    assert!(applied_names(&task).await.is_empty());
}

#[tokio::test]
async fn test_commit_and_rollback_failure() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "CREATE TABLE t (id INT);");
    let task = task_for(
        dir.path(),
        faulty(Faults {
            commit: true,
            rollback: true,
            ..Faults::default()
        }),
    );

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    match &err {
        MigrateError::Rollback { cause, .. } => assert!(cause.contains("commit")),
        other => panic!("expected Rollback, got {other:?}"),
    }
    assert!(err.needs_operator());
}

#[tokio::test]
async fn test_statement_and_rollback_failure() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "INSERT INTO missing VALUES (1);");
    let task = task_for(
        dir.path(),
        faulty(Faults {
            rollback: true,
            ..Faults::default()
        }),
    );

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    match &err {
        MigrateError::Rollback { cause, at, .. } => {
            assert!(cause.contains("statement"));
            assert_eq!(at.index, 1);
        }
        other => panic!("expected Rollback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_record_failure_after_commit() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "CREATE TABLE t (id INT);");
    let task = task_for(
        dir.path(),
        faulty(Faults {
            record: true,
            ..Faults::default()
        }),
    );

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    match &err {
        MigrateError::RecordInsert { script, table, .. } => {
            assert_eq!(script, "a.sql");
            assert_eq!(table, "memory.main.versions");
        }
        other => panic!("expected RecordInsert, got {other:?}"),
    }
    assert!(err.needs_operator());
    // Effects are committed even though the record is missing
    assert!(table_exists(task.db.as_ref(), "t").await);
    assert!(applied_names(&task).await.is_empty());
}

#[tokio::test]
async fn test_no_auto_create_without_table() {
    let dir = tempdir().unwrap();
    write_script(dir.path(), "a.sql", "CREATE TABLE t (id INT);");
    let task = task_for(dir.path(), duckdb()).with_options(MigrationOptions {
        create_versions_table: false,
        ..MigrationOptions::default()
    });

    let err = ScriptExecutor::new(&task).apply("a.sql").await.unwrap_err();
    assert!(matches!(err, MigrateError::RecordInsert { .. }));
}

#[tokio::test]
async fn test_script_creates_its_own_versions_table() {
    let dir = tempdir().unwrap();
    write_script(
        dir.path(),
        "000_versions.sql",
        "CREATE TABLE versions (name VARCHAR PRIMARY KEY, created TIMESTAMP NOT NULL);",
    );
    let task = task_for(dir.path(), duckdb()).with_options(MigrationOptions {
        create_versions_table: false,
        ..MigrationOptions::default()
    });

    ScriptExecutor::new(&task)
        .apply("000_versions.sql")
        .await
        .unwrap();
    assert_eq!(applied_names(&task).await, vec!["000_versions.sql"]);
}
