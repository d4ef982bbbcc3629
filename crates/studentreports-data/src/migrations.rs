// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Versioned schema migrations, tracked through `PRAGMA user_version`.
//
// Step N (1-based) brings the schema from version N-1 to N. Each step runs in
// its own transaction together with the version bump, so a failed step leaves
// the database at the last good version.

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info, instrument};

use studentreports_core::error::{ReportError, Result};

/// Ordered migration steps. Append only; never edit a released step.
const MIGRATIONS: &[&str] = &[
    // 1: the student table read by the report.
    r#"
    CREATE TABLE IF NOT EXISTS Students (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        Name TEXT NOT NULL,
        Grade TEXT,
        Score REAL
    )
    "#,
];

/// Schema version after every migration has been applied.
pub fn latest_version() -> u32 {
    MIGRATIONS.len() as u32
}

/// Open (or create) the database at `path` and apply pending migrations.
///
/// Returns the number of steps applied.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn migrate(path: impl AsRef<Path>) -> Result<usize> {
    let mut conn = Connection::open(path.as_ref())
        .map_err(|e| ReportError::StorageUnavailable(format!("open: {e}")))?;
    migrate_connection(&mut conn)
}

/// Apply pending migrations on an already-open connection.
pub fn migrate_connection(conn: &mut Connection) -> Result<usize> {
    let current: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| ReportError::StorageUnavailable(format!("read user_version: {e}")))?;

    let mut applied = 0;
    for (index, step) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as u32 + 1;
        let tx = conn
            .transaction()
            .map_err(|e| ReportError::StorageUnavailable(format!("begin migration {version}: {e}")))?;
        tx.execute_batch(step)
            .map_err(|e| ReportError::StorageUnavailable(format!("migration {version}: {e}")))?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| ReportError::StorageUnavailable(format!("bump to {version}: {e}")))?;
        tx.commit()
            .map_err(|e| ReportError::StorageUnavailable(format!("commit migration {version}: {e}")))?;
        debug!(version, "migration applied");
        applied += 1;
    }

    info!(applied, version = latest_version(), "schema up to date");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("user_version")
    }

    #[test]
    fn fresh_database_reaches_latest_version() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        let applied = migrate_connection(&mut conn).expect("migrate");
        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(user_version(&conn), latest_version());

        conn.execute(
            "INSERT INTO Students (Name, Grade, Score) VALUES ('Ada', 'A', 97.5)",
            [],
        )
        .expect("table exists");
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrate_connection(&mut conn).expect("first run");
        let applied = migrate_connection(&mut conn).expect("second run");
        assert_eq!(applied, 0);
    }

    #[test]
    fn migrate_creates_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("students.db");
        migrate(&path).expect("migrate");
        assert!(path.exists());
    }

    #[test]
    fn unreachable_path_is_storage_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no-such-dir").join("students.db");
        let err = migrate(&path).expect_err("parent directory is missing");
        assert!(matches!(err, ReportError::StorageUnavailable(_)));
    }
}
