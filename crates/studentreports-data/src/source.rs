// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite-backed record source.
//
// A connection is opened per fetch and dropped before returning, so nothing
// outlives the request. The query selects every column in storage order; the
// column set is whatever the table holds and is passed through untouched.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, instrument, warn};

use studentreports_core::error::{ReportError, Result};
use studentreports_core::traits::RecordSource;
use studentreports_core::types::{FieldValue, StudentRecord};

const SELECT_STUDENTS_SQL: &str = "SELECT * FROM Students";

/// Reads student rows from a SQLite database file.
///
/// All methods are synchronous because `rusqlite` is. In an async context,
/// call them through `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    path: PathBuf,
}

impl SqliteRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open read-only. A missing file fails instead of silently creating an
    /// empty database.
    fn open(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            ReportError::StorageUnavailable(format!("open {}: {e}", self.path.display()))
        })
    }
}

impl RecordSource for SqliteRecordSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch_all(&self) -> Result<Vec<StudentRecord>> {
        let conn = self.open()?;
        let records = fetch_students(&conn)?;
        debug!(count = records.len(), "fetched student rows");
        Ok(records)
    }
}

/// Run the student query on an open connection.
pub fn fetch_students(conn: &Connection) -> Result<Vec<StudentRecord>> {
    let mut stmt = conn
        .prepare(SELECT_STUDENTS_SQL)
        .map_err(|e| ReportError::StorageUnavailable(format!("prepare fetch_all: {e}")))?;

    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    stmt.query_map([], |row| row_to_record(row, &names))
        .map_err(|e| ReportError::StorageUnavailable(format!("query fetch_all: {e}")))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ReportError::StorageUnavailable(format!("collect rows: {e}")))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `StudentRecord`, one pair per selected column.
fn row_to_record(row: &rusqlite::Row<'_>, names: &[String]) -> rusqlite::Result<StudentRecord> {
    let mut columns = Vec::with_capacity(names.len());
    for (index, name) in names.iter().enumerate() {
        let value = match row.get_ref(index)? {
            ValueRef::Null => FieldValue::Null,
            ValueRef::Integer(v) => FieldValue::Integer(v),
            ValueRef::Real(v) => FieldValue::Real(v),
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => FieldValue::Text(text.to_owned()),
                Err(e) => {
                    // Kept as raw bytes so nothing is rewritten.
                    warn!(column = %name, error = %e, "TEXT value is not valid UTF-8; keeping bytes");
                    FieldValue::Blob(bytes.to_vec())
                }
            },
            ValueRef::Blob(bytes) => FieldValue::Blob(bytes.to_vec()),
        };
        columns.push((name.clone(), value));
    }
    Ok(StudentRecord::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::migrate;

    fn seeded_database() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("students.db");
        migrate(&path).expect("migrate");

        let conn = Connection::open(&path).expect("open for seeding");
        conn.execute_batch(
            "INSERT INTO Students (Name, Grade, Score) VALUES ('Ada Lovelace', 'A', 97.5);
             INSERT INTO Students (Name, Grade, Score) VALUES ('Alan Turing', 'B', NULL);
             INSERT INTO Students (Name, Grade, Score) VALUES ('Grace Hopper', NULL, 88);",
        )
        .expect("seed");
        (dir, path)
    }

    #[test]
    fn fetch_all_returns_rows_in_storage_order() {
        let (_dir, path) = seeded_database();
        let source = SqliteRecordSource::new(&path);

        let records = source.fetch_all().expect("fetch_all");
        let names: Vec<String> = records.iter().map(|r| r.display("Name")).collect();
        assert_eq!(names, ["Ada Lovelace", "Alan Turing", "Grace Hopper"]);
    }

    #[test]
    fn values_pass_through_verbatim() {
        let (_dir, path) = seeded_database();
        let records = SqliteRecordSource::new(&path).fetch_all().expect("fetch_all");

        assert_eq!(records[0].get("Score"), Some(&FieldValue::Real(97.5)));
        assert_eq!(records[1].get("Score"), Some(&FieldValue::Null));
        assert_eq!(records[2].get("Grade"), Some(&FieldValue::Null));
        assert_eq!(records[0].get("Id"), Some(&FieldValue::Integer(1)));
        // Every column of the table is carried, in declaration order.
        let columns: Vec<&str> = records[0].columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(columns, ["Id", "Name", "Grade", "Score"]);
    }

    #[test]
    fn invalid_utf8_text_keeps_its_bytes() {
        let (_dir, path) = seeded_database();
        Connection::open(&path)
            .and_then(|c| {
                c.execute_batch(
                    "INSERT INTO Students (Name, Grade) VALUES (CAST(x'41FF42' AS TEXT), 'C')",
                )
            })
            .expect("insert malformed text");

        let records = SqliteRecordSource::new(&path).fetch_all().expect("fetch_all");
        assert_eq!(records[3].get("Name"), Some(&FieldValue::Blob(vec![0x41, 0xFF, 0x42])));
        assert_eq!(records[3].display("Name"), "41ff42");
        assert_eq!(records[3].get("Grade"), Some(&FieldValue::Text("C".into())));
    }

    #[test]
    fn empty_table_yields_no_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("students.db");
        migrate(&path).expect("migrate");

        let records = SqliteRecordSource::new(&path).fetch_all().expect("fetch_all");
        assert!(records.is_empty());
    }

    #[test]
    fn missing_database_is_storage_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = SqliteRecordSource::new(dir.path().join("absent.db"));

        let err = source.fetch_all().expect_err("file does not exist");
        assert!(matches!(err, ReportError::StorageUnavailable(_)));
    }

    #[test]
    fn missing_table_is_storage_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("unmigrated.db");
        Connection::open(&path)
            .and_then(|c| c.execute_batch("CREATE TABLE Other (x INTEGER)"))
            .expect("create unrelated table");

        let err = SqliteRecordSource::new(&path)
            .fetch_all()
            .expect_err("Students table is missing");
        assert!(matches!(err, ReportError::StorageUnavailable(_)));
    }
}
