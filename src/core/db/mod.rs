//! SQLite store for suppliers, campaigns and submissions
//!
//! Every public operation runs one or a few parameterized statements against
//! a single connection. Callers that share a [`Database`] across threads wrap
//! it in a mutex; the HTTP server does exactly that.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text so that ordering and
//! range filters work with plain string comparison. List-valued columns hold
//! JSON arrays.

mod campaigns;
mod dashboard;
mod events;
mod imds;
mod pcf;
mod portal;
mod schema;
mod suppliers;
mod users;

pub use dashboard::{
    ActivityItem, CampaignCounts, DashboardStats, EmissionsCounts, ImdsCounts, Kpis, MonthTotal,
    Overview, PcfCounts, SupplierCounts, DEFAULT_ACTIVITY_LIMIT, DEFAULT_TREND_MONTHS,
};
pub use events::Event;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::{DbError, DbResult};

/// Current schema version; newer databases are refused
pub const SCHEMA_VERSION: i32 = 1;

/// Tables reported by [`Database::table_counts`]
const COUNTED_TABLES: &[&str] = &[
    "suppliers",
    "supplier_contacts",
    "campaigns",
    "campaign_supplier_status",
    "imds_submissions",
    "pcf_declarations",
    "supplier_access_tokens",
    "portal_submissions",
    "users",
    "events",
];

/// SQLite's `LOWER` and `LIKE` only fold ASCII, so text searches go through
/// `fold_case(text)`, which lowercases with full Unicode rules.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

/// `LIKE` pattern matching `needle` anywhere, for use with `ESCAPE '\'`
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// The engagement database backed by SQLite
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create a database file, creating the schema when missing
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let mut db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.init()?;
        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn, path: None };
        db.init()?;
        Ok(db)
    }

    fn init(&mut self) -> DbResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&self.conn)?;
        self.init_schema()
    }

    /// Location of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cheap liveness probe
    pub fn health(&self) -> DbResult<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Row counts of the main tables, in a fixed order
    pub fn table_counts(&self) -> DbResult<Vec<(&'static str, i64)>> {
        COUNTED_TABLES
            .iter()
            .map(|table| {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", table),
                    [],
                    |row| row.get(0),
                )?;
                Ok((*table, count))
            })
            .collect()
    }

    /// True when no supplier, campaign or user has been stored yet
    pub fn is_empty(&self) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM suppliers)
                  + (SELECT COUNT(*) FROM campaigns)
                  + (SELECT COUNT(*) FROM users)",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    /// Delete every row, keeping the schema
    pub fn clear(&mut self) -> DbResult<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM events;
            DELETE FROM portal_submissions;
            DELETE FROM supplier_access_tokens;
            DELETE FROM pcf_declarations;
            DELETE FROM imds_submissions;
            DELETE FROM campaign_supplier_status;
            DELETE FROM campaigns;
            DELETE FROM supplier_hub_metadata;
            DELETE FROM pcf_profiles;
            DELETE FROM imds_profiles;
            DELETE FROM supplier_contacts;
            DELETE FROM suppliers;
            DELETE FROM users;
            "#,
        )?;
        Ok(())
    }
}

/// Current time in the stored text format
pub(crate) fn now_ts() -> String {
    ts_text(Utc::now())
}

pub(crate) fn ts_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    row: &Row<'_>,
    col: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let idx = row.as_ref().column_index(col).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a required timestamp column
pub(crate) fn ts(row: &Row<'_>, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(col)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, col, e))
}

/// Read a nullable timestamp column
pub(crate) fn opt_ts(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(col)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(row, col, e))
    })
    .transpose()
}

/// Read a nullable `YYYY-MM-DD` column
pub(crate) fn opt_date(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(col)?;
    text.map(|t| NaiveDate::parse_from_str(&t, "%Y-%m-%d").map_err(|e| conversion_error(row, col, e)))
        .transpose()
}

/// Read a JSON array column; NULL reads as empty
pub(crate) fn list<T: DeserializeOwned>(row: &Row<'_>, col: &str) -> rusqlite::Result<Vec<T>> {
    let text: Option<String> = row.get(col)?;
    match text {
        None => Ok(Vec::new()),
        Some(t) if t.trim().is_empty() => Ok(Vec::new()),
        Some(t) => serde_json::from_str(&t).map_err(|e| conversion_error(row, col, e)),
    }
}

/// Encode a list for a JSON array column
pub(crate) fn json_list<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Map "no rows" to a typed not-found error
pub(crate) fn found<T>(result: rusqlite::Result<T>, entity: &'static str, id: impl ToString) -> DbResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(DbError::not_found(entity, id)),
        Err(e) => Err(e.into()),
    }
}

/// True when the error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory_creates_schema() {
        let db = Database::open_in_memory().unwrap();
        db.health().unwrap();
        assert!(db.is_empty().unwrap());
        let counts = db.table_counts().unwrap();
        assert_eq!(counts.len(), COUNTED_TABLES.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/dir/sect.db");
        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sect.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.create_supplier(crate::entities::supplier::NewSupplier::new("Denso Corp"))
                .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(!db.is_empty().unwrap());
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sect.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn
                .execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION + 1])
                .unwrap();
        }
        match Database::open(&path) {
            Err(DbError::Schema { found, supported }) => {
                assert_eq!(found, SCHEMA_VERSION + 1);
                assert_eq!(supported, SCHEMA_VERSION);
            }
            other => panic!("expected schema error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_timestamps_are_fixed_width() {
        let a = now_ts();
        let b = ts_text(DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z").unwrap().into());
        assert_eq!(a.len(), b.len());
        assert_eq!(b, "2025-01-02T03:04:05.000000Z");
    }

    #[test]
    fn test_clear_empties_tables() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_supplier(crate::entities::supplier::NewSupplier::new("ZF Friedrichshafen"))
            .unwrap();
        db.clear().unwrap();
        assert!(db.is_empty().unwrap());
    }
}
