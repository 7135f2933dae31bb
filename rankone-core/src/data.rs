use crate::error::{EngineError, Result};
use crate::model::StoredReport;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Persisted reports keyed by content node id. Records are replaced whole,
/// never patched.
pub trait ReportStore: Send + Sync {
    fn get_by_id(&self, node_id: i64) -> Result<Option<StoredReport>>;

    fn save(&self, report: &StoredReport) -> Result<()>;

    fn remove(&self, node_id: i64) -> Result<bool>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::StoreUnavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.connection()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS node_reports (
                id INTEGER PRIMARY KEY,
                focus_keyword TEXT,
                report TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("connection lock poisoned".to_string()))
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM node_reports", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Unix timestamp of the last save for a node.
    pub fn updated_at(&self, node_id: i64) -> Result<Option<i64>> {
        let conn = self.connection()?;
        let updated = conn
            .query_row(
                "SELECT updated_at FROM node_reports WHERE id = ?1",
                params![node_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

impl ReportStore for Database {
    fn get_by_id(&self, node_id: i64) -> Result<Option<StoredReport>> {
        let conn = self.connection()?;
        let mut stmt =
            conn.prepare("SELECT id, focus_keyword, report FROM node_reports WHERE id = ?1")?;

        let report = stmt
            .query_row(params![node_id], |row| {
                Ok(StoredReport {
                    node_id: row.get(0)?,
                    focus_keyword: row.get(1)?,
                    report: row.get(2)?,
                })
            })
            .optional()?;

        debug!("Report lookup for node {}: {}", node_id, report.is_some());
        Ok(report)
    }

    fn save(&self, report: &StoredReport) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO node_reports (id, focus_keyword, report, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                report.node_id,
                &report.focus_keyword,
                &report.report,
                current_timestamp(),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, node_id: i64) -> Result<bool> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM node_reports WHERE id = ?1", params![node_id])?;
        Ok(removed > 0)
    }
}
