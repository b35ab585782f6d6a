//! Relational snapshot sink backed by SQLite.
//!
//! Every save inserts a new row with a monotonically increasing version
//! and a timestamp, then prunes everything but the newest
//! [`RETAINED_VERSIONS`] rows in the same transaction. Loading reads the
//! newest row; an empty table means "start empty".

use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::SnapshotSink;
use crate::error::SinkError;
use crate::time::now_ms;

/// Number of snapshot versions kept in the table.
pub const RETAINED_VERSIONS: i64 = 5;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS snapshots (
    version   INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    payload   BLOB NOT NULL
)";

/// Snapshot sink storing versioned rows in an SQLite database.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSink").finish_non_exhaustive()
    }
}

impl SqliteSink {
    /// Opens (or creates) the database at `path` and ensures the
    /// snapshot table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// A private in-memory database, mostly useful in tests.
    pub fn in_memory() -> Result<Self, SinkError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, SinkError> {
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of snapshot rows currently stored.
    pub fn version_count(&self) -> Result<i64, SinkError> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?)
    }
}

impl SnapshotSink for SqliteSink {
    fn save(&self, payload: &[u8]) -> Result<(), SinkError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (timestamp, payload) VALUES (?1, ?2)",
            params![now_ms(), payload],
        )?;
        let pruned = tx.execute(
            "DELETE FROM snapshots WHERE version NOT IN
                (SELECT version FROM snapshots ORDER BY version DESC LIMIT ?1)",
            params![RETAINED_VERSIONS],
        )?;
        tx.commit()?;

        debug!(bytes = payload.len(), pruned, "snapshot row inserted");
        Ok(())
    }

    fn load(&self) -> Result<Option<Bytes>, SinkError> {
        let conn = self.conn.lock();
        let payload: Option<Vec<u8>> = conn
            .query_row(
                "SELECT payload FROM snapshots ORDER BY version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload.map(Bytes::from))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
