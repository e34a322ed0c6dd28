//! SQLite table sink and read-side queries.
//!
//! Rows land in the `CosineTest2` table. Each batch opens a connection,
//! inserts inside one transaction and commits; each single-row connection
//! is its own short-lived `rusqlite::Connection`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dg_common::{Sample, TABLE_NAME};
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::SinkError;
use crate::sink::{Sink, SinkConnection};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const INSERT_SQL: &str = "INSERT INTO CosineTest2 (
        InsertionTime, StartingOrSeedAngle, AngleRotation, CurrentAngle,
        CosineOfCurrentAngle, TimeOfCosineOfCurrentAngle, IntervalAtWhichCosineIsTaken
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

/// One point of a cosine series, as charted by interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CosinePoint {
    pub value: f64,
    pub time: DateTime<Utc>,
}

/// Sink writing to a SQLite database file, or reading one back when opened
/// with [`SqliteSink::open_read_only`].
#[derive(Debug, Clone)]
pub struct SqliteSink {
    path: PathBuf,
    read_only: bool,
}

impl SqliteSink {
    /// Open the database, creating the file and table if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let sink = Self {
            path,
            read_only: false,
        };
        let conn = sink.open_connection()?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get::<_, String>(0))?;
        init_schema(&conn)?;
        debug!(path = %sink.path.display(), table = TABLE_NAME, "opened sqlite sink");
        Ok(sink)
    }

    /// Open an existing database for queries. The file is neither created
    /// nor altered, and every write through this handle fails.
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let sink = Self {
            path: path.into(),
            read_only: true,
        };
        sink.open_connection()?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_connection(&self) -> Result<Connection, SinkError> {
        let conn = if self.read_only {
            Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        } else {
            Connection::open(&self.path)?
        };
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Delete every row.
    pub fn clear(&self) -> Result<usize, SinkError> {
        let conn = self.open_connection()?;
        let deleted = conn.execute("DELETE FROM CosineTest2", [])?;
        debug!(deleted, "cleared table");
        Ok(deleted)
    }

    pub fn count(&self) -> Result<u64, SinkError> {
        let conn = self.open_connection()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM CosineTest2", [], |r| r.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Distinct sampling intervals present, ascending.
    pub fn intervals(&self) -> Result<Vec<u64>, SinkError> {
        let conn = self.open_connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT IntervalAtWhichCosineIsTaken FROM CosineTest2
             ORDER BY IntervalAtWhichCosineIsTaken",
        )?;
        let rows = stmt.query_map([], |r| r.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.max(0) as u64);
        }
        Ok(out)
    }

    /// Values and sample times for one interval, ordered by sample time.
    pub fn query_by_interval(&self, interval_ms: u64) -> Result<Vec<CosinePoint>, SinkError> {
        let conn = self.open_connection()?;
        let mut stmt = conn.prepare(
            "SELECT CosineOfCurrentAngle, TimeOfCosineOfCurrentAngle
             FROM CosineTest2
             WHERE IntervalAtWhichCosineIsTaken = ?1
             ORDER BY TimeOfCosineOfCurrentAngle",
        )?;
        let rows = stmt.query_map(params![interval_to_sql(interval_ms)], |r| {
            Ok(CosinePoint {
                // NaN is stored as NULL
                value: r.get::<_, Option<f64>>(0)?.unwrap_or(f64::NAN),
                time: r.get(1)?,
            })
        })?;
        let mut points = Vec::new();
        for point in rows {
            points.push(point?);
        }
        Ok(points)
    }
}

fn init_schema(conn: &Connection) -> Result<(), SinkError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS CosineTest2 (
            Id INTEGER PRIMARY KEY AUTOINCREMENT,
            InsertionTime TEXT NOT NULL,
            StartingOrSeedAngle REAL NOT NULL,
            AngleRotation REAL NOT NULL,
            CurrentAngle REAL NOT NULL,
            CosineOfCurrentAngle REAL,
            TimeOfCosineOfCurrentAngle TEXT NOT NULL,
            IntervalAtWhichCosineIsTaken INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cosine_interval_time
            ON CosineTest2(IntervalAtWhichCosineIsTaken, TimeOfCosineOfCurrentAngle);",
    )?;
    Ok(())
}

fn interval_to_sql(interval_ms: u64) -> i64 {
    i64::try_from(interval_ms).unwrap_or(i64::MAX)
}

fn insert(conn: &Connection, row: &Sample, inserted: DateTime<Utc>) -> Result<(), SinkError> {
    let mut stmt = conn.prepare_cached(INSERT_SQL)?;
    stmt.execute(params![
        inserted,
        row.seed_angle,
        row.rotation,
        row.current_angle,
        row.value,
        row.timestamp,
        interval_to_sql(row.interval_ms),
    ])?;
    Ok(())
}

impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut conn = self.open_connection()?;
        let tx = conn.transaction()?;
        let inserted = Utc::now();
        for row in rows {
            insert(&tx, row, inserted)?;
        }
        tx.commit()?;
        trace!(rows = rows.len(), "committed batch");
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError> {
        Ok(Box::new(SqliteConnection {
            conn: self.open_connection()?,
        }))
    }
}

struct SqliteConnection {
    conn: Connection,
}

impl SinkConnection for SqliteConnection {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError> {
        insert(&self.conn, row, Utc::now())
    }
}
