//! The sink contract.
//!
//! A sink accepts ordered batches (`write_batch`) and single rows through a
//! scoped connection (`connect` + `SinkConnection::write_one`). Both calls
//! are synchronous: callers hold their ingestion lock across them, so a slow
//! sink throttles every worker sharing that lock.

use dg_common::Sample;

use crate::error::SinkError;

/// Durable destination for samples.
pub trait Sink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write `rows` in order as one bulk operation.
    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError>;

    /// Open a connection scoped to the returned value.
    ///
    /// The connection is released when dropped, on success and on error.
    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError>;

    /// Write one row through a fresh connection.
    fn write_one(&self, row: &Sample) -> Result<(), SinkError> {
        let mut conn = self.connect()?;
        conn.write_one(row)
    }
}

/// A live connection to a sink, released on drop.
pub trait SinkConnection {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError>;
}
