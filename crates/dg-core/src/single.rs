//! Single-row writer.
//!
//! Each write opens a connection through `Sink::connect`, writes one row and
//! drops the connection, all under one lock shared by every worker on the
//! single path. A failed write loses that row only.

use std::sync::{Arc, Mutex, MutexGuard};

use dg_common::Sample;
use dg_telemetry::{Sink, SinkError};
use tracing::{trace, warn};

use crate::guard::{contain, lock_or_recover};
use crate::stats::IngestStats;

pub struct SingleWriter {
    lock: Mutex<()>,
    sink: Arc<dyn Sink>,
    stats: Arc<IngestStats>,
}

/// Held while a worker samples and writes on the single path.
pub struct SingleWriterGuard<'a> {
    writer: &'a SingleWriter,
    _lock: MutexGuard<'a, ()>,
}

impl SingleWriter {
    pub fn new(sink: Arc<dyn Sink>, stats: Arc<IngestStats>) -> Self {
        Self {
            lock: Mutex::new(()),
            sink,
            stats,
        }
    }

    /// Take the writer lock.
    pub fn lock(&self) -> SingleWriterGuard<'_> {
        SingleWriterGuard {
            writer: self,
            _lock: lock_or_recover(&self.lock),
        }
    }

    /// Lock, write one row, unlock.
    pub fn write(&self, sample: &Sample) -> Result<(), SinkError> {
        self.lock().write(sample)
    }

    fn write_unlocked(&self, sample: &Sample) -> Result<(), SinkError> {
        let sink = &self.sink;
        let result = contain(|| {
            let mut conn = sink.connect()?;
            conn.write_one(sample)
        });
        match &result {
            Ok(()) => {
                self.stats.record_single_ok();
                trace!(worker = %sample.worker_id, sequence = sample.sequence, "wrote row");
            }
            Err(e) => {
                self.stats.record_single_failed();
                warn!(
                    worker = %sample.worker_id,
                    sequence = sample.sequence,
                    sink = sink.name(),
                    error = %e,
                    "single-row write failed; row dropped"
                );
            }
        }
        result
    }
}

impl SingleWriterGuard<'_> {
    pub fn write(&mut self, sample: &Sample) -> Result<(), SinkError> {
        self.writer.write_unlocked(sample)
    }
}
