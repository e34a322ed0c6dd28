//! Threshold-flushed batch buffer.
//!
//! `BatchBuffer` is not synchronized itself. On the bulk path it lives in a
//! [`SharedBuffer`] (one `Mutex` for the whole fleet) and `append` runs under
//! that lock, so at most one flush is ever in flight. On the channel path
//! it is owned outright by the consumer thread.
//!
//! A flush hands every buffered row to `Sink::write_batch` and then clears
//! the buffer whatever the outcome. Rows of a failed batch are lost.

use std::mem;
use std::sync::{Arc, Mutex};

use dg_common::Sample;
use dg_telemetry::{Sink, SinkError};
use tracing::{debug, warn};

use crate::guard::contain;
use crate::stats::IngestStats;

/// Buffer shared by all workers on the bulk path.
pub type SharedBuffer = Arc<Mutex<BatchBuffer>>;

/// Result of one flush.
#[derive(Debug)]
pub struct FlushOutcome {
    /// Rows handed to the sink.
    pub rows: usize,
    pub result: Result<(), SinkError>,
}

impl FlushOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct BatchBuffer {
    rows: Vec<Sample>,
    threshold: usize,
    sink: Arc<dyn Sink>,
    stats: Arc<IngestStats>,
}

impl std::fmt::Debug for BatchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchBuffer")
            .field("len", &self.rows.len())
            .field("threshold", &self.threshold)
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl BatchBuffer {
    /// Create a buffer flushing to `sink` every `threshold` rows.
    ///
    /// A threshold of 0 is treated as 1.
    pub fn new(sink: Arc<dyn Sink>, threshold: usize, stats: Arc<IngestStats>) -> Self {
        let threshold = threshold.max(1);
        Self {
            rows: Vec::with_capacity(threshold),
            threshold,
            sink,
            stats,
        }
    }

    pub fn into_shared(self) -> SharedBuffer {
        Arc::new(Mutex::new(self))
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Buffered rows, in append order.
    pub fn pending(&self) -> &[Sample] {
        &self.rows
    }

    /// Append at the tail; flush first-thing if the threshold is reached.
    pub fn append(&mut self, sample: Sample) -> Option<FlushOutcome> {
        self.rows.push(sample);
        if self.rows.len() >= self.threshold {
            Some(self.flush())
        } else {
            None
        }
    }

    /// Write every buffered row as one batch, then clear.
    pub fn flush(&mut self) -> FlushOutcome {
        let batch = mem::replace(&mut self.rows, Vec::with_capacity(self.threshold));
        let rows = batch.len();
        if rows == 0 {
            return FlushOutcome {
                rows,
                result: Ok(()),
            };
        }

        let sink = Arc::clone(&self.sink);
        let result = contain(|| sink.write_batch(&batch));
        match &result {
            Ok(()) => {
                self.stats.record_batch_ok(rows);
                debug!(rows, sink = sink.name(), "flushed batch");
            }
            Err(e) => {
                self.stats.record_batch_failed(rows);
                warn!(rows, sink = sink.name(), error = %e, kind = e.kind(), "batch write failed; rows dropped");
            }
        }
        FlushOutcome { rows, result }
    }

    /// Drop buffered rows without writing them. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let n = self.rows.len();
        self.rows.clear();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dg_common::WorkerId;
    use dg_telemetry::MemorySink;

    fn sample(seq: u64) -> Sample {
        Sample {
            worker_id: WorkerId(0),
            sequence: seq,
            seed_angle: 0.0,
            rotation: 1.0,
            current_angle: seq as f64,
            value: 1.0,
            timestamp: Utc::now(),
            interval_ms: 10,
        }
    }

    fn buffer(threshold: usize) -> (Arc<MemorySink>, Arc<IngestStats>, BatchBuffer) {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let buf = BatchBuffer::new(sink.clone(), threshold, stats.clone());
        (sink, stats, buf)
    }

    #[test]
    fn threshold_three_flushes_exactly_three() {
        let (sink, stats, mut buf) = buffer(3);
        assert!(buf.append(sample(0)).is_none());
        assert!(buf.append(sample(1)).is_none());
        let outcome = buf.append(sample(2)).expect("third append flushes");

        assert_eq!(outcome.rows, 3);
        assert!(outcome.is_ok());
        assert!(buf.is_empty());
        assert_eq!(sink.batch_sizes(), vec![3]);
        let seqs: Vec<u64> = sink.rows().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(stats.snapshot().rows_written, 3);
    }

    #[test]
    fn failed_flush_clears_and_keeps_accepting() {
        let (sink, stats, mut buf) = buffer(2);
        sink.fail_next(1);

        buf.append(sample(0));
        let outcome = buf.append(sample(1)).unwrap();
        assert!(!outcome.is_ok());
        assert!(buf.is_empty());

        buf.append(sample(2));
        let outcome = buf.append(sample(3)).unwrap();
        assert!(outcome.is_ok());

        let seqs: Vec<u64> = sink.rows().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![2, 3]);
        let snap = stats.snapshot();
        assert_eq!(snap.batches_failed, 1);
        assert_eq!(snap.rows_dropped, 2);
        assert_eq!(snap.batches_flushed, 1);
    }

    #[test]
    fn sink_panic_is_a_failed_flush() {
        let (sink, _stats, mut buf) = buffer(1);
        sink.panic_next();
        let outcome = buf.append(sample(0)).unwrap();
        assert!(matches!(outcome.result, Err(SinkError::Panicked(_))));
        assert!(buf.is_empty());
        assert!(buf.append(sample(1)).unwrap().is_ok());
    }

    #[test]
    fn empty_flush_skips_sink() {
        let (sink, _stats, mut buf) = buffer(5);
        let outcome = buf.flush();
        assert_eq!(outcome.rows, 0);
        assert_eq!(sink.batch_attempts(), 0);
    }

    #[test]
    fn zero_threshold_behaves_as_one() {
        let (sink, _stats, mut buf) = buffer(0);
        assert_eq!(buf.threshold(), 1);
        assert!(buf.append(sample(0)).is_some());
        assert_eq!(sink.batch_sizes(), vec![1]);
    }

    #[test]
    fn discard_drops_pending() {
        let (sink, _stats, mut buf) = buffer(10);
        buf.append(sample(0));
        buf.append(sample(1));
        assert_eq!(buf.pending().len(), 2);
        assert_eq!(buf.discard(), 2);
        assert!(buf.is_empty());
        assert_eq!(sink.batch_attempts(), 0);
    }
}
