//! Ingestion counters.
//!
//! One `IngestStats` is shared (via `Arc`) by every worker, buffer and
//! writer of a fleet. Counters are relaxed atomics; read them through
//! [`IngestStats::snapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct IngestStats {
    samples_produced: AtomicU64,
    resets: AtomicU64,
    batches_flushed: AtomicU64,
    batches_failed: AtomicU64,
    rows_written: AtomicU64,
    rows_dropped: AtomicU64,
    single_writes: AtomicU64,
    single_writes_failed: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatsSnapshot {
    pub samples_produced: u64,
    pub resets: u64,
    pub batches_flushed: u64,
    pub batches_failed: u64,
    /// Rows the sink accepted, batched or single.
    pub rows_written: u64,
    /// Rows lost to failed writes.
    pub rows_dropped: u64,
    pub single_writes: u64,
    pub single_writes_failed: u64,
}

impl StatsSnapshot {
    pub fn has_failures(&self) -> bool {
        self.batches_failed > 0 || self.single_writes_failed > 0
    }
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&self) {
        self.samples_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_ok(&self, rows: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_batch_failed(&self, rows: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.rows_dropped.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_single_ok(&self) {
        self.single_writes.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_single_failed(&self) {
        self.single_writes.fetch_add(1, Ordering::Relaxed);
        self.single_writes_failed.fetch_add(1, Ordering::Relaxed);
        self.rows_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows that never reached a sink write, e.g. a closed channel.
    pub fn record_dropped(&self, rows: usize) {
        self.rows_dropped.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_produced: self.samples_produced.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            rows_dropped: self.rows_dropped.load(Ordering::Relaxed),
            single_writes: self.single_writes.load(Ordering::Relaxed),
            single_writes_failed: self.single_writes_failed.load(Ordering::Relaxed),
        }
    }
}
