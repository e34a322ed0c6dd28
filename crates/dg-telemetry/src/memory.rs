//! In-memory sink.
//!
//! Keeps every accepted batch and single row in process memory. Writes can
//! be made to fail (or panic) on demand, and connection open/close counts
//! are tracked so callers can check that scoped connections are released.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dg_common::Sample;

use crate::error::SinkError;
use crate::sink::{Sink, SinkConnection};

#[derive(Debug, Default)]
struct MemoryState {
    batches: Vec<Vec<Sample>>,
    singles: Vec<Sample>,
    rows: Vec<Sample>,
}

/// Sink that stores rows in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
    batch_attempts: AtomicUsize,
    single_attempts: AtomicUsize,
    fail_next: AtomicUsize,
    failing: AtomicBool,
    panic_next: AtomicBool,
    connections_opened: AtomicUsize,
    connections_closed: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` writes fail with `SinkError::Rejected`.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make every write fail until switched back off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make the next write panic.
    pub fn panic_next(&self) {
        self.panic_next.store(true, Ordering::SeqCst);
    }

    /// Accepted batches, in write order.
    pub fn batches(&self) -> Vec<Vec<Sample>> {
        self.state().batches.clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state().batches.iter().map(Vec::len).collect()
    }

    /// Accepted single-row writes, in write order.
    pub fn singles(&self) -> Vec<Sample> {
        self.state().singles.clone()
    }

    /// Every accepted row, batched or single, in write order.
    pub fn rows(&self) -> Vec<Sample> {
        self.state().rows.clone()
    }

    pub fn row_count(&self) -> usize {
        self.state().rows.len()
    }

    /// `write_batch` calls, including failed ones.
    pub fn batch_attempts(&self) -> usize {
        self.batch_attempts.load(Ordering::SeqCst)
    }

    /// Single-row writes attempted, including failed ones.
    pub fn single_attempts(&self) -> usize {
        self.single_attempts.load(Ordering::SeqCst)
    }

    pub fn connections_opened(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
    }

    /// Connections opened and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.connections_opened.load(Ordering::SeqCst)
            - self.connections_closed.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies injected failures before a write.
    fn admit(&self) -> Result<(), SinkError> {
        if self.panic_next.swap(false, Ordering::SeqCst) {
            panic!("memory sink: injected panic");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected("memory sink is failing".to_string()));
        }
        let take = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if take.is_ok() {
            return Err(SinkError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError> {
        self.batch_attempts.fetch_add(1, Ordering::SeqCst);
        self.admit()?;
        let mut state = self.state();
        state.batches.push(rows.to_vec());
        state.rows.extend_from_slice(rows);
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError> {
        self.connections_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection { sink: self }))
    }
}

struct MemoryConnection<'a> {
    sink: &'a MemorySink,
}

impl SinkConnection for MemoryConnection<'_> {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError> {
        self.sink.single_attempts.fetch_add(1, Ordering::SeqCst);
        self.sink.admit()?;
        let mut state = self.sink.state();
        state.singles.push(row.clone());
        state.rows.push(row.clone());
        Ok(())
    }
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        self.sink.connections_closed.fetch_add(1, Ordering::SeqCst);
    }
}
