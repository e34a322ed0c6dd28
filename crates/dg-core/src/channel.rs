//! Channel ingestion path.
//!
//! Workers send samples over a bounded `crossbeam-channel` without taking
//! any lock. One consumer thread owns the `BatchBuffer` and applies the
//! same threshold flush as the bulk path. A full channel blocks senders.
//! The consumer exits once every sender is dropped.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use dg_common::{Error, Sample};
use serde::Serialize;
use tracing::{info, warn};

use crate::buffer::BatchBuffer;

/// What the consumer did with the rows it received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerReport {
    pub received: u64,
    pub flushes: u64,
    /// Rows still buffered when the channel closed and not flushed.
    pub abandoned: u64,
}

/// Create the worker-facing sender and the consumer-facing receiver.
pub fn ingest_channel(capacity: usize) -> (Sender<Sample>, Receiver<Sample>) {
    bounded(capacity.max(1))
}

/// Drain `rx` into `buffer` until every sender is gone.
pub fn consume(rx: Receiver<Sample>, mut buffer: BatchBuffer, flush_on_close: bool) -> ConsumerReport {
    let mut report = ConsumerReport::default();
    for sample in rx.iter() {
        report.received += 1;
        if buffer.append(sample).is_some() {
            report.flushes += 1;
        }
    }

    if !buffer.is_empty() {
        if flush_on_close {
            buffer.flush();
            report.flushes += 1;
        } else {
            report.abandoned = buffer.discard() as u64;
            warn!(rows = report.abandoned, "channel closed with unflushed rows; abandoning");
        }
    }
    info!(received = report.received, flushes = report.flushes, "ingest consumer finished");
    report
}

/// Run [`consume`] on a named thread.
pub fn spawn_consumer(
    rx: Receiver<Sample>,
    buffer: BatchBuffer,
    flush_on_close: bool,
) -> Result<JoinHandle<ConsumerReport>, Error> {
    thread::Builder::new()
        .name("dg-ingest-consumer".to_string())
        .spawn(move || consume(rx, buffer, flush_on_close))
        .map_err(|e| Error::Spawn(format!("ingest consumer: {}", e)))
}
