//! Fleet orchestration.
//!
//! A fleet starts one worker thread per configured `WorkerSpec`, all wired
//! to the same ingestion path and sink, lets them run for the configured
//! duration, then signals stop and joins them.
//!
//! On stop, rows still sitting in the buffer are either flushed
//! (`flush_on_stop`) or abandoned with a warning.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dg_common::{Error, RunId, WorkerId};
use dg_config::{FleetConfig, IngestPath};
use dg_math::CosineGenerator;
use dg_telemetry::Sink;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::buffer::{BatchBuffer, SharedBuffer};
use crate::cancel::StopSignal;
use crate::channel::{ingest_channel, spawn_consumer, ConsumerReport};
use crate::guard::lock_or_recover;
use crate::single::SingleWriter;
use crate::stats::{IngestStats, StatsSnapshot};
use crate::worker::{Route, Worker, WorkerConfig, WorkerHandle, WorkerReport};

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub run_id: RunId,
    pub path: IngestPath,
    pub sink: String,
    pub elapsed_ms: u64,
    pub workers: Vec<WorkerReport>,
    /// Workers whose thread panicked, with the panic message.
    pub worker_panics: Vec<String>,
    /// Buffered rows neither flushed nor written at stop.
    pub rows_abandoned: u64,
    pub stats: StatsSnapshot,
}

impl FleetReport {
    /// True when every sink write succeeded and no worker panicked.
    pub fn is_clean(&self) -> bool {
        !self.stats.has_failures() && self.worker_panics.is_empty()
    }
}

pub struct Fleet {
    config: FleetConfig,
    sink: Arc<dyn Sink>,
}

enum Ingest {
    Bulk(SharedBuffer),
    Single,
    Channel(JoinHandle<ConsumerReport>),
}

impl Fleet {
    pub fn new(config: FleetConfig, sink: Arc<dyn Sink>) -> Self {
        Self { config, sink }
    }

    /// Run for the configured duration, then stop.
    pub fn run(&self) -> Result<FleetReport, Error> {
        self.run_for(self.config.run_duration())
    }

    pub fn run_for(&self, duration: Duration) -> Result<FleetReport, Error> {
        let running = self.start()?;
        thread::sleep(duration);
        Ok(running.stop())
    }

    /// Spawn the workers (and the consumer, on the channel path).
    pub fn start(&self) -> Result<RunningFleet, Error> {
        let generators = self
            .config
            .workers
            .iter()
            .enumerate()
            .map(|(i, w)| {
                CosineGenerator::new(w.seed_angle, w.rotation)
                    .map_err(|e| Error::InvalidArgument(format!("workers[{}]: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let run_id = RunId::new();
        let stats = Arc::new(IngestStats::new());
        let stop = StopSignal::new();
        let threshold = self.config.batch.threshold;

        let (route, ingest) = match self.config.path {
            IngestPath::Bulk => {
                let buffer =
                    BatchBuffer::new(Arc::clone(&self.sink), threshold, Arc::clone(&stats))
                        .into_shared();
                (Route::Bulk(Arc::clone(&buffer)), Ingest::Bulk(buffer))
            }
            IngestPath::Single => {
                let writer = SingleWriter::new(Arc::clone(&self.sink), Arc::clone(&stats));
                (Route::Single(Arc::new(writer)), Ingest::Single)
            }
            IngestPath::Channel => {
                let buffer =
                    BatchBuffer::new(Arc::clone(&self.sink), threshold, Arc::clone(&stats));
                let (tx, rx) = ingest_channel(self.config.batch.effective_channel_capacity());
                let consumer = spawn_consumer(rx, buffer, self.config.flush_on_stop)?;
                (Route::Channel(tx), Ingest::Channel(consumer))
            }
        };

        info!(
            run_id = %run_id,
            path = %self.config.path,
            sink = self.sink.name(),
            workers = generators.len(),
            threshold,
            "starting fleet"
        );

        let mut handles = Vec::with_capacity(generators.len());
        for (i, (generator, spec)) in generators.into_iter().zip(&self.config.workers).enumerate() {
            let config = WorkerConfig::new(generator, spec.interval())
                .with_startup_delay(self.config.startup_delay());
            let worker = Worker::new(
                WorkerId(i as u32),
                config,
                route.clone(),
                stop.clone(),
                Arc::clone(&stats),
            );
            match worker.spawn() {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.cancel();
                    for h in handles {
                        let _ = h.join();
                    }
                    return Err(e);
                }
            }
        }
        // Workers hold the only remaining senders.
        drop(route);

        Ok(RunningFleet {
            run_id,
            path: self.config.path,
            sink_name: self.sink.name(),
            flush_on_stop: self.config.flush_on_stop,
            stop,
            stats,
            handles,
            ingest,
            started: Instant::now(),
        })
    }
}

/// A fleet whose workers are running.
pub struct RunningFleet {
    run_id: RunId,
    path: IngestPath,
    sink_name: &'static str,
    flush_on_stop: bool,
    stop: StopSignal,
    stats: Arc<IngestStats>,
    handles: Vec<WorkerHandle>,
    ingest: Ingest,
    started: Instant,
}

impl RunningFleet {
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Signal stop, join every worker, and settle buffered rows.
    pub fn stop(self) -> FleetReport {
        self.stop.cancel();
        info!(run_id = %self.run_id, "stop signalled; waiting for workers");

        let mut workers = Vec::with_capacity(self.handles.len());
        let mut worker_panics = Vec::new();
        for handle in self.handles {
            match handle.join() {
                Ok(report) => workers.push(report),
                Err(e) => {
                    error!(error = %e, "worker thread panicked");
                    worker_panics.push(e.to_string());
                }
            }
        }

        let rows_abandoned = match self.ingest {
            Ingest::Bulk(buffer) => {
                let mut buffer = lock_or_recover(&buffer);
                if buffer.is_empty() {
                    0
                } else if self.flush_on_stop {
                    buffer.flush();
                    0
                } else {
                    let n = buffer.discard() as u64;
                    warn!(rows = n, "fleet stopped with unflushed rows; abandoning");
                    n
                }
            }
            Ingest::Single => 0,
            Ingest::Channel(consumer) => match consumer.join() {
                Ok(report) => report.abandoned,
                Err(_) => {
                    error!("ingest consumer panicked");
                    worker_panics.push("ingest consumer panicked".to_string());
                    0
                }
            },
        };

        let stats = self.stats.snapshot();
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            run_id = %self.run_id,
            elapsed_ms,
            samples = stats.samples_produced,
            rows_written = stats.rows_written,
            rows_dropped = stats.rows_dropped,
            rows_abandoned,
            "fleet stopped"
        );

        FleetReport {
            run_id: self.run_id,
            path: self.path,
            sink: self.sink_name.to_string(),
            elapsed_ms,
            workers,
            worker_panics,
            rows_abandoned,
            stats,
        }
    }
}
