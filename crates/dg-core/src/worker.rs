//! Sampling workers.
//!
//! A worker owns one `CosineGenerator` and loops until its stop signal is
//! set. Each iteration: take the path's lock, snapshot the generator, step
//! it, stamp the time, build a `Sample`, hand it to the path (the bulk path
//! may flush here, still under the lock), release the lock, then sleep for
//! the interval. The stop signal is checked once at the top of the loop, so
//! a worker runs at most one more iteration after `cancel()`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::Sender;
use dg_common::{Error, Sample, WorkerId};
use dg_math::{CosineGenerator, GeneratorEvent, GeneratorState};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::buffer::SharedBuffer;
use crate::cancel::StopSignal;
use crate::guard::lock_or_recover;
use crate::single::SingleWriter;
use crate::stats::IngestStats;

/// Where a worker submits its samples.
#[derive(Clone)]
pub enum Route {
    /// Shared buffer; the lock is held across sampling and any flush.
    Bulk(SharedBuffer),
    /// Single-row writer; the lock is held across sampling and the write.
    Single(Arc<SingleWriter>),
    /// Channel to the consumer thread; no lock.
    Channel(Sender<Sample>),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Bulk(_) => "bulk",
            Route::Single(_) => "single",
            Route::Channel(_) => "channel",
        }
    }
}

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Running,
    /// Stop observed; finishing the current iteration.
    Stopping,
    Stopped,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WorkerState::Running,
            1 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// What a worker did, returned from its thread.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    pub worker_id: WorkerId,
    pub interval_ms: u64,
    pub samples: u64,
    pub resets: u64,
    pub final_state: GeneratorState,
}

/// Per-worker settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub generator: CosineGenerator,
    pub interval: Duration,
    pub startup_delay: Duration,
}

impl WorkerConfig {
    pub fn new(generator: CosineGenerator, interval: Duration) -> Self {
        Self {
            generator,
            interval,
            startup_delay: Duration::ZERO,
        }
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}

pub struct Worker {
    id: WorkerId,
    config: WorkerConfig,
    route: Route,
    stop: StopSignal,
    stats: Arc<IngestStats>,
    state: SharedState,
    sequence: u64,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        config: WorkerConfig,
        route: Route,
        stop: StopSignal,
        stats: Arc<IngestStats>,
    ) -> Self {
        Self {
            id,
            config,
            route,
            stop,
            stats,
            state: SharedState::default(),
            sequence: 0,
        }
    }

    /// Run on a named OS thread.
    pub fn spawn(self) -> Result<WorkerHandle, Error> {
        let id = self.id;
        let state = self.state.clone();
        let stop = self.stop.clone();
        let join = thread::Builder::new()
            .name(id.thread_name())
            .spawn(move || self.run())
            .map_err(|e| Error::Spawn(format!("worker {}: {}", id, e)))?;
        Ok(WorkerHandle {
            id,
            state,
            stop,
            join,
        })
    }

    /// Run the sampling loop on the current thread until stopped.
    pub fn run(mut self) -> WorkerReport {
        self.state.set(WorkerState::Running);
        info!(
            worker = %self.id,
            route = self.route.name(),
            seed_angle = self.config.generator.starting_angle(),
            rotation = self.config.generator.rotation(),
            interval_ms = self.interval_ms(),
            "worker started"
        );

        if !self.config.startup_delay.is_zero() {
            thread::sleep(self.config.startup_delay);
        }

        while !self.stop.is_cancelled() {
            self.step();
            thread::sleep(self.config.interval);
        }
        self.state.set(WorkerState::Stopping);

        let report = WorkerReport {
            worker_id: self.id,
            interval_ms: self.interval_ms(),
            samples: self.sequence,
            resets: self.config.generator.reset_count(),
            final_state: self.config.generator.state(),
        };
        self.state.set(WorkerState::Stopped);
        info!(worker = %self.id, samples = report.samples, resets = report.resets, "worker stopped");
        report
    }

    fn interval_ms(&self) -> u64 {
        u64::try_from(self.config.interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// One sample-and-submit, under the route's lock.
    fn step(&mut self) {
        match self.route.clone() {
            Route::Bulk(buffer) => {
                let mut buffer = lock_or_recover(&buffer);
                let sample = self.sample();
                buffer.append(sample);
            }
            Route::Single(writer) => {
                let mut guard = writer.lock();
                let sample = self.sample();
                // Failure is logged and counted by the writer.
                let _ = guard.write(&sample);
            }
            Route::Channel(tx) => {
                let sample = self.sample();
                if tx.send(sample).is_err() {
                    self.stats.record_dropped(1);
                    warn!(worker = %self.id, "ingest channel closed; sample dropped");
                }
            }
        }
    }

    fn sample(&mut self) -> Sample {
        let before = self.config.generator.state();
        let (value, event) = self.config.generator.next_with_event();
        let timestamp = Utc::now();

        if event == Some(GeneratorEvent::Reset) {
            self.stats.record_reset();
            debug!(worker = %self.id, angle = before.current_angle, "generator reset");
        }
        self.stats.record_sample();

        let sample = Sample {
            worker_id: self.id,
            sequence: self.sequence,
            seed_angle: before.starting_angle,
            rotation: before.rotation,
            current_angle: before.current_angle,
            value,
            timestamp,
            interval_ms: self.interval_ms(),
        };
        self.sequence += 1;
        trace!(worker = %self.id, sequence = sample.sequence, value, "sampled");
        sample
    }
}

/// A spawned worker.
pub struct WorkerHandle {
    id: WorkerId,
    state: SharedState,
    stop: StopSignal,
    join: JoinHandle<WorkerReport>,
}

impl WorkerHandle {
    /// `Stopping` from the moment the stop signal is set until the thread
    /// has left its loop.
    pub fn state(&self) -> WorkerState {
        match self.state.get() {
            WorkerState::Running if self.stop.is_cancelled() => WorkerState::Stopping,
            state => state,
        }
    }

    /// Wait for the thread. A panicked worker yields `Error::WorkerPanicked`.
    pub fn join(self) -> Result<WorkerReport, Error> {
        let id = self.id;
        self.join.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Error::WorkerPanicked {
                worker: id.0,
                message,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BatchBuffer;
    use dg_math::cos_degrees;
    use dg_telemetry::MemorySink;
    use std::time::Instant;

    fn generator(angle: f64, rotation: f64) -> CosineGenerator {
        CosineGenerator::new(angle, rotation).unwrap()
    }

    #[test]
    fn samples_snapshot_pre_step_state() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let buffer = BatchBuffer::new(sink.clone(), 3, stats.clone()).into_shared();
        let stop = StopSignal::new();
        let mut worker = Worker::new(
            WorkerId(0),
            WorkerConfig::new(generator(0.0, 1.0), Duration::from_millis(1)),
            Route::Bulk(buffer),
            stop,
            stats.clone(),
        );

        for _ in 0..3 {
            worker.step();
        }

        let rows = sink.rows();
        assert_eq!(rows.len(), 3);
        let angles: Vec<f64> = rows.iter().map(|r| r.current_angle).collect();
        assert_eq!(angles, vec![0.0, 1.0, 2.0]);
        assert_eq!(rows[0].value, 1.0);
        assert!((rows[1].value - cos_degrees(1.0)).abs() < 1e-12);
        assert!((rows[2].value - cos_degrees(2.0)).abs() < 1e-12);
        assert!(rows.iter().all(|r| r.seed_angle == 0.0 && r.rotation == 1.0));
        assert_eq!(stats.snapshot().samples_produced, 3);
    }

    #[test]
    fn reset_is_counted_and_sample_keeps_pre_reset_fields() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let writer = Arc::new(SingleWriter::new(sink.clone(), stats.clone()));
        let mut worker = Worker::new(
            WorkerId(1),
            WorkerConfig::new(generator(1e300, f64::MAX), Duration::from_millis(1)),
            Route::Single(writer),
            StopSignal::new(),
            stats.clone(),
        );

        worker.step();
        worker.step();

        let rows = sink.singles();
        assert_eq!(rows[0].rotation, f64::MAX);
        assert_eq!(rows[1].current_angle, 0.0);
        assert_eq!(rows[1].rotation, 1.0);
        assert_eq!(stats.snapshot().resets, 1);
    }

    #[test]
    fn pre_cancelled_worker_produces_nothing() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let writer = Arc::new(SingleWriter::new(sink.clone(), stats.clone()));
        let stop = StopSignal::new();
        stop.cancel();

        let report = Worker::new(
            WorkerId(2),
            WorkerConfig::new(generator(0.0, 1.0), Duration::from_millis(1)),
            Route::Single(writer),
            stop,
            stats,
        )
        .run();

        assert_eq!(report.samples, 0);
        assert_eq!(report.final_state, generator(0.0, 1.0).state());
        assert_eq!(sink.row_count(), 0);
    }

    #[test]
    fn spawned_worker_stops_within_one_iteration() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let writer = Arc::new(SingleWriter::new(sink.clone(), stats.clone()));
        let stop = StopSignal::new();
        let interval = Duration::from_millis(20);

        let handle = Worker::new(
            WorkerId(4),
            WorkerConfig::new(generator(0.0, 1.0), interval),
            Route::Single(writer),
            stop.clone(),
            stats,
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(handle.state(), WorkerState::Running);
        let cancelled = Instant::now();
        stop.cancel();
        let produced_at_cancel = sink.row_count() as u64;

        let report = handle.join().unwrap();
        assert!(cancelled.elapsed() < interval * 25);
        assert!(report.samples <= produced_at_cancel + 1);
        assert_eq!(report.samples, sink.row_count() as u64);
    }

    #[test]
    fn state_is_stopping_between_cancel_and_join() {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let writer = Arc::new(SingleWriter::new(sink.clone(), stats.clone()));
        let stop = StopSignal::new();

        let handle = Worker::new(
            WorkerId(6),
            WorkerConfig::new(generator(0.0, 1.0), Duration::from_millis(500)),
            Route::Single(writer),
            stop.clone(),
            stats,
        )
        .spawn()
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(handle.state(), WorkerState::Running);
        stop.cancel();
        // Still sleeping out the interval of its last iteration.
        assert_eq!(handle.state(), WorkerState::Stopping);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(handle.state(), WorkerState::Stopping);

        let report = handle.join().unwrap();
        assert_eq!(report.samples, 1);
    }

    #[test]
    fn closed_channel_counts_drops() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        drop(rx);
        let stats = Arc::new(IngestStats::new());
        let mut worker = Worker::new(
            WorkerId(5),
            WorkerConfig::new(generator(0.0, 1.0), Duration::from_millis(1)),
            Route::Channel(tx),
            StopSignal::new(),
            stats.clone(),
        );
        worker.step();
        assert_eq!(stats.snapshot().rows_dropped, 1);
    }
}
