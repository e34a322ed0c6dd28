//! Data generator ingestion engine.
//!
//! This crate provides:
//! - Sampling workers, one OS thread each, driven by a shared stop signal
//! - The bulk path: a shared `BatchBuffer` flushed to the sink at a threshold
//! - The single path: one scoped sink connection per row
//! - The channel path: lock-free sends to a consumer that owns the buffer
//! - Fleet orchestration, counters, logging setup and the CLI

pub mod buffer;
pub mod cancel;
pub mod channel;
pub mod cli;
pub mod exit_codes;
pub mod fleet;
pub mod guard;
pub mod logging;
pub mod single;
pub mod stats;
pub mod worker;

pub use buffer::{BatchBuffer, FlushOutcome, SharedBuffer};
pub use cancel::StopSignal;
pub use channel::{consume, ingest_channel, spawn_consumer, ConsumerReport};
pub use exit_codes::ExitCode;
pub use fleet::{Fleet, FleetReport, RunningFleet};
pub use single::{SingleWriter, SingleWriterGuard};
pub use stats::{IngestStats, StatsSnapshot};
pub use worker::{Route, Worker, WorkerConfig, WorkerHandle, WorkerReport, WorkerState};
