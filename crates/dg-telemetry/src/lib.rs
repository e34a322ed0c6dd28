//! Data generator sinks.
//!
//! This crate provides:
//! - The `Sink` / `SinkConnection` contract used by the ingestion paths
//! - An in-memory sink with failure injection for tests and dry runs
//! - Durable sinks: JSON lines, SQLite table, Parquet part files
//! - `SinkSpec` for selecting and opening a sink from a string

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod parquet_sink;
pub mod schema;
pub mod sink;
pub mod spec;
pub mod sqlite;

pub use error::SinkError;
pub use jsonl::JsonlSink;
pub use memory::MemorySink;
pub use parquet_sink::{Compression, ParquetSink};
pub use schema::samples_schema;
pub use sink::{Sink, SinkConnection};
pub use spec::SinkSpec;
pub use sqlite::{CosinePoint, SqliteSink};

/// Default batch size for buffered writes.
pub const DEFAULT_BATCH_SIZE: usize = 300;
