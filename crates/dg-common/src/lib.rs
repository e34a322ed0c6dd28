//! Data generator common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the workspace:
//! - The `Sample` row produced by workers and consumed by sinks
//! - Worker and run identifiers
//! - The logical row schema and its version
//! - Common error types
//! - Output format selection

pub mod error;
pub mod id;
pub mod output;
pub mod sample;
pub mod schema;

pub use error::Error;
pub use id::{RunId, WorkerId};
pub use output::OutputFormat;
pub use sample::{Sample, SampleKey};
pub use schema::{Column, COLUMNS, SCHEMA_VERSION, TABLE_NAME};
