//! Data generator fleet configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for fleet configuration files (TOML or JSON)
//! - Config resolution (CLI → env → preset → defaults)
//! - Semantic validation that reports every problem at once
//! - Built-in fleet presets

pub mod fleet;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use fleet::{BatchSettings, FleetConfig, IngestPath, WorkerSpec};
pub use preset::{get_preset, list_presets, PresetError, PresetInfo, PresetName};
pub use resolve::{resolve_config, resolve_config_with, ConfigSource, ResolvedConfig, CONFIG_ENV_VAR};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
