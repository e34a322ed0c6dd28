//! Fleet configuration types.
//!
//! A fleet is a set of sampling workers sharing one ingestion path and one
//! sink. Files are TOML or JSON, chosen by extension; every field except
//! `workers` has a default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use dg_telemetry::{SinkSpec, DEFAULT_BATCH_SIZE};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;
use crate::CONFIG_SCHEMA_VERSION;

/// How workers hand samples to the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngestPath {
    /// Shared buffer under one lock, flushed at the threshold.
    #[default]
    Bulk,
    /// One row per write through a scoped connection.
    Single,
    /// Lock-free send to a consumer thread that owns the buffer.
    Channel,
}

impl fmt::Display for IngestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestPath::Bulk => write!(f, "bulk"),
            IngestPath::Single => write!(f, "single"),
            IngestPath::Channel => write!(f, "channel"),
        }
    }
}

impl FromStr for IngestPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bulk" => Ok(IngestPath::Bulk),
            "single" => Ok(IngestPath::Single),
            "channel" => Ok(IngestPath::Channel),
            _ => Err(format!(
                "unknown ingest path '{}' (expected bulk, single, or channel)",
                s
            )),
        }
    }
}

/// Buffering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSettings {
    /// Buffered row count that triggers a flush.
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Channel capacity for the channel path. Defaults to 4 × threshold.
    #[serde(default)]
    pub channel_capacity: Option<usize>,
}

fn default_threshold() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            channel_capacity: None,
        }
    }
}

impl BatchSettings {
    pub fn effective_channel_capacity(&self) -> usize {
        self.channel_capacity
            .unwrap_or_else(|| self.threshold.saturating_mul(4))
            .max(1)
    }
}

/// One sampling worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerSpec {
    /// Starting angle in degrees.
    pub seed_angle: f64,
    /// Degrees added per sample.
    pub rotation: f64,
    /// Sleep between samples, in milliseconds.
    pub interval_ms: u64,
}

impl WorkerSpec {
    pub fn new(seed_angle: f64, rotation: f64, interval_ms: u64) -> Self {
        Self {
            seed_angle,
            rotation,
            interval_ms,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Complete fleet configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FleetConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// How long the fleet samples before stop is signalled.
    #[serde(default = "default_run_duration_secs")]
    pub run_duration_secs: u64,

    #[serde(default)]
    pub path: IngestPath,

    #[serde(default)]
    pub batch: BatchSettings,

    /// Flush rows still buffered when the fleet stops.
    #[serde(default)]
    pub flush_on_stop: bool,

    /// Delay before each worker's first sample.
    #[serde(default)]
    pub startup_delay_ms: u64,

    /// Empty the sink's table before the run (SQLite only).
    #[serde(default)]
    pub clear_before_run: bool,

    #[serde(default)]
    #[schemars(with = "String")]
    pub sink: SinkSpec,

    #[serde(default)]
    pub workers: Vec<WorkerSpec>,
}

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

fn default_run_duration_secs() -> u64 {
    5
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            run_duration_secs: default_run_duration_secs(),
            path: IngestPath::default(),
            batch: BatchSettings::default(),
            flush_on_stop: false,
            startup_delay_ms: 0,
            clear_before_run: false,
            sink: SinkSpec::default(),
            workers: Vec::new(),
        }
    }
}

impl FleetConfig {
    /// Load a config file; `.json` is parsed as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_toml(&content)
        }
    }

    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn parse_toml(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text).map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_duration_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Samples each worker should produce over the run, ignoring sink time.
    pub fn expected_samples(&self) -> Vec<u64> {
        let run_ms = self
            .run_duration_secs
            .saturating_mul(1000)
            .saturating_sub(self.startup_delay_ms);
        self.workers
            .iter()
            .map(|w| {
                if w.interval_ms == 0 {
                    0
                } else {
                    run_ms.div_ceil(w.interval_ms)
                }
            })
            .collect()
    }
}
