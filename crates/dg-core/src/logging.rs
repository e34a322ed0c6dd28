//! Tracing subscriber setup for the binary.
//!
//! Events go to stderr (human or JSON, following `--format`) and, when a
//! log file is given, are also appended there as JSON lines. `RUST_LOG`
//! overrides the verbosity flags.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use dg_common::OutputFormat;
use tracing_subscriber::layer::{Layer, Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: OutputFormat,
    /// -v count; 1 = debug, 2+ = trace.
    pub verbose: u8,
    pub quiet: bool,
    pub log_file: Option<PathBuf>,
}

impl LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Install the global subscriber. Fails if one is already set or the log
/// file cannot be opened.
pub fn init(config: &LogConfig) -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
    layers.push(if config.format.is_json() {
        stderr.json().boxed()
    } else {
        stderr.boxed()
    });

    if let Some(path) = &config.log_file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::AlreadyExists, e))
}
