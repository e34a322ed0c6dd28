//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dg_common::{Error, OutputFormat, Sample, SCHEMA_VERSION};
use dg_config::{list_presets, resolve_config, FleetConfig, IngestPath};
use dg_math::CosineGenerator;
use dg_telemetry::{SinkSpec, SqliteSink};
use tracing::{info, warn};

use crate::exit_codes::ExitCode;
use crate::fleet::{Fleet, FleetReport};
use crate::logging::LogConfig;

/// Cosine sample generator and ingestion runner
#[derive(Parser, Debug)]
#[command(name = "dg-core", version, about, long_about = None)]
pub struct Cli {
    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also append logs to this file as JSON lines
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            format: self.format,
            verbose: self.verbose,
            quiet: self.quiet,
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a sampling fleet for its configured duration
    Run(RunArgs),
    /// Print a generator sequence
    Sample(SampleArgs),
    /// Read one interval's series from an SQLite sink
    Query(QueryArgs),
    /// List built-in fleet presets
    Presets,
    /// Print a JSON schema
    Schema {
        #[arg(value_enum, default_value_t = SchemaTarget::Config)]
        target: SchemaTarget,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Fleet config file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in preset (demo, quick, single-row)
    #[arg(long)]
    pub preset: Option<String>,

    /// Ingestion path: bulk, single, or channel
    #[arg(long)]
    pub path: Option<IngestPath>,

    /// Override run duration in seconds
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Override flush threshold
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Sink: memory, jsonl:<path>, sqlite:<path>, parquet:<dir>
    #[arg(long)]
    pub sink: Option<SinkSpec>,

    /// Flush buffered rows when the fleet stops
    #[arg(long)]
    pub flush_on_stop: bool,

    /// Empty the SQLite table before running
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Starting angle in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub seed: f64,

    /// Degrees added per step
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub rotation: f64,

    /// Number of values to print
    #[arg(long, default_value_t = 10)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQLite database written by a run
    #[arg(long, value_name = "FILE")]
    pub db: PathBuf,

    /// Sampling interval to select, in milliseconds
    #[arg(long)]
    pub interval_ms: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    Config,
    Sample,
}

/// Dispatch a parsed command.
pub fn run(cli: &Cli) -> ExitCode {
    match &cli.command {
        Commands::Run(args) => run_fleet(cli.format, args),
        Commands::Sample(args) => run_sample(cli.format, args),
        Commands::Query(args) => run_query(cli.format, args),
        Commands::Presets => run_presets(cli.format),
        Commands::Schema { target } => run_schema(cli.format, *target),
    }
}

fn print_json(value: &serde_json::Value) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("error: failed to render JSON: {}", e);
            ExitCode::InternalError
        }
    }
}

fn envelope(command: &str, body: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "command": command,
        "result": body,
    })
}

/// Report a failed command and pick its exit code.
///
/// JSON mode prints an error envelope on stdout carrying the error's
/// numeric code; human mode prints one line on stderr.
fn fail(format: OutputFormat, command: &str, err: Error) -> ExitCode {
    let code = ExitCode::from(&err);
    if format.is_json() {
        let body = serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "command": command,
            "status": "error",
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            },
        });
        if print_json(&body) != ExitCode::Clean {
            return ExitCode::InternalError;
        }
    } else {
        eprintln!("error: {}", err);
    }
    code
}

/// Apply command-line overrides on top of a resolved config.
pub fn apply_overrides(config: &mut FleetConfig, args: &RunArgs) {
    if let Some(path) = args.path {
        config.path = path;
    }
    if let Some(secs) = args.duration_secs {
        config.run_duration_secs = secs;
    }
    if let Some(threshold) = args.threshold {
        config.batch.threshold = threshold;
    }
    if let Some(sink) = &args.sink {
        config.sink = sink.clone();
    }
    if args.flush_on_stop {
        config.flush_on_stop = true;
    }
    if args.clear {
        config.clear_before_run = true;
    }
}

fn run_fleet(format: OutputFormat, args: &RunArgs) -> ExitCode {
    let resolved = match resolve_config(args.config.as_deref(), args.preset.as_deref()) {
        Ok(r) => r,
        Err(e) => return fail(format, "run", e.into()),
    };
    let mut config = resolved.config;
    apply_overrides(&mut config, args);
    if let Err(e) = config.validate() {
        return fail(format, "run", e.into());
    }
    info!(source = %resolved.source, path = %config.path, sink = %config.sink, "config resolved");

    if config.clear_before_run {
        match &config.sink {
            SinkSpec::Sqlite(path) => {
                if let Err(e) = SqliteSink::open(path).and_then(|s| s.clear()) {
                    return fail(format, "run", e.into());
                }
            }
            other => warn!(sink = %other, "clear requested but only SQLite sinks support it"),
        }
    }

    let sink = match config.sink.open() {
        Ok(s) => s,
        Err(e) => return fail(format, "run", e.into()),
    };

    let report = match Fleet::new(config, sink).run() {
        Ok(r) => r,
        Err(e) => return fail(format, "run", e),
    };

    let code = if report.is_clean() {
        ExitCode::Clean
    } else {
        ExitCode::PartialFail
    };

    if format.is_json() {
        match serde_json::to_value(&report) {
            Ok(body) => {
                if print_json(&envelope("run", body)) != ExitCode::Clean {
                    return ExitCode::InternalError;
                }
            }
            Err(e) => return fail(format, "run", e.into()),
        }
    } else {
        print_report(&report);
    }
    code
}

fn print_report(report: &FleetReport) {
    let s = &report.stats;
    println!("# Run {} ({} path, {} sink)", report.run_id, report.path, report.sink);
    println!();
    println!("  elapsed:          {} ms", report.elapsed_ms);
    println!("  samples:          {}", s.samples_produced);
    println!("  rows written:     {}", s.rows_written);
    println!("  rows dropped:     {}", s.rows_dropped);
    println!("  rows abandoned:   {}", report.rows_abandoned);
    println!("  batches:          {} ok, {} failed", s.batches_flushed, s.batches_failed);
    if s.single_writes > 0 {
        println!(
            "  single writes:    {} ({} failed)",
            s.single_writes, s.single_writes_failed
        );
    }
    println!("  resets:           {}", s.resets);
    println!();
    for w in &report.workers {
        println!(
            "  worker {:>2}  every {:>6} ms  samples {:>7}  angle {}",
            w.worker_id.0, w.interval_ms, w.samples, w.final_state.current_angle
        );
    }
    for p in &report.worker_panics {
        println!("  PANIC: {}", p);
    }
}

/// Produce `count` samples from a fresh generator.
pub fn sample_sequence(seed: f64, rotation: f64, count: usize) -> Result<Vec<(f64, f64)>, dg_math::GeneratorError> {
    let mut generator = CosineGenerator::new(seed, rotation)?;
    Ok((0..count)
        .map(|_| {
            let angle = generator.current_angle();
            let (value, _) = generator.next_with_event();
            (angle, value)
        })
        .collect())
}

fn run_sample(format: OutputFormat, args: &SampleArgs) -> ExitCode {
    let values = match sample_sequence(args.seed, args.rotation, args.count) {
        Ok(v) => v,
        Err(e) => return fail(format, "sample", Error::InvalidArgument(e.to_string())),
    };

    if format.is_json() {
        let rows: Vec<_> = values
            .iter()
            .map(|(angle, value)| serde_json::json!({"angle": angle, "value": value}))
            .collect();
        print_json(&envelope(
            "sample",
            serde_json::json!({"seed": args.seed, "rotation": args.rotation, "values": rows}),
        ))
    } else {
        for (angle, value) in values {
            println!("{:>12} {:>22}", angle, value);
        }
        ExitCode::Clean
    }
}

fn run_query(format: OutputFormat, args: &QueryArgs) -> ExitCode {
    if !args.db.exists() {
        let err = Error::SinkUnavailable(format!("database not found: {}", args.db.display()));
        return fail(format, "query", err);
    }
    let points = match SqliteSink::open_read_only(&args.db)
        .and_then(|s| s.query_by_interval(args.interval_ms))
    {
        Ok(p) => p,
        Err(e) => return fail(format, "query", e.into()),
    };

    if format.is_json() {
        print_json(&envelope(
            "query",
            serde_json::json!({
                "interval_ms": args.interval_ms,
                "count": points.len(),
                "points": points,
            }),
        ))
    } else {
        println!("# {} points at {} ms", points.len(), args.interval_ms);
        for p in &points {
            println!("  {}  {}", p.time.to_rfc3339(), p.value);
        }
        ExitCode::Clean
    }
}

fn run_presets(format: OutputFormat) -> ExitCode {
    let presets = list_presets();
    if format.is_json() {
        print_json(&envelope("presets", serde_json::json!(presets)))
    } else {
        println!("# Presets");
        println!();
        for p in &presets {
            println!("  {:<11} {}", p.name.as_str(), p.description);
        }
        ExitCode::Clean
    }
}

fn run_schema(format: OutputFormat, target: SchemaTarget) -> ExitCode {
    let schema = match target {
        SchemaTarget::Config => schemars::schema_for!(FleetConfig),
        SchemaTarget::Sample => schemars::schema_for!(Sample),
    };
    match serde_json::to_value(&schema) {
        Ok(value) => print_json(&value),
        Err(e) => fail(format, "schema", e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "dg-core",
            "--format",
            "json",
            "run",
            "--path",
            "channel",
            "--sink",
            "sqlite:out.db",
            "--threshold",
            "3",
            "--flush-on-stop",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.path, Some(IngestPath::Channel));
                assert_eq!(args.sink, Some(SinkSpec::Sqlite(PathBuf::from("out.db"))));
                assert_eq!(args.threshold, Some(3));
                assert!(args.flush_on_stop);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_config_fields() {
        let mut cfg = FleetConfig::default();
        let args = RunArgs {
            path: Some(IngestPath::Single),
            duration_secs: Some(9),
            threshold: Some(7),
            clear: true,
            ..RunArgs::default()
        };
        apply_overrides(&mut cfg, &args);
        assert_eq!(cfg.path, IngestPath::Single);
        assert_eq!(cfg.run_duration_secs, 9);
        assert_eq!(cfg.batch.threshold, 7);
        assert!(cfg.clear_before_run);
        assert!(!cfg.flush_on_stop);
    }

    #[test]
    fn sample_sequence_starts_at_seed() {
        let values = sample_sequence(0.0, 1.0, 3).unwrap();
        assert_eq!(values[0], (0.0, 1.0));
        assert_eq!(values[2].0, 2.0);
        assert!(sample_sequence(0.0, 0.0, 3).is_err());
    }
}
