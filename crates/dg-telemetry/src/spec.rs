//! Sink selection from a string.
//!
//! Accepted forms: `memory`, `jsonl:<path>`, `sqlite:<path>`, `parquet:<dir>`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SinkError;
use crate::jsonl::JsonlSink;
use crate::memory::MemorySink;
use crate::parquet_sink::{Compression, ParquetSink};
use crate::sink::Sink;
use crate::sqlite::SqliteSink;

/// Which sink to write to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SinkSpec {
    #[default]
    Memory,
    Jsonl(PathBuf),
    Sqlite(PathBuf),
    Parquet(PathBuf),
}

impl SinkSpec {
    /// Open the described sink.
    pub fn open(&self) -> Result<Arc<dyn Sink>, SinkError> {
        Ok(match self {
            SinkSpec::Memory => Arc::new(MemorySink::new()),
            SinkSpec::Jsonl(path) => Arc::new(JsonlSink::open(path)?),
            SinkSpec::Sqlite(path) => Arc::new(SqliteSink::open(path)?),
            SinkSpec::Parquet(dir) => Arc::new(ParquetSink::open(dir, Compression::default())?),
        })
    }
}

impl FromStr for SinkSpec {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("memory") {
            return Ok(SinkSpec::Memory);
        }
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| SinkError::InvalidSpec(s.to_string()))?;
        if path.is_empty() {
            return Err(SinkError::InvalidSpec(s.to_string()));
        }
        let path = PathBuf::from(path);
        match kind.to_ascii_lowercase().as_str() {
            "jsonl" => Ok(SinkSpec::Jsonl(path)),
            "sqlite" => Ok(SinkSpec::Sqlite(path)),
            "parquet" => Ok(SinkSpec::Parquet(path)),
            _ => Err(SinkError::InvalidSpec(s.to_string())),
        }
    }
}

impl fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkSpec::Memory => write!(f, "memory"),
            SinkSpec::Jsonl(p) => write!(f, "jsonl:{}", p.display()),
            SinkSpec::Sqlite(p) => write!(f, "sqlite:{}", p.display()),
            SinkSpec::Parquet(p) => write!(f, "parquet:{}", p.display()),
        }
    }
}

impl Serialize for SinkSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SinkSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
