//! Parquet part-file sink.
//!
//! Every `write_batch` produces one file `samples-<n>.parquet` in the target
//! directory. Single-row writes produce a one-row part file each, which is
//! slow and fragmenting; prefer the bulk path with this sink.
//!
//! Files are written under a `.tmp` name and renamed into place once closed,
//! so readers never observe a half-written part.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dg_common::Sample;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression as ParquetCompression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SinkError;
use crate::schema::{samples_schema, samples_to_record_batch};
use crate::sink::{Sink, SinkConnection};

const PART_PREFIX: &str = "samples-";
const PART_SUFFIX: &str = ".parquet";

/// Column compression for part files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Snappy,
    Zstd,
}

impl Compression {
    pub fn to_parquet(self) -> ParquetCompression {
        match self {
            Compression::None => ParquetCompression::UNCOMPRESSED,
            Compression::Snappy => ParquetCompression::SNAPPY,
            Compression::Zstd => ParquetCompression::ZSTD(ZstdLevel::default()),
        }
    }
}

/// Writes sample batches as numbered Parquet files.
#[derive(Debug)]
pub struct ParquetSink {
    dir: PathBuf,
    compression: Compression,
    next_part: AtomicU64,
}

impl ParquetSink {
    /// Open (creating if needed) `dir`. Part numbering continues after the
    /// highest existing part.
    pub fn open(dir: impl Into<PathBuf>, compression: Compression) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let next = existing_parts(&dir)?
            .iter()
            .filter_map(|p| part_number(p))
            .max()
            .map_or(0, |n| n + 1);
        debug!(dir = %dir.display(), next_part = next, "opened parquet sink");
        Ok(Self {
            dir,
            compression,
            next_part: AtomicU64::new(next),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Part files currently in the directory, sorted by part number.
    pub fn parts(&self) -> Result<Vec<PathBuf>, SinkError> {
        let mut parts = existing_parts(&self.dir)?;
        parts.sort_by_key(|p| part_number(p));
        Ok(parts)
    }

    fn write_part(&self, rows: &[Sample]) -> Result<PathBuf, SinkError> {
        let n = self.next_part.fetch_add(1, Ordering::SeqCst);
        let name = format!("{PART_PREFIX}{n:06}{PART_SUFFIX}");
        let final_path = self.dir.join(&name);
        let tmp_path = self.dir.join(format!("{name}.tmp"));

        let schema = samples_schema();
        let batch = samples_to_record_batch(rows, Utc::now(), Arc::clone(&schema))?;
        let props = WriterProperties::builder()
            .set_compression(self.compression.to_parquet())
            .build();

        let result = (|| -> Result<(), SinkError> {
            let file = File::create(&tmp_path)?;
            let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
            writer.write(&batch)?;
            writer.close()?;
            fs::rename(&tmp_path, &final_path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;

        trace!(rows = rows.len(), path = %final_path.display(), "wrote parquet part");
        Ok(final_path)
    }
}

fn existing_parts(dir: &Path) -> Result<Vec<PathBuf>, SinkError> {
    let mut parts = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if part_number(&path).is_some() {
            parts.push(path);
        }
    }
    Ok(parts)
}

fn part_number(path: &Path) -> Option<u64> {
    path.file_name()?
        .to_str()?
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(PART_SUFFIX)?
        .parse()
        .ok()
}

impl Sink for ParquetSink {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.write_part(rows).map(|_| ())
    }

    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError> {
        Ok(Box::new(ParquetConnection { sink: self }))
    }
}

struct ParquetConnection<'a> {
    sink: &'a ParquetSink,
}

impl SinkConnection for ParquetConnection<'_> {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError> {
        self.sink.write_part(std::slice::from_ref(row)).map(|_| ())
    }
}
