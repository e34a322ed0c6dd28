//! JSON-lines file sink.
//!
//! Each row is one JSON object on its own line: the sample fields plus the
//! `insertion_time` assigned at write. Batches are appended with a single
//! buffered write followed by `sync_data`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dg_common::Sample;
use serde::Serialize;
use tracing::trace;

use crate::error::SinkError;
use crate::sink::{Sink, SinkConnection};

#[derive(Serialize)]
struct JsonlRow<'a> {
    insertion_time: DateTime<Utc>,
    #[serde(flatten)]
    sample: &'a Sample,
}

/// Appends rows to a `.jsonl` file.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create the sink, creating parent directories and the file if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        open_append(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn write_rows<W: Write>(writer: &mut W, rows: &[Sample]) -> Result<(), SinkError> {
    let insertion_time = Utc::now();
    for sample in rows {
        serde_json::to_writer(
            &mut *writer,
            &JsonlRow {
                insertion_time,
                sample,
            },
        )?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

impl Sink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let file = open_append(&self.path)?;
        let mut writer = BufWriter::new(file);
        write_rows(&mut writer, rows)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_data()?;
        trace!(rows = rows.len(), path = %self.path.display(), "appended batch");
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError> {
        Ok(Box::new(JsonlConnection {
            file: open_append(&self.path)?,
        }))
    }
}

struct JsonlConnection {
    file: File,
}

impl SinkConnection for JsonlConnection {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError> {
        let mut line = Vec::with_capacity(256);
        write_rows(&mut line, std::slice::from_ref(row))?;
        self.file.write_all(&line)?;
        self.file.sync_data()?;
        Ok(())
    }
}
