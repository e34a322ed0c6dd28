//! Criterion benchmarks for the batch buffer append/flush cycle.

use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dg_common::{Sample, WorkerId};
use dg_core::{BatchBuffer, IngestStats};
use dg_telemetry::{Sink, SinkConnection, SinkError};

/// Accepts and discards every row.
struct NullSink;

struct NullConnection;

impl SinkConnection for NullConnection {
    fn write_one(&mut self, row: &Sample) -> Result<(), SinkError> {
        black_box(row);
        Ok(())
    }
}

impl Sink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn write_batch(&self, rows: &[Sample]) -> Result<(), SinkError> {
        black_box(rows);
        Ok(())
    }

    fn connect(&self) -> Result<Box<dyn SinkConnection + '_>, SinkError> {
        Ok(Box::new(NullConnection))
    }
}

fn sample(seq: u64) -> Sample {
    Sample {
        worker_id: WorkerId(0),
        sequence: seq,
        seed_angle: 0.0,
        rotation: 1.0,
        current_angle: seq as f64,
        value: 1.0,
        timestamp: Utc::now(),
        interval_ms: 10,
    }
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_buffer_append");

    for threshold in [30usize, 300, 3000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(threshold),
            &threshold,
            |b, &threshold| {
                let mut buf = BatchBuffer::new(
                    Arc::new(NullSink),
                    threshold,
                    Arc::new(IngestStats::new()),
                );
                let mut seq = 0u64;
                b.iter(|| {
                    seq += 1;
                    black_box(buf.append(sample(seq)));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_append);
criterion_main!(benches);
