//! Property tests for the batch buffer.

use std::sync::Arc;

use chrono::Utc;
use dg_common::{Sample, WorkerId};
use dg_core::{BatchBuffer, IngestStats};
use dg_telemetry::MemorySink;
use proptest::prelude::*;

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

proptest! {
    #[test]
    fn full_batches_only_and_order_kept(threshold in 1usize..20, n in 0u64..200) {
        let sink = Arc::new(MemorySink::new());
        let stats = Arc::new(IngestStats::new());
        let mut buf = BatchBuffer::new(sink.clone(), threshold, stats.clone());
        let mut flushes = 0usize;
        for seq in 0..n {
            if buf.append(sample(seq)).is_some() {
                flushes += 1;
            }
            prop_assert!(buf.len() < threshold);
        }

        prop_assert_eq!(flushes, n as usize / threshold);
        prop_assert!(sink.batch_sizes().iter().all(|&s| s == threshold));
        prop_assert_eq!(buf.len(), n as usize % threshold);

        let written: Vec<u64> = sink.rows().iter().map(|r| r.sequence).collect();
        let pending: Vec<u64> = buf.pending().iter().map(|r| r.sequence).collect();
        let all: Vec<u64> = written.into_iter().chain(pending).collect();
        prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
        prop_assert_eq!(stats.snapshot().rows_written, (flushes * threshold) as u64);
    }

    #[test]
    fn failures_only_drop_their_own_batch(threshold in 1usize..10, fails in 0usize..5, n in 0u64..100) {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(fails);
        let stats = Arc::new(IngestStats::new());
        let mut buf = BatchBuffer::new(sink.clone(), threshold, stats.clone());
        for seq in 0..n {
            buf.append(sample(seq));
        }

        let batches = n as usize / threshold;
        let failed = batches.min(fails);
        let snap = stats.snapshot();
        prop_assert_eq!(snap.batches_failed as usize, failed);
        prop_assert_eq!(snap.rows_dropped as usize, failed * threshold);
        prop_assert_eq!(sink.row_count(), (batches - failed) * threshold);
        prop_assert!(buf.len() < threshold);
    }
}
