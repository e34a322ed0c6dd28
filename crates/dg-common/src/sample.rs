//! One generator observation plus its production context.

use std::time::Duration;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::WorkerId;

/// A single row produced by a sampling worker.
///
/// The angle fields are the generator's values *before* the step that
/// produced `value`. Samples are immutable once built; sinks receive them
/// by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Sample {
    /// Worker that produced the sample.
    pub worker_id: WorkerId,

    /// Position in the worker's own sample stream, starting at 0.
    pub sequence: u64,

    /// Generator starting (seed) angle in degrees.
    pub seed_angle: f64,

    /// Generator rotation in degrees.
    pub rotation: f64,

    /// Angle the cosine was taken of, in degrees.
    pub current_angle: f64,

    /// Cosine of `current_angle`.
    pub value: f64,

    /// When the cosine was taken.
    pub timestamp: DateTime<Utc>,

    /// Sampling interval of the producing worker, in milliseconds.
    pub interval_ms: u64,
}

impl Sample {
    /// Identity used to detect duplicated rows across a run.
    pub fn key(&self) -> SampleKey {
        SampleKey {
            worker_id: self.worker_id,
            sequence: self.sequence,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// `(worker, sequence)` pair; unique per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleKey {
    pub worker_id: WorkerId,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sample {
        Sample {
            worker_id: WorkerId(2),
            sequence: 41,
            seed_angle: 30.0,
            rotation: 5.0,
            current_angle: 235.0,
            value: -0.819_152,
            timestamp: DateTime::parse_from_rfc3339("2026-01-15T14:30:22.125Z")
                .unwrap()
                .with_timezone(&Utc),
            interval_ms: 1_000,
        }
    }

    #[test]
    fn key_identifies_worker_and_sequence() {
        let s = sample();
        assert_eq!(
            s.key(),
            SampleKey {
                worker_id: WorkerId(2),
                sequence: 41
            }
        );
        assert_eq!(s.interval(), Duration::from_secs(1));
    }

    #[test]
    fn json_shape_is_flat() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["worker_id"], 2);
        assert_eq!(json["interval_ms"], 1000);
        assert_eq!(json["timestamp"], "2026-01-15T14:30:22.125Z");
        let back: Sample = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
