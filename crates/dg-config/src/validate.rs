//! Semantic validation of fleet configurations.
//!
//! Parsing only checks shape. `FleetConfig::validate` checks values and
//! reports every problem found, not just the first.

use dg_math::{is_valid_angle, is_valid_rotation};
use thiserror::Error;

use crate::fleet::FleetConfig;
use crate::preset::PresetError;
use crate::CONFIG_SCHEMA_VERSION;

/// Configuration loading and validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("unsupported config schema version {found} (supported: {supported})")]
    SchemaVersion { found: String, supported: String },

    #[error("invalid fleet config: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Preset(#[from] PresetError),
}

pub type ValidationResult = Result<(), ValidationError>;

impl From<ValidationError> for dg_common::Error {
    fn from(err: ValidationError) -> Self {
        dg_common::Error::Config(err.to_string())
    }
}

fn major(version: &str) -> Option<u32> {
    version.split('.').next()?.parse().ok()
}

impl FleetConfig {
    /// Check every field, collecting all problems.
    pub fn validate(&self) -> ValidationResult {
        if major(&self.schema_version) != major(CONFIG_SCHEMA_VERSION) {
            return Err(ValidationError::SchemaVersion {
                found: self.schema_version.clone(),
                supported: CONFIG_SCHEMA_VERSION.to_string(),
            });
        }

        let mut problems = Vec::new();

        if self.workers.is_empty() {
            problems.push("fleet has no workers".to_string());
        }
        if self.run_duration_secs == 0 {
            problems.push("run_duration_secs must be greater than 0".to_string());
        }
        if self.batch.threshold == 0 {
            problems.push("batch.threshold must be greater than 0".to_string());
        }
        if self.batch.channel_capacity == Some(0) {
            problems.push("batch.channel_capacity must be greater than 0".to_string());
        }

        for (i, w) in self.workers.iter().enumerate() {
            if !is_valid_angle(w.seed_angle) {
                problems.push(format!(
                    "workers[{}].seed_angle must be finite, got {}",
                    i, w.seed_angle
                ));
            }
            if !is_valid_rotation(w.rotation) {
                problems.push(format!(
                    "workers[{}].rotation must be finite and nonzero, got {}",
                    i, w.rotation
                ));
            }
            if w.interval_ms == 0 {
                problems.push(format!("workers[{}].interval_ms must be greater than 0", i));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Invalid(problems))
        }
    }
}
