//! Iterator-style data generators.
//!
//! A generator is seeded with a starting value and yields successive values
//! through [`DataGenerator::next`]. [`CosineGenerator`] is the one
//! implementation: it walks an angle (in degrees) by a fixed rotation and
//! yields the cosine of the angle it held *before* each step.
//!
//! # Reset
//!
//! When advancing would push the current angle to a non-finite value the
//! generator does not advance. It resets to `(starting 0°, rotation +1°,
//! current 0°)` instead. The reset is silent for callers of `next()` but is
//! counted and can be observed with [`CosineGenerator::next_with_event`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::math::angle::{checked_advance, cos_degrees, is_valid_angle, is_valid_rotation};

/// Starting angle used by `Default` and after a reset.
pub const DEFAULT_STARTING_ANGLE: f64 = 0.0;

/// Rotation used by `Default` and after a reset.
pub const DEFAULT_POSITIVE_ROTATION: f64 = 1.0;

/// Conventional rotation for generators that walk backwards.
pub const DEFAULT_NEGATIVE_ROTATION: f64 = -1.0;

/// Capability interface for seeded value generators.
pub trait DataGenerator<T> {
    /// Produce the next value.
    fn next(&mut self) -> T;

    /// Re-seed the generator and return the previous seed.
    fn seed(&mut self, seed: T) -> T;
}

/// Errors from generator construction and mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeneratorError {
    #[error("invalid {field}: {value} (must be a {expected} real number)")]
    InvalidArgument {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Events a generator step can produce besides its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorEvent {
    /// Advancing would have overflowed; defaults were restored.
    Reset,
}

/// Copyable snapshot of a generator's fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub starting_angle: f64,
    pub current_angle: f64,
    pub rotation: f64,
}

impl GeneratorState {
    /// State right after construction with defaults or after a reset.
    pub fn initial() -> Self {
        Self {
            starting_angle: DEFAULT_STARTING_ANGLE,
            current_angle: DEFAULT_STARTING_ANGLE,
            rotation: DEFAULT_POSITIVE_ROTATION,
        }
    }
}

/// Cosine generator over a rotating angle.
#[derive(Debug, Clone, PartialEq)]
pub struct CosineGenerator {
    starting_angle: f64,
    current_angle: f64,
    rotation: f64,
    resets: u64,
}

impl CosineGenerator {
    /// Create a generator starting at `angle` degrees, stepping by `rotation`.
    ///
    /// Fails when `angle` is NaN or infinite, or when `rotation` is zero,
    /// NaN, or infinite.
    pub fn new(angle: f64, rotation: f64) -> Result<Self, GeneratorError> {
        if !is_valid_angle(angle) {
            return Err(GeneratorError::InvalidArgument {
                field: "angle",
                value: angle,
                expected: "finite",
            });
        }
        check_rotation(rotation)?;
        Ok(Self {
            starting_angle: angle,
            current_angle: angle,
            rotation,
            resets: 0,
        })
    }

    /// Seed (starting) angle in degrees.
    pub fn starting_angle(&self) -> f64 {
        self.starting_angle
    }

    /// Angle whose cosine the next call to `next()` returns.
    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Per-step rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Replace the rotation. The current angle is left alone.
    pub fn set_rotation(&mut self, rotation: f64) -> Result<(), GeneratorError> {
        check_rotation(rotation)?;
        self.rotation = rotation;
        Ok(())
    }

    /// Number of overflow resets since construction.
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    pub fn state(&self) -> GeneratorState {
        GeneratorState {
            starting_angle: self.starting_angle,
            current_angle: self.current_angle,
            rotation: self.rotation,
        }
    }

    /// Like `next()`, but also reports whether this step reset the generator.
    pub fn next_with_event(&mut self) -> (f64, Option<GeneratorEvent>) {
        let value = cos_degrees(self.current_angle);

        match checked_advance(self.current_angle, self.rotation) {
            Some(next) => {
                self.current_angle = next;
                (value, None)
            }
            None => {
                debug!(
                    starting_angle = self.starting_angle,
                    current_angle = self.current_angle,
                    rotation = self.rotation,
                    "angle advance overflowed; resetting generator"
                );
                self.reset();
                (value, Some(GeneratorEvent::Reset))
            }
        }
    }

    fn reset(&mut self) {
        let initial = GeneratorState::initial();
        self.starting_angle = initial.starting_angle;
        self.rotation = initial.rotation;
        self.current_angle = initial.current_angle;
        self.resets += 1;
    }
}

fn check_rotation(rotation: f64) -> Result<(), GeneratorError> {
    if is_valid_rotation(rotation) {
        Ok(())
    } else {
        Err(GeneratorError::InvalidArgument {
            field: "rotation",
            value: rotation,
            expected: "finite nonzero",
        })
    }
}

impl Default for CosineGenerator {
    fn default() -> Self {
        Self {
            starting_angle: DEFAULT_STARTING_ANGLE,
            current_angle: DEFAULT_STARTING_ANGLE,
            rotation: DEFAULT_POSITIVE_ROTATION,
            resets: 0,
        }
    }
}

impl DataGenerator<f64> for CosineGenerator {
    fn next(&mut self) -> f64 {
        self.next_with_event().0
    }

    /// Non-finite seeds fall back to [`DEFAULT_STARTING_ANGLE`].
    fn seed(&mut self, seed: f64) -> f64 {
        let previous = self.starting_angle;
        let angle = if is_valid_angle(seed) {
            seed
        } else {
            DEFAULT_STARTING_ANGLE
        };
        self.starting_angle = angle;
        self.current_angle = angle;
        previous
    }
}

impl fmt::Display for CosineGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Starting Angle:  {}  Angle Rotation: {} Current Angle: {}",
            self.starting_angle, self.rotation, self.current_angle
        )
    }
}
