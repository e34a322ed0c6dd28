//! Data generator math utilities.

pub mod generator;
pub mod math;

pub use generator::{
    CosineGenerator, DataGenerator, GeneratorError, GeneratorEvent, GeneratorState,
    DEFAULT_NEGATIVE_ROTATION, DEFAULT_POSITIVE_ROTATION, DEFAULT_STARTING_ANGLE,
};
pub use math::angle::*;
