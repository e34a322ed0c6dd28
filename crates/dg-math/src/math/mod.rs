//! Core math modules.

pub mod angle;
