//! Exit codes for the dg-core CLI.
//!
//! Exit codes communicate run outcome without requiring output parsing.

use dg_common::Error;

/// Exit codes for dg-core commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed, every write succeeded
    Clean = 0,

    /// Run completed but some sink writes failed or a worker panicked
    PartialFail = 3,

    /// Configuration error
    ConfigError = 10,

    /// I/O or sink open error
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidArgument(_) => ExitCode::ConfigError,
            Error::SinkUnavailable(_) => ExitCode::IoError,
            Error::Json(_) | Error::WorkerPanicked { .. } | Error::Spawn(_) => {
                ExitCode::InternalError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::PartialFail.as_i32(), 3);
        assert_eq!(ExitCode::ConfigError.as_i32(), 10);
        assert_eq!(ExitCode::IoError.as_i32(), 13);
        assert_eq!(i32::from(ExitCode::InternalError), 99);
    }

    #[test]
    fn errors_map_to_codes() {
        assert_eq!(
            ExitCode::from(&Error::Config("x".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from(&Error::SinkUnavailable("x".into())),
            ExitCode::IoError
        );
        assert_eq!(
            ExitCode::from(&Error::Spawn("x".into())),
            ExitCode::InternalError
        );
    }
}
