use thiserror::Error;

use crate::args::{MAX_NUMBER, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};

/// Failures in interpreting CLI arguments, surfaced through `clap`'s
/// `value_parser` hooks so clap reports them and exits with its usual
/// argument-error status (exit code 2, spec.md SPEC_FULL §6.1).
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("--number must be between 1 and {MAX_NUMBER}, got {value}")]
    NumberOutOfRange { value: u32 },
    #[error("--timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds, got {value}")]
    TimeoutOutOfRange { value: u64 },
    #[error("--root exceeds the {} byte limit ({value} bytes)", gfuzzer_core::intern::MAX_TOKEN_LEN)]
    RootNameTooLong { value: usize },
    #[error("--seed must be a 32-bit unsigned integer, got {raw:?}")]
    SeedOutOfRange { raw: String },
}
