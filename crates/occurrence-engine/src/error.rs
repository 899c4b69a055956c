//! Error types for occurrence-engine operations.
//!
//! Ambiguous recurrences and truncated expansions are not errors: they are
//! ordinary results (see [`crate::recurrence::Confidence`] and
//! [`crate::generate::Generation::cap_exceeded`]).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
