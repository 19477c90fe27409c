use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid address prefix in {0:?}: expected \"hx\" or \"cx\"")]
    InvalidPrefix(String),

    #[error("amount overflow: {0}")]
    Overflow(String),
}
