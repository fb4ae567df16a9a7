//! Error types for request parsing and key binding

use thiserror::Error;

/// Errors that can occur while building requests from configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Control name contains characters outside `A-Z`, `0-9` and `_`
    #[error("invalid control name: {0:?}")]
    InvalidControlName(String),

    /// Cycle request without a numeric step and maximum
    #[error("invalid cycle request: {0:?} (expected `<CTRL> CYCLE <step> <max>`)")]
    InvalidCycle(String),

    /// Key name that is not a G-key, mouse button or LCD button
    #[error("unknown input key: {0:?}")]
    UnknownKey(String),
}
