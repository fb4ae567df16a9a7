//! Error types for the panel link

use thiserror::Error;

/// Errors that can occur in the panel link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Socket or other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid key binding in a profile
    #[error("request error: {0}")]
    Request(#[from] bios_input::RequestError),

    /// Invalid field layout in a profile
    #[error("field error: {0}")]
    Field(#[from] bios_protocol::FieldError),

    /// The other end of a channel went away
    #[error("channel closed")]
    ChannelClosed,

    /// Unusable configuration value
    #[error("configuration error: {0}")]
    Config(String),
}
