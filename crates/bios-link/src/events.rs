//! Unified event stream for the panel link
//!
//! Decoded cockpit state, outbound commands and errors are all emitted
//! through a single channel so observers see them in the order they
//! happened.

use bios_protocol::FieldUpdate;

/// Event emitted by the panel link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    // -------------------------------------------------------------------------
    // Export stream
    // -------------------------------------------------------------------------
    /// A new export frame started
    FrameSync,

    /// A field of the active profile changed value
    FieldChanged(FieldUpdate),

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------
    /// A command frame was handed to the sender
    CommandSent(Vec<u8>),

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// A profile replaced the previous field layout and key bindings
    ProfileLoaded {
        /// Number of decoded fields
        fields: usize,
        /// Number of bound keys
        keys: usize,
    },

    /// A recoverable error occurred
    Error {
        /// Human-readable message
        message: String,
    },
}

impl LinkEvent {
    /// Short description for log output
    pub fn description(&self) -> String {
        match self {
            Self::FrameSync => "frame sync".to_string(),
            Self::FieldChanged(update) => format!("{} = {}", update.name, update.value),
            Self::CommandSent(data) => {
                format!("sent {:?}", String::from_utf8_lossy(data).trim_end())
            }
            Self::ProfileLoaded { fields, keys } => {
                format!("profile loaded: {} fields, {} keys", fields, keys)
            }
            Self::Error { message } => format!("error: {}", message),
        }
    }
}
