//! Error types for export field configuration

use thiserror::Error;

/// Errors raised while building field decoders from configuration
///
/// Stream parsing itself never fails; only field definitions are validated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// String field with no room for characters
    #[error("string field {name} at 0x{address:04X} has zero length")]
    EmptyString { name: String, address: u16 },

    /// Shift moves every masked bit out of the word
    #[error("integer field {name} shift of {shift_by} exceeds 15 bits")]
    InvalidShift { name: String, shift_by: u8 },

    /// Field name used twice in one bank
    #[error("duplicate field: {0}")]
    DuplicateField(String),
}
