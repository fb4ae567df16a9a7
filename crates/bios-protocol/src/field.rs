//! Named field decoders
//!
//! A [`FieldBank`] holds every decoder for one aircraft profile. Decoders
//! are chosen once at load time from a closed [`FieldSpec`] and the bank is
//! replaced wholesale when the profile changes.

use tracing::debug;

use crate::buffer::{IntegerField, StringField};
use crate::error::FieldError;
use crate::parser::{WriteEvent, WriteSubscriber};

/// How a named field is laid out in the export address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum FieldSpec {
    /// Masked and shifted bits of one word
    Integer { address: u16, mask: u16, shift_by: u8 },
    /// Fixed-length, NUL-padded Latin-1 text
    String { address: u16, max_length: u16 },
}

impl FieldSpec {
    /// Address of the first word this field occupies
    pub fn address(&self) -> u16 {
        match self {
            Self::Integer { address, .. } | Self::String { address, .. } => *address,
        }
    }
}

/// Decoded field value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// Value of an integer field
    Integer(u16),
    /// Value of a string field
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// A changed field value, tagged with the field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    /// Control name the field belongs to
    pub name: String,
    /// New value
    pub value: FieldValue,
}

#[derive(Debug)]
enum FieldDecoder {
    Integer(IntegerField),
    String(StringField),
}

impl FieldDecoder {
    fn from_spec(spec: FieldSpec) -> Self {
        match spec {
            FieldSpec::Integer {
                address,
                mask,
                shift_by,
            } => Self::Integer(IntegerField::new(address, mask, shift_by)),
            FieldSpec::String {
                address,
                max_length,
            } => Self::String(StringField::new(address, max_length)),
        }
    }

    fn on_write(&mut self, address: u16, value: u16) -> Option<FieldValue> {
        match self {
            Self::Integer(f) => f.on_write(address, value).map(FieldValue::Integer),
            Self::String(f) => f.on_write(address, value).map(FieldValue::Text),
        }
    }
}

/// Collection of named decoders fed from one write stream
///
/// Updates produced while the bank is used as a parser subscriber are
/// queued and collected with [`FieldBank::take_updates`].
#[derive(Debug, Default)]
pub struct FieldBank {
    fields: Vec<(String, FieldSpec, FieldDecoder)>,
    pending: Vec<FieldUpdate>,
}

impl FieldBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bank from `(name, spec)` pairs
    pub fn from_specs<I, S>(specs: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (S, FieldSpec)>,
        S: Into<String>,
    {
        let mut bank = Self::new();
        for (name, spec) in specs {
            bank.insert(name, spec)?;
        }
        Ok(bank)
    }

    /// Add a decoder for a named field
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> Result<(), FieldError> {
        let name = name.into();
        match spec {
            FieldSpec::String {
                address,
                max_length: 0,
            } => {
                return Err(FieldError::EmptyString { name, address });
            }
            FieldSpec::Integer { shift_by, .. } if shift_by > 15 => {
                return Err(FieldError::InvalidShift { name, shift_by });
            }
            _ => {}
        }
        if self.contains(&name) {
            return Err(FieldError::DuplicateField(name));
        }

        debug!("Field {} -> {:?}", name, spec);
        self.fields.push((name, spec, FieldDecoder::from_spec(spec)));
        Ok(())
    }

    /// Whether a field with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _, _)| n == name)
    }

    /// Layout of a named field
    pub fn spec(&self, name: &str) -> Option<FieldSpec> {
        self.fields
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, spec, _)| *spec)
    }

    /// Field names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _, _)| n.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the bank has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Feed one write to every decoder and return the resulting updates
    pub fn decode(&mut self, address: u16, value: u16) -> Vec<FieldUpdate> {
        self.fields
            .iter_mut()
            .filter_map(|(name, _, decoder)| {
                decoder.on_write(address, value).map(|value| FieldUpdate {
                    name: name.clone(),
                    value,
                })
            })
            .collect()
    }

    /// Drain updates queued through the [`WriteSubscriber`] impl
    pub fn take_updates(&mut self) -> Vec<FieldUpdate> {
        std::mem::take(&mut self.pending)
    }
}

impl WriteSubscriber for FieldBank {
    fn write_event(&mut self, event: WriteEvent) {
        let updates = self.decode(event.address, event.value);
        self.pending.extend(updates);
    }
}
