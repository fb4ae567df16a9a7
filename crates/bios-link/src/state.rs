//! Live cockpit state tracking

use std::collections::HashMap;

use bios_protocol::{FieldUpdate, FieldValue};
use serde::{Deserialize, Serialize};

/// Last known value of an exported field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BiosValue {
    /// Integer field
    Integer(i64),
    /// String field
    Text(String),
}

impl BiosValue {
    /// Integer view of the value
    ///
    /// Text is parsed after trimming, so display fields such as `" 3"` can
    /// seed a cycle control.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<FieldValue> for BiosValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Integer(v) => Self::Integer(i64::from(v)),
            FieldValue::Text(s) => Self::Text(s),
        }
    }
}

impl std::fmt::Display for BiosValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Values of every field seen since the profile was loaded
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    values: HashMap<String, BiosValue>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value; returns whether it differs from the previous one
    pub fn set(&mut self, name: impl Into<String>, value: BiosValue) -> bool {
        let name = name.into();
        if self.values.get(&name) == Some(&value) {
            return false;
        }
        self.values.insert(name, value);
        true
    }

    /// Record a decoded field update
    pub fn apply(&mut self, update: &FieldUpdate) -> bool {
        self.set(update.name.clone(), update.value.clone().into())
    }

    pub fn get(&self, name: &str) -> Option<&BiosValue> {
        self.values.get(name)
    }

    /// Integer value of a field, `0` when unknown or not numeric
    pub fn int_value(&self, name: &str) -> i64 {
        self.get(name).and_then(BiosValue::as_int).unwrap_or(0)
    }

    /// Forget every value
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All known values, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BiosValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
