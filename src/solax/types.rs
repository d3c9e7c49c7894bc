//! Solax Raw Data Types
//!
//! Values produced by the response parser before any interpretation.
//!
//! - [`RawValue`] - one scalar reading, either text or a number
//! - [`RawSnapshot`] - the complete key → value set from one successful poll
//!
//! A snapshot is immutable once built. The poller replaces it wholesale on every
//! successful cycle; fields are never merged across polls.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A scalar reading as delivered by the inverter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(text) => Some(text),
            RawValue::Number(_) => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Text(text) => f.write_str(text),
            RawValue::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Key → value mapping from one successful parse. Key order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawSnapshot {
    fields: HashMap<String, RawValue>,
}

impl RawSnapshot {
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Text form of a field, used for identity fields like `type` and `version`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(ToString::to_string)
    }
}

impl FromIterator<(String, RawValue)> for RawSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<HashMap<String, RawValue>> for RawSnapshot {
    fn from(fields: HashMap<String, RawValue>) -> Self {
        Self { fields }
    }
}
