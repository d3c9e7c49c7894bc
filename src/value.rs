//! Value Typing
//!
//! Best-effort numeric conversion of raw readings. [`type_value`] is total: it
//! never fails, whatever the inverter sends.

use crate::solax::types::RawValue;
use serde::Serialize;

/// A reading ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Number(f64),
    /// Non-numeric reading, passed through unchanged.
    Text(String),
    /// The key was absent from the snapshot.
    Unavailable,
}

impl TypedValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TypedValue::Number(number) => Some(*number),
            TypedValue::Text(_) | TypedValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, TypedValue::Unavailable)
    }
}

pub fn type_value(raw: Option<&RawValue>) -> TypedValue {
    match raw {
        None => TypedValue::Unavailable,
        Some(RawValue::Number(number)) => TypedValue::Number(*number),
        Some(RawValue::Text(text)) => match text.trim().parse::<f64>() {
            Ok(number) => TypedValue::Number(number),
            Err(_) => TypedValue::Text(text.clone()),
        },
    }
}
