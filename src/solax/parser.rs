//! Solax Response Parser
//!
//! Turns the body of `GET /api/realTimeData.htm` into a [`RawSnapshot`].
//!
//! # Wire Formats
//!
//! Inverter firmware ships one of two dialects:
//!
//! - **Line format**: one `key=value` pair per line. Some firmware leaves a
//!   position empty between two commas, so every `,,` is rewritten to `,0,`
//!   before splitting. The replacement does not overlap: `1,,,4` becomes
//!   `1,0,,4`.
//! - **Structured format**: a JSON document with scalar fields (`method`,
//!   `version`, `type`, `SN`, `Status`, ...) and a positional `Data` array.
//!   Empty array positions (`[1,,3]`) are rewritten to `null` before decoding.
//!   Element `i` lands under `Data_<i>`; `null` elements are omitted, not zeroed.
//!
//! [`ResponseFormat`] picks the strategy, either explicitly or by sniffing the
//! body (`auto`).

use crate::error::{excerpt, ParseError};
use crate::solax::types::{RawSnapshot, RawValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Name of the positional readings array in the structured format.
const DATA_FIELD: &str = "Data";

/// A strategy for decoding one wire format.
pub trait ParseStrategy {
    fn parse(&self, body: &str) -> Result<RawSnapshot, ParseError>;
}

/// `key=value` per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

/// JSON-like document with a `Data` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredFormat;

/// Which wire format to expect from the inverter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Sniff each body: a leading `{` selects the structured path.
    #[default]
    Auto,
    Line,
    Structured,
}

impl ResponseFormat {
    /// Resolve `Auto` against a concrete body.
    pub fn detect(self, body: &str) -> ResponseFormat {
        match self {
            ResponseFormat::Auto => {
                if body.trim_start().starts_with('{') {
                    ResponseFormat::Structured
                } else {
                    ResponseFormat::Line
                }
            }
            explicit => explicit,
        }
    }

    pub fn parse(self, body: &str) -> Result<RawSnapshot, ParseError> {
        let format = self.detect(body);
        debug!(?format, bytes = body.len(), "Parsing inverter response");
        match format {
            ResponseFormat::Structured => StructuredFormat.parse(body),
            ResponseFormat::Line | ResponseFormat::Auto => LineFormat.parse(body),
        }
    }
}

/// Rewrite `,,` to `,0,` (non-overlapping, left to right).
pub fn repair_empty_fields(body: &str) -> String {
    body.replace(",,", ",0,")
}

impl ParseStrategy for LineFormat {
    fn parse(&self, body: &str) -> Result<RawSnapshot, ParseError> {
        let repaired = repair_empty_fields(body);

        let snapshot: RawSnapshot = repaired
            .split('\n')
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), RawValue::from(value.trim())))
            .collect();

        if snapshot.is_empty() {
            return Err(ParseError::NoFields {
                excerpt: excerpt(body),
            });
        }
        Ok(snapshot)
    }
}

/// Locate `"Data":[...]` and replace empty elements with `null`.
///
/// Returns `None` when the body has no `Data` array at all.
pub fn sanitize_data_array(body: &str) -> Option<String> {
    let needle = format!("\"{}\"", DATA_FIELD);
    let mut search_from = 0;

    while let Some(found) = body[search_from..].find(&needle) {
        let after_key = search_from + found + needle.len();
        search_from = after_key;

        let rest = &body[after_key..];
        let Some(rest) = rest.trim_start().strip_prefix(':') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix('[') else {
            continue;
        };
        let open = body.len() - rest.len();
        // Unterminated array: leave it for the decoder to reject.
        let Some(len) = rest.find(']') else {
            return Some(body.to_string());
        };
        let close = open + len;

        let inner = &body[open..close];
        if inner.trim().is_empty() {
            return Some(body.to_string());
        }

        let elements: Vec<&str> = inner
            .split(',')
            .map(|element| {
                if element.trim().is_empty() {
                    "null"
                } else {
                    element
                }
            })
            .collect();

        let mut sanitized = String::with_capacity(body.len() + 8);
        sanitized.push_str(&body[..open]);
        sanitized.push_str(&elements.join(","));
        sanitized.push_str(&body[close..]);
        return Some(sanitized);
    }

    None
}

fn scalar(value: &Value) -> Option<RawValue> {
    match value {
        Value::String(text) => Some(RawValue::Text(text.clone())),
        Value::Number(number) => number.as_f64().map(RawValue::Number),
        Value::Bool(flag) => Some(RawValue::Text(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl ParseStrategy for StructuredFormat {
    fn parse(&self, body: &str) -> Result<RawSnapshot, ParseError> {
        let missing = || ParseError::MissingDataArray {
            excerpt: excerpt(body),
        };

        let sanitized = sanitize_data_array(body).ok_or_else(missing)?;
        let document: Map<String, Value> =
            serde_json::from_str(&sanitized).map_err(|source| ParseError::Malformed {
                source,
                excerpt: excerpt(body),
            })?;

        let Some(Value::Array(readings)) = document.get(DATA_FIELD) else {
            return Err(missing());
        };

        let scalars = document
            .iter()
            .filter(|(key, _)| key.as_str() != DATA_FIELD)
            .filter_map(|(key, value)| scalar(value).map(|raw| (key.clone(), raw)));

        let positional = readings
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                scalar(value).map(|raw| (format!("{}_{}", DATA_FIELD, index), raw))
            });

        Ok(scalars.chain(positional).collect())
    }
}
