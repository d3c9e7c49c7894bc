//! Presentation Projection
//!
//! Turns the current [`RawSnapshot`] into named, typed, unit-annotated
//! [`DataPoint`]s, one per catalog entry present in the snapshot.
//!
//! # Materialization
//!
//! With [`Materialization::FirstSnapshot`] (the default) the set of exposed
//! catalog entries is fixed by the first snapshot the projection sees: an entry
//! whose key was missing then is never exposed, even if the key shows up later.
//! [`Materialization::EverySnapshot`] re-evaluates membership on every read.
//!
//! Either way a point is only produced while its key is in the current snapshot.
//! A materialized key that vanishes from a later snapshot yields no point at all
//! (rather than one with [`TypedValue::Unavailable`]); it reappears once the key
//! does. [`TypedValue::Unavailable`] is reserved for callers typing a lookup
//! directly with [`type_value`].

use crate::catalog::{catalog, MeasurementClass, MeasurementDefinition, StateClass, Unit};
use crate::solax::types::RawSnapshot;
use crate::value::{type_value, TypedValue};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

pub const MANUFACTURER: &str = "Solax";
pub const DEVICE_NAME: &str = "Solax Inverter";
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialization {
    #[default]
    FirstSnapshot,
    EverySnapshot,
}

/// One presented measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    /// `<host>_<raw key>`, stable across restarts.
    pub unique_id: String,
    pub key: &'static str,
    /// `Solax <Label>`
    pub name: String,
    pub value: TypedValue,
    pub unit: Option<Unit>,
    pub device_class: Option<MeasurementClass>,
    pub state_class: Option<StateClass>,
}

/// The inverter as a logical device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub manufacturer: &'static str,
    pub name: &'static str,
    pub model: String,
    pub sw_version: String,
}

impl DeviceInfo {
    pub fn from_snapshot(host: &str, snapshot: &RawSnapshot) -> Self {
        Self {
            identifier: host.to_string(),
            manufacturer: MANUFACTURER,
            name: DEVICE_NAME,
            model: snapshot.text("type").unwrap_or_else(|| UNKNOWN.to_string()),
            sw_version: snapshot
                .text("version")
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

pub fn unique_id(host: &str, key: &str) -> String {
    format!("{}_{}", host, key)
}

pub struct Projection {
    host: String,
    policy: Materialization,
    materialized: OnceLock<Vec<&'static MeasurementDefinition>>,
}

impl Projection {
    pub fn new(host: impl Into<String>, policy: Materialization) -> Self {
        Self {
            host: host.into(),
            policy,
            materialized: OnceLock::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn policy(&self) -> Materialization {
        self.policy
    }

    /// Fix the exposed entries from `snapshot`. Later calls are no-ops.
    pub fn materialize(&self, snapshot: &RawSnapshot) -> &[&'static MeasurementDefinition] {
        self.materialized.get_or_init(|| {
            let entries: Vec<_> = catalog()
                .iter()
                .filter(|definition| snapshot.contains_key(definition.key))
                .collect();
            info!(
                "Materialized {} of {} catalog entries for {}",
                entries.len(),
                catalog().len(),
                self.host
            );
            entries
        })
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized.get().is_some()
    }

    /// Data points for the current snapshot, in catalog order.
    pub fn read(&self, snapshot: &RawSnapshot) -> Vec<DataPoint> {
        let candidates: Vec<&'static MeasurementDefinition> = match self.policy {
            Materialization::FirstSnapshot => self.materialize(snapshot).to_vec(),
            Materialization::EverySnapshot => catalog().iter().collect(),
        };

        candidates
            .into_iter()
            .filter(|definition| snapshot.contains_key(definition.key))
            .map(|definition| self.point(definition, snapshot))
            .collect()
    }

    fn point(
        &self,
        definition: &'static MeasurementDefinition,
        snapshot: &RawSnapshot,
    ) -> DataPoint {
        DataPoint {
            unique_id: unique_id(&self.host, definition.key),
            key: definition.key,
            name: format!("{} {}", MANUFACTURER, definition.label),
            value: type_value(snapshot.get(definition.key)),
            unit: definition.unit,
            device_class: definition.class,
            state_class: definition.state_class,
        }
    }

    pub fn device(&self, snapshot: &RawSnapshot) -> DeviceInfo {
        DeviceInfo::from_snapshot(&self.host, snapshot)
    }
}
