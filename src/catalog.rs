//! Measurement Catalog
//!
//! Static table of the raw keys a Solax inverter reports and how to present them.
//!
//! Unit, measurement class and accumulation semantics are inferred from the label
//! text by [`classify`], once per entry when the catalog is first accessed.
//!
//! | Label contains | Class       | Unit | Accumulation      |
//! |----------------|-------------|------|-------------------|
//! | `Voltage`      | voltage     | V    | -                 |
//! | `Current`      | current     | A    | -                 |
//! | `Power`        | power       | W    | measurement       |
//! | `Energy`       | energy      | kWh  | total increasing  |
//! | `Frequency`    | frequency   | Hz   | -                 |
//! | `Temperature`  | temperature | °C   | -                 |
//! | `Charge`       | battery     | %    | -                 |
//!
//! The first matching row wins. Identity and status fields match no row and carry
//! no unit.

use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Physical unit of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Unit {
    #[serde(rename = "V")]
    Volt,
    #[serde(rename = "A")]
    Ampere,
    #[serde(rename = "W")]
    Watt,
    #[serde(rename = "kWh")]
    KilowattHour,
    #[serde(rename = "Hz")]
    Hertz,
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "%")]
    Percent,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Watt => "W",
            Unit::KilowattHour => "kWh",
            Unit::Hertz => "Hz",
            Unit::Celsius => "°C",
            Unit::Percent => "%",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What kind of quantity a measurement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementClass {
    Voltage,
    Current,
    Power,
    Energy,
    Frequency,
    Temperature,
    Battery,
}

impl MeasurementClass {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementClass::Voltage => "voltage",
            MeasurementClass::Current => "current",
            MeasurementClass::Power => "power",
            MeasurementClass::Energy => "energy",
            MeasurementClass::Frequency => "frequency",
            MeasurementClass::Temperature => "temperature",
            MeasurementClass::Battery => "battery",
        }
    }
}

/// Accumulation semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    /// Instantaneous reading.
    Measurement,
    /// Monotonically increasing total (resets allowed).
    TotalIncreasing,
}

impl StateClass {
    pub fn as_str(self) -> &'static str {
        match self {
            StateClass::Measurement => "measurement",
            StateClass::TotalIncreasing => "total_increasing",
        }
    }
}

/// Presentation metadata inferred from a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub unit: Option<Unit>,
    pub class: Option<MeasurementClass>,
    pub state_class: Option<StateClass>,
}

/// Infer unit, class and accumulation from label text.
pub fn classify(label: &str) -> Classification {
    let (unit, class, state_class) = if label.contains("Voltage") {
        (Unit::Volt, MeasurementClass::Voltage, None)
    } else if label.contains("Current") {
        (Unit::Ampere, MeasurementClass::Current, None)
    } else if label.contains("Power") {
        (
            Unit::Watt,
            MeasurementClass::Power,
            Some(StateClass::Measurement),
        )
    } else if label.contains("Energy") {
        (
            Unit::KilowattHour,
            MeasurementClass::Energy,
            Some(StateClass::TotalIncreasing),
        )
    } else if label.contains("Frequency") {
        (Unit::Hertz, MeasurementClass::Frequency, None)
    } else if label.contains("Temperature") {
        (Unit::Celsius, MeasurementClass::Temperature, None)
    } else if label.contains("Charge") {
        (Unit::Percent, MeasurementClass::Battery, None)
    } else {
        return Classification::default();
    };

    Classification {
        unit: Some(unit),
        class: Some(class),
        state_class,
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: Option<Unit>,
    pub class: Option<MeasurementClass>,
    pub state_class: Option<StateClass>,
}

impl MeasurementDefinition {
    fn new(key: &'static str, label: &'static str) -> Self {
        let Classification {
            unit,
            class,
            state_class,
        } = classify(label);
        Self {
            key,
            label,
            unit,
            class,
            state_class,
        }
    }
}

const ENTRIES: &[(&str, &str)] = &[
    // Identity and status
    ("method", "Method"),
    ("version", "Version"),
    ("type", "Type"),
    ("SN", "Serial Number"),
    ("Status", "Status"),
    // PV string 1
    ("Data_0", "PV1 Voltage"),
    ("Data_1", "PV1 Current"),
    ("Data_4", "PV1 Power"),
    // PV string 2
    ("Data_2", "PV2 Voltage"),
    ("Data_3", "PV2 Current"),
    ("Data_5", "PV2 Power"),
    // Grid (power: positive = export, negative = import)
    ("Data_6", "Grid Voltage"),
    ("Data_7", "Grid Current"),
    ("Data_8", "Grid Power"),
    ("Data_9", "Grid Frequency"),
    // Inverter
    ("Data_10", "Inverter Temperature"),
    ("Data_11", "Today's Energy"),
    ("Data_12", "Total Energy"),
    // Battery (current: positive = charging)
    ("Data_13", "Battery Voltage"),
    ("Data_14", "Battery Current"),
    ("Data_15", "Battery Power"),
    ("Data_16", "Battery Temperature"),
    ("Data_17", "Battery State of Charge"),
];

/// The full catalog, classified on first access.
pub fn catalog() -> &'static [MeasurementDefinition] {
    static CATALOG: OnceLock<Vec<MeasurementDefinition>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        ENTRIES
            .iter()
            .map(|(key, label)| MeasurementDefinition::new(key, label))
            .collect()
    })
}

pub fn lookup(key: &str) -> Option<&'static MeasurementDefinition> {
    catalog().iter().find(|definition| definition.key == key)
}
