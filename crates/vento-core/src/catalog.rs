// ── Parameter catalog ──
//
// Static display metadata for the parameters this crate knows about.
// Formatters are plain functions so the table can live in a `static`.

use vento_proto::ParseParameterIdError;

use crate::model::{ParameterId, ParameterValue};

const UNKNOWN: &str = "Unknown";

/// Display metadata for one known parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterInfo {
    pub id: ParameterId,
    /// Stable snake_case key, usable on the command line.
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub unit: Option<&'static str>,
    /// Renders a raw value for display.
    pub format: fn(&ParameterValue) -> String,
}

impl ParameterInfo {
    pub fn display(&self, value: &ParameterValue) -> String {
        (self.format)(value)
    }
}

static CATALOG: [ParameterInfo; 9] = [
    ParameterInfo {
        id: ParameterId::POWER,
        key: "power",
        name: "Power",
        unit: None,
        format: format_power,
    },
    ParameterInfo {
        id: ParameterId::SPEED_STAGE,
        key: "speed_stage",
        name: "Speed stage",
        unit: None,
        format: format_speed_stage,
    },
    ParameterInfo {
        id: ParameterId::BOOST,
        key: "boost",
        name: "Boost",
        unit: None,
        format: format_boost,
    },
    ParameterInfo {
        id: ParameterId::HUMIDITY_SETPOINT,
        key: "humidity_setpoint",
        name: "Humidity set point",
        unit: Some("%"),
        format: format_percent,
    },
    ParameterInfo {
        id: ParameterId::HUMIDITY,
        key: "humidity",
        name: "Humidity",
        unit: Some("%"),
        format: format_percent,
    },
    ParameterInfo {
        id: ParameterId::FAN1_SPEED,
        key: "fan1_speed",
        name: "Fan 1 speed",
        unit: Some("rpm"),
        format: format_rpm,
    },
    ParameterInfo {
        id: ParameterId::FAN2_SPEED,
        key: "fan2_speed",
        name: "Fan 2 speed",
        unit: Some("rpm"),
        format: format_rpm,
    },
    ParameterInfo {
        id: ParameterId::FILTER_TIMER,
        key: "filter_timer",
        name: "Filter timer",
        unit: None,
        format: format_raw,
    },
    ParameterInfo {
        id: ParameterId::OPERATING_MODE,
        key: "operating_mode",
        name: "Operating mode",
        unit: None,
        format: format_operating_mode,
    },
];

/// Every known parameter, in ascending id order.
pub fn all() -> &'static [ParameterInfo] {
    &CATALOG
}

pub fn lookup(id: ParameterId) -> Option<&'static ParameterInfo> {
    CATALOG.iter().find(|info| info.id == id)
}

/// Find a parameter by its catalog key (case-insensitive).
pub fn lookup_key(key: &str) -> Option<&'static ParameterInfo> {
    CATALOG.iter().find(|info| info.key.eq_ignore_ascii_case(key))
}

/// Resolve a parameter from a catalog key (`fan1_speed`) or a numeric id
/// (`74`, `0x004a`).
pub fn parse_parameter(input: &str) -> Result<ParameterId, ParseParameterIdError> {
    match lookup_key(input.trim()) {
        Some(info) => Ok(info.id),
        None => input.parse(),
    }
}

/// Format `value` for display; ids outside the catalog show the raw value.
pub fn format_value(id: ParameterId, value: &ParameterValue) -> String {
    lookup(id).map_or_else(|| value.to_string(), |info| info.display(value))
}

// ── Formatters ───────────────────────────────────────────────────────

fn format_power(value: &ParameterValue) -> String {
    match value.as_number() {
        Some(0) => "Off",
        Some(1) => "On",
        Some(2) => "Toggle",
        _ => UNKNOWN,
    }
    .to_owned()
}

fn format_speed_stage(value: &ParameterValue) -> String {
    match value.as_number() {
        Some(n @ 1..=3) => format!("Speed {n}"),
        Some(255) => "Manual".to_owned(),
        _ => UNKNOWN.to_owned(),
    }
}

fn format_boost(value: &ParameterValue) -> String {
    match value.as_number() {
        Some(0) => "Off",
        Some(1) => "On",
        _ => UNKNOWN,
    }
    .to_owned()
}

fn format_operating_mode(value: &ParameterValue) -> String {
    match value.as_number() {
        Some(0) => "Ventilation",
        Some(1) => "Heat recovery",
        Some(2) => "Supply air",
        _ => UNKNOWN,
    }
    .to_owned()
}

fn format_percent(value: &ParameterValue) -> String {
    with_unit(value, "%")
}

fn format_rpm(value: &ParameterValue) -> String {
    with_unit(value, "rpm")
}

fn with_unit(value: &ParameterValue, unit: &str) -> String {
    match value.as_number() {
        Some(n) => format!("{n} {unit}"),
        None => value.to_string(),
    }
}

/// The controller documents no meaning for the filter timer bytes.
fn format_raw(value: &ParameterValue) -> String {
    value.to_string()
}
