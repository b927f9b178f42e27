pub mod digitalinput;
pub mod grid;
pub mod heatpump;
pub mod meteo;
pub mod pvinverter;
pub mod relay;
pub mod tank;
pub mod temperature;

use crate::config::DeviceConfig;
use crate::format::Format;
use crate::interface::{InterfaceDescriptor, LiveValueStore};
use serde::{Deserialize, Serialize};

/// Wire type codes understood by the bus: `s`, `i` and `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireType {
    #[serde(rename = "s")]
    String,
    #[serde(rename = "i")]
    Int32,
    #[serde(rename = "d")]
    Double,
}

impl WireType {
    pub fn code(self) -> char {
        match self {
            WireType::String => 's',
            WireType::Int32 => 'i',
            WireType::Double => 'd',
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, WireType::String)
    }

    /// Value used when a property declares no default.
    ///
    /// Numeric properties start as [`Value::Null`] so readers can tell
    /// "no reading yet" apart from a real zero.
    pub fn fallback(self) -> Value {
        match self {
            WireType::String => Value::Text("-".to_string()),
            WireType::Int32 | WireType::Double => Value::Null,
        }
    }
}

/// A live property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i32),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Checks the value against a wire type, widening integers for doubles.
    ///
    /// Returns `None` when the value cannot be carried by `wire_type`.
    pub fn coerce_to(self, wire_type: WireType) -> Option<Value> {
        match (wire_type, self) {
            (_, Value::Null) if wire_type.is_numeric() => Some(Value::Null),
            (WireType::String, Value::Text(s)) => Some(Value::Text(s)),
            (WireType::Int32, Value::Int(v)) => Some(Value::Int(v)),
            (WireType::Double, Value::Double(v)) => Some(Value::Double(v)),
            (WireType::Double, Value::Int(v)) => Some(Value::Double(f64::from(v))),
            _ => None,
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// One exposed field of a device kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySpec {
    pub name: &'static str,
    pub wire_type: WireType,
    pub default: Option<Value>,
    /// Advisory only, writes outside the range are accepted.
    pub range: Option<Range>,
    pub format: Format,
}

impl PropertySpec {
    pub const fn new(name: &'static str, wire_type: WireType) -> Self {
        Self {
            name,
            wire_type,
            default: None,
            range: None,
            format: Format::None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, WireType::String)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, WireType::Int32)
    }

    pub const fn double(name: &'static str) -> Self {
        Self::new(name, WireType::Double)
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(Range { min, max });
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Shorthand for a double formatted with a fixed number of decimals and a unit.
    pub fn measured(name: &'static str, decimals: u8, unit: &'static str) -> Self {
        Self::double(name).with_format(Format::Fixed { decimals, unit })
    }

    pub fn initial_value(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.wire_type.fallback())
    }
}

/// Entry handed to the settings collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SettingSpec {
    pub path: &'static str,
    pub default: i32,
    pub min: i32,
    pub max: i32,
}

/// Post-processing run on a freshly built descriptor and store.
pub type ExpansionHook = fn(&mut InterfaceDescriptor, &mut LiveValueStore, &DeviceConfig);

/// Category of virtual device.
///
/// Parsing never fails: identifiers without a schema become [`DeviceKind::Other`]
/// and export only the common properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Temperature,
    Grid,
    Heatpump,
    Meteo,
    Tank,
    PvInverter,
    DigitalInput,
    Relay,
    Other(String),
}

impl DeviceKind {
    pub fn parse(identifier: &str) -> Self {
        match identifier {
            "temperature" => DeviceKind::Temperature,
            "grid" => DeviceKind::Grid,
            "heatpump" => DeviceKind::Heatpump,
            "meteo" => DeviceKind::Meteo,
            "tank" => DeviceKind::Tank,
            "pvinverter" => DeviceKind::PvInverter,
            "digitalinput" => DeviceKind::DigitalInput,
            "relay" => DeviceKind::Relay,
            other => DeviceKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceKind::Temperature => "temperature",
            DeviceKind::Grid => "grid",
            DeviceKind::Heatpump => "heatpump",
            DeviceKind::Meteo => "meteo",
            DeviceKind::Tank => "tank",
            DeviceKind::PvInverter => "pvinverter",
            DeviceKind::DigitalInput => "digitalinput",
            DeviceKind::Relay => "relay",
            DeviceKind::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeviceKind::Other(_))
    }

    /// Property schema of this kind, freshly built on every call.
    pub fn schema(&self) -> Vec<PropertySpec> {
        match self {
            DeviceKind::Temperature => temperature::properties(),
            DeviceKind::Grid => grid::properties(),
            DeviceKind::Heatpump => heatpump::properties(),
            DeviceKind::Meteo => meteo::properties(),
            DeviceKind::Tank => tank::properties(),
            DeviceKind::PvInverter => pvinverter::properties(),
            DeviceKind::DigitalInput => digitalinput::properties(),
            DeviceKind::Relay | DeviceKind::Other(_) => Vec::new(),
        }
    }

    /// Whether the kind owns its service and therefore exports the management block.
    ///
    /// Relays attach settings to the shared settings service instead.
    pub fn exports_management(&self) -> bool {
        self.is_known() && !matches!(self, DeviceKind::Relay)
    }

    pub fn expansion_hook(&self) -> Option<ExpansionHook> {
        match self {
            DeviceKind::Grid => Some(grid::expand_phases),
            _ => None,
        }
    }

    /// Settings registered with the settings collaborator after export.
    pub fn settings(&self) -> &'static [SettingSpec] {
        match self {
            DeviceKind::Relay => &relay::SETTINGS,
            _ => &[],
        }
    }
}

impl core::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeviceKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identifier = String::deserialize(deserializer)?;
        Ok(DeviceKind::parse(&identifier))
    }
}

pub const KNOWN_KINDS: [DeviceKind; 8] = [
    DeviceKind::Temperature,
    DeviceKind::Grid,
    DeviceKind::Heatpump,
    DeviceKind::Meteo,
    DeviceKind::Tank,
    DeviceKind::PvInverter,
    DeviceKind::DigitalInput,
    DeviceKind::Relay,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in KNOWN_KINDS.iter() {
            assert_eq!(&DeviceKind::parse(kind.as_str()), kind);
        }
        assert_eq!(
            DeviceKind::parse("battery"),
            DeviceKind::Other("battery".to_string())
        );
    }

    #[test]
    fn test_schema_names_unique() {
        for kind in KNOWN_KINDS.iter() {
            let schema = kind.schema();
            let mut names: Vec<_> = schema.iter().map(|p| p.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), schema.len(), "duplicate property in {}", kind);
        }
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(Value::Int(3).coerce_to(WireType::Double), Some(Value::Double(3.0)));
        assert_eq!(Value::Double(3.5).coerce_to(WireType::Int32), None);
        assert_eq!(Value::Null.coerce_to(WireType::Int32), Some(Value::Null));
        assert_eq!(Value::Null.coerce_to(WireType::String), None);
        assert_eq!(Value::Text("x".into()).coerce_to(WireType::Double), None);
    }
}
