use crate::bus::{ChangeEmitter, NoopEmitter};
use crate::devices::{DeviceKind, PropertySpec, Value, WireType};
use crate::error::StoreError;
use crate::format::Format;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

pub const DEVICE_INSTANCE: &str = "DeviceInstance";
pub const CUSTOM_NAME: &str = "CustomName";
pub const STATUS: &str = "Status";

pub const PROCESS_NAME: &str = env!("CARGO_PKG_NAME");
pub const PROCESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Properties every exported object carries, appended last.
pub fn common_properties() -> [PropertySpec; 3] {
    [
        PropertySpec::int(DEVICE_INSTANCE).with_default(Value::Int(0)),
        PropertySpec::text(CUSTOM_NAME),
        PropertySpec::int(STATUS).with_default(Value::Int(0)),
    ]
}

/// Management block exported by kinds that own their service.
pub fn management_properties(kind: &DeviceKind) -> Vec<PropertySpec> {
    if !kind.exports_management() {
        return Vec::new();
    }

    vec![
        PropertySpec::int("Connected").with_default(Value::Int(1)),
        PropertySpec::text("ProductName").with_default(Value::Text(format!("Virtual {}", kind))),
        PropertySpec::text("Mgmt/ProcessName").with_default(Value::Text(PROCESS_NAME.to_string())),
        PropertySpec::text("Mgmt/ProcessVersion")
            .with_default(Value::Text(PROCESS_VERSION.to_string())),
        PropertySpec::text("Mgmt/Connection").with_default(Value::Text("Virtual".to_string())),
    ]
}

fn exported_properties(kind: &DeviceKind) -> impl Iterator<Item = PropertySpec> {
    kind.schema()
        .into_iter()
        .chain(management_properties(kind))
        .chain(common_properties())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub wire_type: WireType,
    #[serde(skip_serializing_if = "Format::is_none")]
    pub format: Format,
}

/// Type and format metadata published next to a device's live values.
///
/// Entries keep insertion order. Inserting an existing name replaces the
/// entry in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceDescriptor {
    entries: Vec<(String, PropertyDescriptor)>,
}

impl InterfaceDescriptor {
    pub fn build(kind: &DeviceKind) -> Self {
        let mut descriptor = Self::default();
        for spec in exported_properties(kind) {
            descriptor.insert(spec.name, spec.wire_type, spec.format);
        }
        descriptor
    }

    pub fn insert(&mut self, name: impl Into<String>, wire_type: WireType, format: Format) {
        let name = name.into();
        let entry = PropertyDescriptor { wire_type, format };
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display text for a value of `name`. Unknown names render the raw value.
    pub fn format_value(&self, name: &str, value: &Value) -> String {
        self.get(name)
            .map_or(Format::None, |d| d.format)
            .apply(value)
    }

    /// Wire-level signature: property name to type code.
    pub fn type_codes(&self) -> Vec<(String, char)> {
        self.entries
            .iter()
            .map(|(n, d)| (n.clone(), d.wire_type.code()))
            .collect()
    }
}

impl Serialize for InterfaceDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, descriptor) in &self.entries {
            map.serialize_entry(name, descriptor)?;
        }
        map.end()
    }
}

/// Instance-specific values applied on top of the schema defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOverrides {
    pub device_instance: i32,
    pub custom_name: String,
}

impl InstanceOverrides {
    pub fn for_kind(kind: &DeviceKind, device_instance: i32, custom_name: Option<&str>) -> Self {
        Self {
            device_instance,
            custom_name: custom_name
                .filter(|n| !n.trim().is_empty())
                .map_or_else(|| format!("Virtual {}", kind), str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    wire_type: WireType,
    value: Value,
}

/// Current values of one exported device object.
#[derive(Debug)]
pub struct LiveValueStore {
    slots: Vec<(String, Slot)>,
    emitter: Box<dyn ChangeEmitter>,
}

impl LiveValueStore {
    pub fn init(kind: &DeviceKind, overrides: &InstanceOverrides) -> Self {
        let mut store = Self {
            slots: Vec::new(),
            emitter: Box::new(NoopEmitter),
        };

        for spec in exported_properties(kind) {
            let value = spec.initial_value();
            store.insert(spec.name, spec.wire_type, value);
        }

        store.insert(DEVICE_INSTANCE, WireType::Int32, Value::Int(overrides.device_instance));
        store.insert(CUSTOM_NAME, WireType::String, Value::Text(overrides.custom_name.clone()));
        store.insert(STATUS, WireType::Int32, Value::Int(0));

        store
    }

    /// Construction-time insertion, replacing any existing slot of the same name.
    pub fn insert(&mut self, name: impl Into<String>, wire_type: WireType, value: Value) {
        let name = name.into();
        let slot = Slot { wire_type, value };
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.slots.push((name, slot)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slot(name).map(|s| &s.value)
    }

    pub fn wire_type(&self, name: &str) -> Option<WireType> {
        self.slot(name).map(|s| s.wire_type)
    }

    /// External write delivered through the bus accessors.
    ///
    /// The value must fit the declared wire type; ranges are advisory and
    /// not checked.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), StoreError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .ok_or_else(|| StoreError::UnknownProperty(name.to_string()))?;

        let expected = slot.wire_type;
        slot.value = value
            .coerce_to(expected)
            .ok_or_else(|| StoreError::TypeMismatch {
                property: name.to_string(),
                expected,
            })?;

        debug!("{} written externally", name);
        Ok(())
    }

    /// Local mutation: stores the value and notifies listeners.
    pub fn publish(
        &mut self,
        descriptor: &InterfaceDescriptor,
        name: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.set(name, value)?;
        if let Some(stored) = self.get(name) {
            let text = descriptor.format_value(name, stored);
            self.emitter.items_changed(name, stored, &text);
        }
        Ok(())
    }

    pub fn install_emitter(&mut self, emitter: Box<dyn ChangeEmitter>) {
        self.emitter = emitter;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(n, s)| (n.as_str(), &s.value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl Serialize for LiveValueStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (name, slot) in &self.slots {
            map.serialize_entry(name, &slot.value)?;
        }
        map.end()
    }
}
