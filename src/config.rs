use crate::devices::DeviceKind;
use serde::{Deserialize, Serialize};
use std::env;

pub const TCP_ADDRESS_ENV: &str = "NODE_RED_DBUS_ADDRESS";
pub const SESSION_ADDRESS_ENV: &str = "DBUS_SESSION_BUS_ADDRESS";
pub const SYSTEM_BUS_ADDRESS: &str = "unix:path=/var/run/dbus/system_bus_socket";

/// A configuration field that may arrive as a JSON number or as text.
///
/// Any other JSON value is kept as `Other` and reads as non-numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl ConfigValue {
    /// Numeric reading of the value, `None` when absent, unparsable or not finite.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            ConfigValue::Number(n) => *n,
            ConfigValue::Text(s) => s.trim().parse::<f64>().ok()?,
            ConfigValue::Other(_) => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Number(f64::from(v))
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Text(v.to_string())
    }
}

/// Per-instance configuration of a virtual device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Instance id, used in the service name.
    pub id: String,
    /// Device kind identifier, e.g. `"grid"`.
    pub device: DeviceKind,
    #[serde(default)]
    pub device_instance: Option<ConfigValue>,
    /// Display name, `"Virtual <kind>"` when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Number of AC phases (grid only).
    #[serde(default)]
    pub nr_of_phases: Option<ConfigValue>,
}

impl DeviceConfig {
    pub fn new(id: impl Into<String>, device: DeviceKind) -> Self {
        Self {
            id: id.into(),
            device,
            device_instance: None,
            name: None,
            nr_of_phases: None,
        }
    }

    pub fn with_device_instance(mut self, instance: impl Into<ConfigValue>) -> Self {
        self.device_instance = Some(instance.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_phases(mut self, phases: impl Into<ConfigValue>) -> Self {
        self.nr_of_phases = Some(phases.into());
        self
    }

    /// Numeric device instance; anything unusable becomes 0.
    pub fn device_instance(&self) -> i32 {
        self.device_instance
            .as_ref()
            .and_then(ConfigValue::as_number)
            .map(f64::trunc)
            .filter(|n| *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX))
            .map_or(0, |n| n as i32)
    }
}

/// Where the device bus lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusAddress {
    /// Remote bus reached over TCP with anonymous authentication.
    Tcp { host: String, port: u16 },
    Session(String),
    System,
}

impl BusAddress {
    pub fn from_env() -> Self {
        Self::resolve(
            env::var(TCP_ADDRESS_ENV).ok().as_deref(),
            env::var(SESSION_ADDRESS_ENV).ok().as_deref(),
        )
    }

    /// `host:port` in `tcp` wins, then a session bus address, then the system bus.
    pub fn resolve(tcp: Option<&str>, session: Option<&str>) -> Self {
        if let Some(tcp) = tcp {
            let parts: Vec<&str> = tcp.split(':').collect();
            if let [host, port] = parts.as_slice() {
                if let Ok(port) = port.parse::<u16>() {
                    if !host.is_empty() {
                        return BusAddress::Tcp {
                            host: (*host).to_string(),
                            port,
                        };
                    }
                }
            }
        }

        match session {
            Some(address) if !address.is_empty() => BusAddress::Session(address.to_string()),
            _ => BusAddress::System,
        }
    }

    pub fn address(&self) -> String {
        match self {
            BusAddress::Tcp { host, port } => format!("tcp:host={},port={}", host, port),
            BusAddress::Session(address) => address.clone(),
            BusAddress::System => SYSTEM_BUS_ADDRESS.to_string(),
        }
    }

    pub fn auth_methods(&self) -> &'static [&'static str] {
        match self {
            BusAddress::Tcp { .. } => &["ANONYMOUS"],
            _ => &["EXTERNAL"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_instance_coercion() {
        let config = DeviceConfig::new("a", DeviceKind::Grid);
        assert_eq!(config.device_instance(), 0);
        assert_eq!(config.clone().with_device_instance(42).device_instance(), 42);
        assert_eq!(config.clone().with_device_instance("17").device_instance(), 17);
        assert_eq!(config.clone().with_device_instance("3.9").device_instance(), 3);
        assert_eq!(config.clone().with_device_instance("abc").device_instance(), 0);
        assert_eq!(config.with_device_instance("1e12").device_instance(), 0);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{"id":"n1","device":"grid","device_instance":"40","nr_of_phases":3}"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device, DeviceKind::Grid);
        assert_eq!(config.device_instance(), 40);
        assert_eq!(config.nr_of_phases, Some(ConfigValue::Number(3.0)));
        assert!(config.name.is_none());
    }

    #[test]
    fn test_non_numeric_json_fields_fall_back() {
        let json = r#"{"id":"m","device":"grid","device_instance":true,"nr_of_phases":[2]}"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.device_instance(), 0);
        assert_eq!(config.nr_of_phases, Some(ConfigValue::Other(serde_json::json!([2]))));
        assert_eq!(config.nr_of_phases.as_ref().and_then(ConfigValue::as_number), None);
    }

    #[test]
    fn test_bus_address_resolution() {
        assert_eq!(
            BusAddress::resolve(Some("192.168.1.5:78"), Some("unix:path=/tmp/s")),
            BusAddress::Tcp { host: "192.168.1.5".into(), port: 78 }
        );
        assert_eq!(
            BusAddress::resolve(Some("192.168.1.5:78"), None).address(),
            "tcp:host=192.168.1.5,port=78"
        );
        assert_eq!(
            BusAddress::resolve(Some("bad"), Some("unix:path=/tmp/s")),
            BusAddress::Session("unix:path=/tmp/s".into())
        );
        assert_eq!(BusAddress::resolve(None, None), BusAddress::System);
    }
}
