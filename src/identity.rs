use crate::devices::DeviceKind;
use crate::error::IdentityError;
use arrayvec::ArrayString;
use static_assertions::const_assert;

pub const MAX_BUS_NAME_LEN: usize = 255;
pub const MAX_OBJECT_PATH_LEN: usize = MAX_BUS_NAME_LEN + 1;

pub const SERVICE_PREFIX: &str = "com.victronenergy";
/// Shared settings service that relay devices attach to.
pub const SETTINGS_SERVICE: &str = "com.victronenergy.settings";

const_assert!(SETTINGS_SERVICE.len() <= MAX_BUS_NAME_LEN);

pub type BusName = ArrayString<MAX_BUS_NAME_LEN>;
pub type ObjectPath = ArrayString<MAX_OBJECT_PATH_LEN>;

/// Bus service name and object path of one virtual device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    service_name: BusName,
    object_path: ObjectPath,
}

impl ServiceIdentity {
    pub fn new(kind: &DeviceKind, instance_id: &str) -> Result<Self, IdentityError> {
        let service_name = match kind {
            // Relays never own a name, they add settings to the existing service
            DeviceKind::Relay => SETTINGS_SERVICE.to_string(),
            _ => {
                if kind.as_str().is_empty() {
                    return Err(IdentityError::EmptyKind);
                }
                if instance_id.is_empty() {
                    return Err(IdentityError::EmptyInstanceId);
                }
                format!("{}.{}.virtual_{}", SERVICE_PREFIX, kind, instance_id)
            }
        };

        let object_path = format!("/{}", service_name.replace('.', "/"));
        let len = service_name.len();

        Ok(Self {
            service_name: ArrayString::from(&service_name)
                .map_err(|_| IdentityError::NameTooLong(len))?,
            object_path: ArrayString::from(&object_path)
                .map_err(|_| IdentityError::NameTooLong(len))?,
        })
    }

    pub fn bus_name(&self) -> BusName {
        self.service_name
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    pub fn is_shared_settings(&self) -> bool {
        self.service_name.as_str() == SETTINGS_SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_derivation() {
        let identity = ServiceIdentity::new(&DeviceKind::Meteo, "ab12").unwrap();
        assert_eq!(identity.service_name(), "com.victronenergy.meteo.virtual_ab12");
        assert_eq!(identity.object_path(), "/com/victronenergy/meteo/virtual_ab12");
    }

    #[test]
    fn test_name_length_limit() {
        let long_id = "x".repeat(240);
        let result = ServiceIdentity::new(&DeviceKind::Grid, &long_id);
        assert!(matches!(result, Err(IdentityError::NameTooLong(_))));
    }
}
