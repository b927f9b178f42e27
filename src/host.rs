use crate::bus::Connector;
use crate::config::DeviceConfig;
use crate::device::{ClaimOutcome, ExportedObject, VirtualDevice};
use crate::devices::Value;
use crate::error::{HostError, StoreError};
use crate::naming::NameClaimState;
use crate::protocol::{ProtocolHandler, Request, RequestType, Response, ResponseStatus};
use crate::status::NodeStatus;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostStats {
    pub devices_created: u32,
    pub devices_exported: u32,
    pub devices_failed: u32,
    pub devices_closed: u32,
    pub requests_handled: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub id: String,
    pub kind: String,
    pub service_name: Option<String>,
    pub object_path: Option<String>,
    pub state: NameClaimState,
    pub status: NodeStatus,
}

/// Owns the virtual devices of one process.
///
/// A device that fails to claim its name keeps its error status and stays
/// listed; other devices are not affected.
#[derive(Debug)]
pub struct DeviceHost<C: Connector> {
    connector: C,
    devices: BTreeMap<String, VirtualDevice>,
    protocol: ProtocolHandler,
    stats: HostStats,
}

impl<C: Connector> DeviceHost<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            devices: BTreeMap::new(),
            protocol: ProtocolHandler::new(),
            stats: HostStats::default(),
        }
    }

    /// Creates a device and runs its name claim.
    ///
    /// Ids of closed devices can be reused. A failed claim is not an error
    /// here: the device is kept with its error status.
    pub fn create_device(&mut self, config: DeviceConfig) -> Result<&VirtualDevice, HostError> {
        if let Some(existing) = self.devices.get(&config.id) {
            if existing.state() != NameClaimState::Closed {
                return Err(HostError::DuplicateDevice(config.id));
            }
        }

        let id = config.id.clone();
        let mut device = VirtualDevice::new(config, self.connector.connect());
        self.stats.devices_created = self.stats.devices_created.saturating_add(1);

        match device.claim() {
            ClaimOutcome::Exported(_) => {
                self.stats.devices_exported = self.stats.devices_exported.saturating_add(1);
            }
            ClaimOutcome::Failed(e) => {
                warn!("Device {} not exported: {}", id, e);
                self.stats.devices_failed = self.stats.devices_failed.saturating_add(1);
            }
            ClaimOutcome::Abandoned | ClaimOutcome::Ignored => {}
        }

        // Replacing a closed device drops it here
        self.devices.insert(id.clone(), device);
        self.devices
            .get(&id)
            .ok_or(HostError::DeviceNotFound(id))
    }

    pub fn close_device(&mut self, id: &str) -> Result<(), HostError> {
        let device = self
            .devices
            .get_mut(id)
            .ok_or_else(|| HostError::DeviceNotFound(id.to_string()))?;

        if device.state() != NameClaimState::Closed {
            device.close();
            self.stats.devices_closed = self.stats.devices_closed.saturating_add(1);
        }
        Ok(())
    }

    pub fn close_all(&mut self) {
        let ids: Vec<String> = self.devices.keys().cloned().collect();
        for id in ids {
            let _ = self.close_device(&id);
        }
    }

    pub fn device(&self, id: &str) -> Option<&VirtualDevice> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &VirtualDevice> {
        self.devices.values()
    }

    pub fn summaries(&self) -> Vec<DeviceSummary> {
        self.devices
            .values()
            .map(|device| DeviceSummary {
                id: device.id().to_string(),
                kind: device.kind().to_string(),
                service_name: device.identity().map(|i| i.service_name().to_string()),
                object_path: device.identity().map(|i| i.object_path().to_string()),
                state: device.state(),
                status: device.status().clone(),
            })
            .collect()
    }

    pub fn get_value(&self, id: &str, path: &str) -> Result<Value, HostError> {
        Ok(self.object(id)?.get(path)?.clone())
    }

    pub fn get_text(&self, id: &str, path: &str) -> Result<String, HostError> {
        Ok(self.object(id)?.text(path)?)
    }

    pub fn set_value(&mut self, id: &str, path: &str, value: Value) -> Result<(), HostError> {
        Ok(self.object_mut(id)?.set(path, value)?)
    }

    pub fn publish(&mut self, id: &str, path: &str, value: Value) -> Result<(), HostError> {
        Ok(self.object_mut(id)?.publish(path, value)?)
    }

    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    fn object(&self, id: &str) -> Result<&ExportedObject, HostError> {
        self.devices
            .get(id)
            .ok_or_else(|| HostError::DeviceNotFound(id.to_string()))?
            .exported()
            .ok_or_else(|| HostError::NotExported(id.to_string()))
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut ExportedObject, HostError> {
        self.devices
            .get_mut(id)
            .ok_or_else(|| HostError::DeviceNotFound(id.to_string()))?
            .exported_mut()
            .ok_or_else(|| HostError::NotExported(id.to_string()))
    }

    /// Executes one protocol request.
    pub fn handle_request(&mut self, request: Request) -> Response {
        self.stats.requests_handled = self.stats.requests_handled.saturating_add(1);
        let id = request.id;

        let result = match request.request_type {
            RequestType::Ping => Ok(Some(json!("pong"))),

            RequestType::CreateDevice { config } => {
                info!("Creating virtual {} {}", config.device, config.id);
                self.create_device(config).and_then(|device| match device.last_error() {
                    Some(e) if device.state() == NameClaimState::Failed => {
                        Err(HostError::Device(e.clone()))
                    }
                    _ => Ok(Some(json!({
                        "state": device.state(),
                        "status": device.status(),
                        "service_name": device.identity().map(|i| i.service_name().to_string()),
                    }))),
                })
            }

            RequestType::CloseDevice { device } => self.close_device(&device).map(|_| None),

            RequestType::ListDevices => Ok(Some(json!({
                "devices": self.summaries(),
                "stats": self.stats,
            }))),

            RequestType::Describe { device } => self.object(&device).map(|object| {
                Some(json!({
                    "ownership": object.ownership,
                    "descriptor": object.descriptor,
                    "values": object.store,
                }))
            }),

            RequestType::GetValue { device, path } => {
                self.get_value(&device, &path).map(|value| Some(json!(value)))
            }

            RequestType::GetText { device, path } => {
                self.get_text(&device, &path).map(|text| Some(json!(text)))
            }

            RequestType::SetValue { device, path, value } => {
                self.set_value(&device, &path, value).map(|_| None)
            }

            RequestType::Publish { device, path, value } => {
                self.publish(&device, &path, value).map(|_| None)
            }
        };

        match result {
            Ok(payload) => self.protocol.create_response(id, ResponseStatus::Success, None, payload),
            Err(e) => {
                let status = match &e {
                    HostError::DeviceNotFound(_)
                    | HostError::Store(StoreError::UnknownProperty(_)) => ResponseStatus::NotFound,
                    HostError::DuplicateDevice(_)
                    | HostError::Store(StoreError::TypeMismatch { .. }) => ResponseStatus::InvalidRequest,
                    HostError::NotExported(_) | HostError::Device(_) => ResponseStatus::Error,
                };
                self.protocol
                    .create_error_response(id, status, &e.to_string())
            }
        }
    }
}
