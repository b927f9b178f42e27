use crate::bus::BusConnection;
use crate::config::DeviceConfig;
use crate::devices::{DeviceKind, Value};
use crate::error::{DeviceError, StoreError, TransportError};
use crate::identity::ServiceIdentity;
use crate::interface::{InstanceOverrides, InterfaceDescriptor, LiveValueStore};
use crate::naming::{interpret_reply, NameClaimState, NameRequest, Ownership};
use crate::status::NodeStatus;
use tracing::{debug, info, warn};

/// Descriptor and live values of an exported device.
#[derive(Debug)]
pub struct ExportedObject {
    pub descriptor: InterfaceDescriptor,
    pub store: LiveValueStore,
    pub ownership: Ownership,
}

impl ExportedObject {
    /// Builds the descriptor and store for `config` and runs the kind's expansion hook.
    pub fn assemble(config: &DeviceConfig, ownership: Ownership) -> Self {
        let kind = &config.device;
        let overrides =
            InstanceOverrides::for_kind(kind, config.device_instance(), config.name.as_deref());

        let mut descriptor = InterfaceDescriptor::build(kind);
        let mut store = LiveValueStore::init(kind, &overrides);
        if let Some(expand) = kind.expansion_hook() {
            expand(&mut descriptor, &mut store, config);
        }

        debug_assert!(
            descriptor.keys().eq(store.keys()),
            "descriptor and store of {} disagree on property names",
            kind
        );

        Self {
            descriptor,
            store,
            ownership,
        }
    }

    pub fn get(&self, path: &str) -> Result<&Value, StoreError> {
        self.store
            .get(path)
            .ok_or_else(|| StoreError::UnknownProperty(path.to_string()))
    }

    pub fn text(&self, path: &str) -> Result<String, StoreError> {
        self.get(path)
            .map(|value| self.descriptor.format_value(path, value))
    }

    pub fn set(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store.set(path, value)
    }

    pub fn publish(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        self.store.publish(&self.descriptor, path, value)
    }
}

/// Result of feeding a name-request reply into a device.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Exported(Ownership),
    Failed(DeviceError),
    /// The device was closed while the request was in flight.
    Abandoned,
    /// The device was not waiting for a reply.
    Ignored,
}

/// One virtual device instance and its name-claim state machine.
///
/// `Idle -> Requesting -> {Owned, Shared, Failed}`, with `Closed` reachable
/// from every state.
#[derive(Debug)]
pub struct VirtualDevice {
    config: DeviceConfig,
    identity: Result<ServiceIdentity, DeviceError>,
    state: NameClaimState,
    status: NodeStatus,
    connection: Option<Box<dyn BusConnection>>,
    exported: Option<ExportedObject>,
    last_error: Option<DeviceError>,
}

impl VirtualDevice {
    pub fn new(config: DeviceConfig, connection: Box<dyn BusConnection>) -> Self {
        let identity = ServiceIdentity::new(&config.device, &config.id).map_err(DeviceError::from);

        Self {
            config,
            identity,
            state: NameClaimState::Idle,
            status: NodeStatus::idle(),
            connection: Some(connection),
            exported: None,
            last_error: None,
        }
    }

    /// Starts the claim and returns the request to put on the bus.
    pub fn begin_claim(&mut self) -> Result<NameRequest, DeviceError> {
        if self.state != NameClaimState::Idle {
            return Err(DeviceError::InvalidState(self.state.as_str()));
        }

        let identity = match self.identity.clone() {
            Ok(identity) => identity,
            Err(e) => {
                self.fail(e.clone());
                return Err(e);
            }
        };

        self.state = NameClaimState::Requesting;
        self.status = NodeStatus::pending(format!("Requesting {}", identity.service_name()));
        info!("Requesting service name {} for {}", identity.service_name(), self.config.device);

        Ok(NameRequest::new(identity.bus_name()))
    }

    /// Handles the reply to the request issued by [`VirtualDevice::begin_claim`].
    pub fn complete_claim(&mut self, reply: Result<u32, TransportError>) -> ClaimOutcome {
        match self.state {
            NameClaimState::Requesting => {}
            NameClaimState::Closed => {
                debug!("Device {} closed before its name reply arrived", self.config.id);
                return ClaimOutcome::Abandoned;
            }
            other => {
                warn!("Unexpected name reply for {} while {}", self.config.id, other.as_str());
                return ClaimOutcome::Ignored;
            }
        }

        let result = interpret_reply(reply).and_then(|ownership| {
            self.export(ownership)?;
            Ok(ownership)
        });

        match result {
            Ok(ownership) => ClaimOutcome::Exported(ownership),
            Err(e) => {
                self.fail(e.clone());
                ClaimOutcome::Failed(e)
            }
        }
    }

    /// Runs a complete claim against the device's own connection.
    pub fn claim(&mut self) -> ClaimOutcome {
        let request = match self.begin_claim() {
            Ok(request) => request,
            Err(e) => return ClaimOutcome::Failed(e),
        };

        let reply = match self.connection.as_mut() {
            Some(connection) => connection.request_name(&request.service_name, request.flags),
            None => Err(TransportError::Disconnected),
        };

        self.complete_claim(reply)
    }

    fn export(&mut self, ownership: Ownership) -> Result<(), DeviceError> {
        let identity = self.identity.clone()?;
        let connection = self
            .connection
            .as_mut()
            .ok_or(DeviceError::InvalidState("closed"))?;
        let kind = &self.config.device;

        if !kind.is_known() {
            warn!("Unknown device kind '{}', exporting common properties only", kind);
        }

        let mut object = ExportedObject::assemble(&self.config, ownership);
        let emitter = connection
            .export_interface(identity.object_path(), &object.descriptor, &object.store)
            .map_err(DeviceError::Export)?;
        object.store.install_emitter(emitter);

        let settings = kind.settings();
        if !settings.is_empty() {
            connection
                .add_settings(settings)
                .map_err(DeviceError::Export)?;
        }

        self.state = ownership.into();
        self.status = NodeStatus::ok(format!(
            "Virtual {} ({})",
            kind,
            self.config.device_instance()
        ));
        info!(
            "Virtual {} exported at {} ({:?})",
            kind,
            identity.object_path(),
            ownership
        );
        self.exported = Some(object);
        Ok(())
    }

    fn fail(&mut self, error: DeviceError) {
        warn!("Virtual {} {}: {}", self.config.device, self.config.id, error);

        self.status = NodeStatus::error(match &error {
            DeviceError::NameClaimRejected(code) => format!("Dbus errorcode {}", code),
            other => other.to_string(),
        });
        self.state = NameClaimState::Failed;
        self.exported = None;
        self.last_error = Some(error);

        // Nothing of a failed instance stays visible on the bus
        if let Some(mut connection) = self.connection.take() {
            connection.release();
        }
    }

    /// Releases the bus connection. Safe to call in any state.
    pub fn close(&mut self) {
        if self.state == NameClaimState::Closed {
            return;
        }

        if let Some(mut connection) = self.connection.take() {
            connection.release();
        }
        self.exported = None;
        self.state = NameClaimState::Closed;
        self.status = NodeStatus::closed();
        info!("Virtual {} {} closed", self.config.device, self.config.id);
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn kind(&self) -> &DeviceKind {
        &self.config.device
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> NameClaimState {
        self.state
    }

    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    pub fn identity(&self) -> Option<&ServiceIdentity> {
        self.identity.as_ref().ok()
    }

    pub fn last_error(&self) -> Option<&DeviceError> {
        self.last_error.as_ref()
    }

    pub fn exported(&self) -> Option<&ExportedObject> {
        self.exported.as_ref()
    }

    pub fn exported_mut(&mut self) -> Option<&mut ExportedObject> {
        self.exported.as_mut()
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.release();
        }
    }
}
