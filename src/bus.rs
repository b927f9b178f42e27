//! Bus collaborators and an in-process loopback bus.
//!
//! The device core only talks to a [`BusConnection`]. [`LocalBus`] keeps the
//! name registry, exported objects and settings in memory, answering name
//! requests with the same reply codes a D-Bus daemon uses.

use crate::devices::{SettingSpec, Value};
use crate::error::TransportError;
use crate::identity::SETTINGS_SERVICE;
use crate::interface::{InterfaceDescriptor, LiveValueStore};
use crate::naming::{
    DBUS_NAME_FLAG_DO_NOT_QUEUE, REQUEST_NAME_REPLY_ALREADY_OWNER, REQUEST_NAME_REPLY_EXISTS,
    REQUEST_NAME_REPLY_IN_QUEUE, REQUEST_NAME_REPLY_PRIMARY_OWNER,
};
use heapless::Deque;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};

const SIGNAL_BROADCAST_BUFFER_SIZE: usize = 256;
const MAX_RECENT_SIGNALS: usize = 32;

/// Change notification hook handed back by the exporter.
pub trait ChangeEmitter: Send + core::fmt::Debug {
    fn items_changed(&self, path: &str, value: &Value, text: &str);
}

/// Emitter used before an object is exported.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl ChangeEmitter for NoopEmitter {
    fn items_changed(&self, _path: &str, _value: &Value, _text: &str) {}
}

/// One connection to the device bus.
pub trait BusConnection: Send + core::fmt::Debug {
    /// Returns the daemon's reply code for the request.
    fn request_name(&mut self, name: &str, flags: u32) -> Result<u32, TransportError>;

    fn export_interface(
        &mut self,
        object_path: &str,
        descriptor: &InterfaceDescriptor,
        store: &LiveValueStore,
    ) -> Result<Box<dyn ChangeEmitter>, TransportError>;

    fn add_settings(&mut self, settings: &[SettingSpec]) -> Result<(), TransportError>;

    /// Drops owned names and exported objects.
    fn release(&mut self);
}

/// Opens bus connections for new devices.
pub trait Connector {
    fn connect(&self) -> Box<dyn BusConnection>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsChanged {
    pub object_path: String,
    pub property: String,
    pub value: Value,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOwner {
    SettingsService,
    Connection(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingEntry {
    pub value: i32,
    pub default: i32,
    pub min: i32,
    pub max: i32,
}

#[derive(Debug)]
struct ExportedEntry {
    descriptor: InterfaceDescriptor,
    property_count: usize,
}

#[derive(Debug)]
struct BusState {
    next_connection: u64,
    names: HashMap<String, NameOwner>,
    objects: BTreeMap<(u64, String), ExportedEntry>,
    settings: BTreeMap<String, SettingEntry>,
    recent_signals: Deque<ItemsChanged, MAX_RECENT_SIGNALS>,
}

/// In-process device bus.
#[derive(Debug, Clone)]
pub struct LocalBus {
    state: Arc<Mutex<BusState>>,
    signals: broadcast::Sender<ItemsChanged>,
}

impl LocalBus {
    pub fn new() -> Self {
        let mut names = HashMap::new();
        // The settings service is always present on a GX bus
        names.insert(SETTINGS_SERVICE.to_string(), NameOwner::SettingsService);

        let (signals, _) = broadcast::channel(SIGNAL_BROADCAST_BUFFER_SIZE);

        Self {
            state: Arc::new(Mutex::new(BusState {
                next_connection: 1,
                names,
                objects: BTreeMap::new(),
                settings: BTreeMap::new(),
                recent_signals: Deque::new(),
            })),
            signals,
        }
    }

    pub fn open(&self) -> LocalConnection {
        let id = {
            let mut state = self.lock();
            let id = state.next_connection;
            state.next_connection = state.next_connection.wrapping_add(1);
            id
        };
        debug!("Bus connection {} opened", id);

        LocalConnection {
            id,
            bus: self.clone(),
            owned_names: Vec::new(),
            exported_paths: Vec::new(),
            failure: None,
        }
    }

    /// Connection whose every request fails with `error`.
    pub fn open_failing(&self, error: TransportError) -> LocalConnection {
        let mut connection = self.open();
        connection.failure = Some(error);
        connection
    }

    pub fn name_owner(&self, name: &str) -> Option<NameOwner> {
        self.lock().names.get(name).copied()
    }

    pub fn exported_paths(&self) -> Vec<String> {
        self.lock().objects.keys().map(|(_, path)| path.clone()).collect()
    }

    pub fn exported_descriptor(&self, object_path: &str) -> Option<InterfaceDescriptor> {
        self.lock()
            .objects
            .iter()
            .find(|((_, path), _)| path == object_path)
            .map(|(_, entry)| entry.descriptor.clone())
    }

    pub fn exported_property_count(&self, object_path: &str) -> Option<usize> {
        self.lock()
            .objects
            .iter()
            .find(|((_, path), _)| path == object_path)
            .map(|(_, entry)| entry.property_count)
    }

    pub fn setting(&self, path: &str) -> Option<SettingEntry> {
        self.lock().settings.get(path).cloned()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemsChanged> {
        self.signals.subscribe()
    }

    pub fn recent_signals(&self) -> Vec<ItemsChanged> {
        self.lock().recent_signals.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        // Poisoned only if an emitter panicked mid-insert; the maps are still usable
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn emit(&self, signal: ItemsChanged) {
        {
            let mut state = self.lock();
            if state.recent_signals.is_full() {
                state.recent_signals.pop_front();
            }
            let _ = state.recent_signals.push_back(signal.clone());
        }
        // No subscribers is fine
        let _ = self.signals.send(signal);
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for LocalBus {
    fn connect(&self) -> Box<dyn BusConnection> {
        Box::new(self.open())
    }
}

#[derive(Debug)]
pub struct LocalConnection {
    id: u64,
    bus: LocalBus,
    owned_names: Vec<String>,
    exported_paths: Vec<String>,
    failure: Option<TransportError>,
}

impl LocalConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn check(&self) -> Result<(), TransportError> {
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl BusConnection for LocalConnection {
    fn request_name(&mut self, name: &str, flags: u32) -> Result<u32, TransportError> {
        self.check()?;

        let mut state = self.bus.lock();
        let code = match state.names.get(name).copied() {
            None => {
                state.names.insert(name.to_string(), NameOwner::Connection(self.id));
                self.owned_names.push(name.to_string());
                REQUEST_NAME_REPLY_PRIMARY_OWNER
            }
            Some(NameOwner::Connection(owner)) if owner == self.id => REQUEST_NAME_REPLY_ALREADY_OWNER,
            Some(_) if flags & DBUS_NAME_FLAG_DO_NOT_QUEUE != 0 => REQUEST_NAME_REPLY_EXISTS,
            Some(_) => REQUEST_NAME_REPLY_IN_QUEUE,
        };

        debug!("Connection {} requested {} -> {}", self.id, name, code);
        Ok(code)
    }

    fn export_interface(
        &mut self,
        object_path: &str,
        descriptor: &InterfaceDescriptor,
        store: &LiveValueStore,
    ) -> Result<Box<dyn ChangeEmitter>, TransportError> {
        self.check()?;

        self.bus.lock().objects.insert(
            (self.id, object_path.to_string()),
            ExportedEntry {
                descriptor: descriptor.clone(),
                property_count: store.len(),
            },
        );
        self.exported_paths.push(object_path.to_string());
        info!("Exported {} ({} properties)", object_path, descriptor.len());

        Ok(Box::new(LocalEmitter {
            bus: self.bus.clone(),
            object_path: object_path.to_string(),
        }))
    }

    fn add_settings(&mut self, settings: &[SettingSpec]) -> Result<(), TransportError> {
        self.check()?;

        let mut state = self.bus.lock();
        for setting in settings {
            // Existing settings keep their persisted value
            state
                .settings
                .entry(setting.path.to_string())
                .or_insert(SettingEntry {
                    value: setting.default,
                    default: setting.default,
                    min: setting.min,
                    max: setting.max,
                });
        }
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.bus.lock();
        for name in self.owned_names.drain(..) {
            state.names.remove(&name);
        }
        for path in self.exported_paths.drain(..) {
            state.objects.remove(&(self.id, path));
        }
        debug!("Bus connection {} released", self.id);
    }
}

#[derive(Debug)]
struct LocalEmitter {
    bus: LocalBus,
    object_path: String,
}

impl ChangeEmitter for LocalEmitter {
    fn items_changed(&self, path: &str, value: &Value, text: &str) {
        self.bus.emit(ItemsChanged {
            object_path: self.object_path.clone(),
            property: path.to_string(),
            value: value.clone(),
            text: text.to_string(),
        });
    }
}
