//! # Venus Virtual Devices
//!
//! Software-defined energy devices for a Venus-style device bus. Each virtual
//! device claims a `com.victronenergy.<kind>.virtual_<id>` service name and
//! exports the same property surface a real grid meter, heat pump, weather
//! station, tank or temperature sensor would, so other processes can read and
//! write the standard paths as if the hardware were present.
//!
//! ## Features
//!
//! - **Declarative schemas**: one property table per device kind, with wire
//!   types, defaults, advisory ranges and display formats
//! - **Interface export**: descriptor and live-value store built per instance
//! - **Phase expansion**: grid meters grow `Ac/L<n>/...` paths for each configured phase
//! - **Name claim state machine**: D-Bus style reply codes mapped to owned, shared or failed
//! - **Loopback bus**: in-process bus with name registry, settings and change signals
//!
//! ## Quick Start
//!
//! ```rust
//! use venus_virtual::{DeviceConfig, DeviceHost, DeviceKind, LocalBus, Value};
//!
//! let bus = LocalBus::new();
//! let mut host = DeviceHost::new(bus.clone());
//!
//! let config = DeviceConfig::new("meter1", DeviceKind::Grid).with_phases(3);
//! host.create_device(config).unwrap();
//!
//! host.publish("meter1", "Ac/L1/Power", Value::Double(230.0)).unwrap();
//! assert_eq!(host.get_text("meter1", "Ac/L1/Power").unwrap(), "230.00W");
//! ```
//!
//! ## Architecture
//!
//! - [`devices`] - Device kinds and their property schemas
//! - [`format`] - Display rules for property values
//! - [`interface`] - Interface descriptor and live-value store
//! - [`identity`] - Service name and object path derivation
//! - [`naming`] - Name request flags, reply codes and claim states
//! - [`device`] - The per-instance claim state machine and export sequence
//! - [`bus`] - Bus collaborator traits and the loopback bus
//! - [`host`] - Multi-device host and request dispatch
//! - [`protocol`] - JSON-lines request/response protocol

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod bus;
pub mod config;
pub mod device;
pub mod devices;
pub mod error;
pub mod format;
pub mod host;
pub mod identity;
pub mod interface;
pub mod naming;
pub mod protocol;
pub mod status;

// Re-export main public types for convenience
pub use bus::{BusConnection, ChangeEmitter, LocalBus};
pub use config::{BusAddress, ConfigValue, DeviceConfig};
pub use device::{ClaimOutcome, ExportedObject, VirtualDevice};
pub use devices::{DeviceKind, PropertySpec, Value, WireType};
pub use format::Format;
pub use host::DeviceHost;
pub use identity::ServiceIdentity;
pub use interface::{InterfaceDescriptor, LiveValueStore};
pub use naming::{NameClaimState, Ownership};
pub use status::NodeStatus;
