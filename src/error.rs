use crate::devices::WireType;
use thiserror::Error;

/// Failure reported by the bus transport itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Disconnected,
    #[error("bus refused the request: {0}")]
    Refused(String),
    #[error("transport I/O error: {0}")]
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("device kind is empty")]
    EmptyKind,
    #[error("instance id is empty")]
    EmptyInstanceId,
    #[error("service name is {0} bytes, bus names are limited to 255")]
    NameTooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("could not request service name: {0}")]
    NameClaimTransport(TransportError),
    #[error("name request rejected with return code {0}")]
    NameClaimRejected(u32),
    #[error("invalid service identity: {0}")]
    Identity(#[from] IdentityError),
    #[error("export failed: {0}")]
    Export(TransportError),
    #[error("operation not valid while {0}")]
    InvalidState(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("unknown property {0}")]
    UnknownProperty(String),
    #[error("value for {property} does not fit wire type '{}'", .expected.code())]
    TypeMismatch { property: String, expected: WireType },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("device {0} already exists")]
    DuplicateDevice(String),
    #[error("device {0} not found")]
    DeviceNotFound(String),
    #[error("device {0} has no exported interface")]
    NotExported(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}
