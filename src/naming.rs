use crate::error::{DeviceError, TransportError};
use crate::identity::BusName;
use serde::Serialize;

/// Fail immediately instead of waiting in the owner queue.
pub const DBUS_NAME_FLAG_DO_NOT_QUEUE: u32 = 0x4;

pub const REQUEST_NAME_REPLY_PRIMARY_OWNER: u32 = 1;
pub const REQUEST_NAME_REPLY_IN_QUEUE: u32 = 2;
pub const REQUEST_NAME_REPLY_EXISTS: u32 = 3;
pub const REQUEST_NAME_REPLY_ALREADY_OWNER: u32 = 4;

/// Progress of a device's bus-name claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameClaimState {
    Idle,
    Requesting,
    Owned,
    Shared,
    Failed,
    Closed,
}

impl NameClaimState {
    pub fn as_str(self) -> &'static str {
        match self {
            NameClaimState::Idle => "idle",
            NameClaimState::Requesting => "requesting",
            NameClaimState::Owned => "owned",
            NameClaimState::Shared => "shared",
            NameClaimState::Failed => "failed",
            NameClaimState::Closed => "closed",
        }
    }

    pub fn is_exported(self) -> bool {
        matches!(self, NameClaimState::Owned | NameClaimState::Shared)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            NameClaimState::Owned | NameClaimState::Shared | NameClaimState::Failed | NameClaimState::Closed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ownership {
    /// This connection is the primary owner of the name.
    Owned,
    /// Another process already owns the name; the device coexists with it.
    Shared,
}

impl From<Ownership> for NameClaimState {
    fn from(ownership: Ownership) -> Self {
        match ownership {
            Ownership::Owned => NameClaimState::Owned,
            Ownership::Shared => NameClaimState::Shared,
        }
    }
}

/// Name request issued when a claim starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRequest {
    pub service_name: BusName,
    pub flags: u32,
}

impl NameRequest {
    pub fn new(service_name: BusName) -> Self {
        Self {
            service_name,
            flags: DBUS_NAME_FLAG_DO_NOT_QUEUE,
        }
    }
}

/// Maps the transport's answer to a name request onto an ownership outcome.
///
/// Only "primary owner" and "exists" are usable; every other code and every
/// transport error is fatal for the instance.
pub fn interpret_reply(reply: Result<u32, TransportError>) -> Result<Ownership, DeviceError> {
    match reply {
        Ok(REQUEST_NAME_REPLY_PRIMARY_OWNER) => Ok(Ownership::Owned),
        Ok(REQUEST_NAME_REPLY_EXISTS) => Ok(Ownership::Shared),
        Ok(code) => Err(DeviceError::NameClaimRejected(code)),
        Err(e) => Err(DeviceError::NameClaimTransport(e)),
    }
}
