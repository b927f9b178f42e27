use crate::config::DeviceConfig;
use crate::devices::Value;
use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_REQUEST_SIZE: usize = 4096;
pub const MAX_RESPONSE_SIZE: usize = 65536;

pub type RequestBuffer = ArrayString<MAX_REQUEST_SIZE>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u32,
    pub request_type: RequestType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestType {
    Ping,
    CreateDevice { config: DeviceConfig },
    CloseDevice { device: String },
    ListDevices,
    Describe { device: String },
    GetValue { device: String, path: String },
    GetText { device: String, path: String },
    /// Write from a bus client; type-checked, no change signal.
    SetValue { device: String, path: String, value: Value },
    /// Host-side update; emits a change signal.
    Publish { device: String, path: String, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
    NotFound,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u32,
    pub status: ResponseStatus,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Message exceeds buffer size")]
    MessageTooLarge,
    #[error("Serialization failed")]
    SerializationError,
}

/// Parses requests and renders responses for the JSON-lines protocol.
#[derive(Debug)]
pub struct ProtocolHandler {
    request_counter: u32,
    request_buffer: RequestBuffer,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self {
            request_counter: 0,
            request_buffer: ArrayString::new(),
        }
    }

    pub fn parse_request(&mut self, json_str: &str) -> Result<Request, ProtocolError> {
        self.request_buffer.clear();
        self.request_buffer
            .try_push_str(json_str.trim())
            .map_err(|_| ProtocolError::MessageTooLarge)?;

        serde_json::from_str::<Request>(&self.request_buffer).map_err(|_| ProtocolError::InvalidJson)
    }

    pub fn serialize_request(&self, request: &Request) -> Result<String, ProtocolError> {
        let json_str = serde_json::to_string(request).map_err(|_| ProtocolError::SerializationError)?;
        if json_str.len() > MAX_REQUEST_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        Ok(json_str)
    }

    pub fn parse_response(&self, json_str: &str) -> Result<Response, ProtocolError> {
        if json_str.len() > MAX_RESPONSE_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        serde_json::from_str::<Response>(json_str.trim()).map_err(|_| ProtocolError::InvalidJson)
    }

    pub fn serialize_response(&self, response: &Response) -> Result<String, ProtocolError> {
        let json_str = serde_json::to_string(response).map_err(|_| ProtocolError::SerializationError)?;
        if json_str.len() > MAX_RESPONSE_SIZE {
            return Err(ProtocolError::MessageTooLarge);
        }
        Ok(json_str)
    }

    pub fn create_response(
        &self,
        request_id: u32,
        status: ResponseStatus,
        message: Option<&str>,
        payload: Option<serde_json::Value>,
    ) -> Response {
        Response {
            id: request_id,
            status,
            message: message.map(str::to_string),
            payload,
        }
    }

    pub fn create_error_response(&self, request_id: u32, status: ResponseStatus, reason: &str) -> Response {
        self.create_response(request_id, status, Some(reason), None)
    }

    pub fn next_request_id(&mut self) -> u32 {
        self.request_counter = self.request_counter.wrapping_add(1);
        self.request_counter
    }
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}
