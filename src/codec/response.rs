//! Response decoding.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::SyncError;

/// Errors raised while decoding a response payload.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    /// Payload is not valid JSON or not a response object.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A field had an unexpected shape.
    #[error("unexpected value for field '{field}': {reason}")]
    Field { field: String, reason: String },
}

/// Decoded response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteResponse {
    pub data: Option<Map<String, Value>>,
    pub errors: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireError {
    Message { message: String },
    Text(String),
    Other(Value),
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Option<Vec<WireError>>,
}

/// Decode a raw response payload.
pub fn decode(raw: &str) -> Result<RemoteResponse, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::Malformed("expected a JSON object".to_string()));
    }
    let wire: WireResponse =
        serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let errors = wire
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| match e {
            WireError::Message { message } => message,
            WireError::Text(text) => text,
            WireError::Other(value) => value.to_string(),
        })
        .collect();
    Ok(RemoteResponse {
        data: wire.data,
        errors,
    })
}

impl RemoteResponse {
    /// True when the remote side reported no errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Extract a named data field.
    ///
    /// Any error message turns the whole response into a failure. A missing
    /// field or absent `data` yields `Value::Null`.
    pub fn into_field(self, name: &str) -> Result<Value, SyncError> {
        if !self.errors.is_empty() {
            return Err(SyncError::RemoteApplication(self.errors));
        }
        Ok(self
            .data
            .and_then(|mut data| data.remove(name))
            .unwrap_or(Value::Null))
    }

    /// Check the error list only; used for mutations whose data is not read.
    pub fn into_unit(self) -> Result<(), SyncError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::RemoteApplication(self.errors))
        }
    }
}
