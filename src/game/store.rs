//! Facade core: precondition gate, request execution and outcome handling.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::codec::{self, DecodeError, Operation, RemoteResponse};
use crate::error::{SyncError, SyncResult};
use crate::events::StatusBoard;
use crate::observability::metrics;
use crate::session::SessionSlot;

/// Typed persistence operations against the game application.
///
/// Cheap to clone; every clone observes the same session.
#[derive(Clone)]
pub struct GameStore {
    slot: SessionSlot,
    status: StatusBoard,
}

impl GameStore {
    pub fn new(slot: SessionSlot, status: StatusBoard) -> Self {
        Self { slot, status }
    }

    pub(crate) fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Encode, send and decode one operation.
    ///
    /// Fails with `NotConnected` before anything is encoded or sent when there
    /// is no session or no application handle.
    pub async fn execute(&self, operation: &Operation) -> SyncResult<RemoteResponse> {
        let session = self
            .slot
            .current()
            .ok_or(SyncError::NotConnected("no session"))?;
        let application = session
            .application()
            .cloned()
            .ok_or(SyncError::NotConnected("no application handle"))?;

        let request = codec::encode(operation)?;
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "remote_request",
            operation = operation.name(),
            kind = request.kind.as_str(),
            request_id = %request_id,
            chain_id = %session.id(),
        );

        async move {
            let started = Instant::now();
            let raw = application.query(&request.to_wire()).await;
            metrics::record_request_duration(operation.name(), started.elapsed());
            let response = codec::decode(&raw?)?;
            tracing::debug!(errors = response.errors.len(), "Response decoded");
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Execute and return the operation's own data field.
    pub async fn fetch(&self, operation: &Operation) -> SyncResult<Value> {
        self.execute(operation).await?.into_field(operation.name())
    }

    /// Execute and return the whole data map; used by aliased batch reads.
    pub(crate) async fn fetch_all(&self, operation: &Operation) -> SyncResult<Map<String, Value>> {
        let response = self.execute(operation).await?;
        if !response.errors.is_empty() {
            return Err(SyncError::RemoteApplication(response.errors));
        }
        Ok(response.data.unwrap_or_default())
    }

    /// Read a field and deserialize it; `null` maps to `None`.
    pub(crate) async fn try_read<T: DeserializeOwned>(
        &self,
        operation: &Operation,
    ) -> SyncResult<Option<T>> {
        let value = self.fetch(operation).await?;
        parse_field(operation.name(), value)
    }

    /// Best-effort read: failures are logged and become `None`.
    pub(crate) async fn read<T: DeserializeOwned>(&self, operation: &Operation) -> Option<T> {
        let result = self.try_read(operation).await;
        self.settle(operation, result).flatten()
    }

    /// Best-effort write: `true` when the application accepted the mutation.
    pub(crate) async fn write(&self, operation: &Operation) -> bool {
        let result = match self.execute(operation).await {
            Ok(response) => response.into_unit(),
            Err(e) => Err(e),
        };
        self.settle(operation, result).is_some()
    }

    /// Record the outcome of an operation and reduce it to an option.
    pub(crate) fn settle<T>(&self, operation: &Operation, result: SyncResult<T>) -> Option<T> {
        let name = operation.name();
        let kind = operation.kind().as_str();
        match result {
            Ok(value) => {
                metrics::record_request(name, kind, "ok");
                Some(value)
            }
            Err(e) => {
                metrics::record_request(name, kind, e.kind());
                match &e {
                    SyncError::NotConnected(_) => {
                        tracing::warn!(operation = name, error = %e, "Operation unavailable")
                    }
                    SyncError::RemoteApplication(_) => {
                        tracing::warn!(operation = name, error = %e, "Operation rejected")
                    }
                    _ => tracing::error!(operation = name, error = %e, "Operation failed"),
                }
                None
            }
        }
    }
}

/// Deserialize a field value, mapping `null` to `None`.
pub(crate) fn parse_field<T: DeserializeOwned>(field: &str, value: Value) -> SyncResult<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(|e| {
        SyncError::Decode(DecodeError::Field {
            field: field.to_string(),
            reason: e.to_string(),
        })
    })
}

/// Parse a list that the application stores as an embedded JSON string.
///
/// A plain array is accepted too.
pub(crate) fn parse_embedded_list(field: &str, value: Value) -> SyncResult<Option<Vec<Value>>> {
    let decode_error = |reason: String| {
        SyncError::Decode(DecodeError::Field {
            field: field.to_string(),
            reason,
        })
    };
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => Ok(Some(items)),
        Value::String(json) => match serde_json::from_str::<Value>(&json) {
            Ok(Value::Array(items)) => Ok(Some(items)),
            Ok(other) => Err(decode_error(format!("expected a list, got {}", other))),
            Err(e) => Err(decode_error(e.to_string())),
        },
        other => Err(decode_error(format!("expected a JSON string, got {}", other))),
    }
}
