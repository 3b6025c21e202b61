//! Crate-wide error type for remote operations.

use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::transport::TransportError;

/// Errors that can occur while executing a remote operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// No live session or no resolved application handle.
    #[error("not connected: {0}")]
    NotConnected(&'static str),

    /// Network or IO failure; retrying may help.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The remote application reported errors.
    #[error("remote application error: {}", .0.join("; "))]
    RemoteApplication(Vec<String>),

    /// Response payload could not be interpreted.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Request could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl SyncError {
    /// Short label used in metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::NotConnected(_) => "not_connected",
            SyncError::Transport(_) => "transport",
            SyncError::RemoteApplication(_) => "remote_application",
            SyncError::Decode(_) => "decode",
            SyncError::Encode(_) => "encode",
        }
    }
}

/// Result type for remote operations.
pub type SyncResult<T> = Result<T, SyncError>;
