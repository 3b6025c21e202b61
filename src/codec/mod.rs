//! Request codec for the remote query/mutation protocol.
//!
//! # Data Flow
//! ```text
//! Operation (name, kind, typed arguments, selection)
//!     → request.rs encode → RemoteRequest (GraphQL document)
//!     → to_wire() → {"query": "..."} → transport
//! raw response string
//!     → response.rs decode → RemoteResponse { data, errors }
//!     → into_field(name) → value | RemoteApplication error
//! ```
//!
//! # Design Decisions
//! - Arguments are typed; strings are escaped, never interpolated raw
//! - Composite values travel as JSON embedded in a string literal
//! - A non-empty `errors` list always means failure, whatever `data` holds
//! - Unparsable payloads are a `DecodeError`, never an empty success

pub mod request;
pub mod response;

pub use request::{encode, Argument, EncodeError, Operation, OperationKind, RemoteRequest};
pub use response::{decode, DecodeError, RemoteResponse};
