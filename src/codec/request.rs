//! Operation encoding.

use std::fmt::Write;

use thiserror::Error;

/// Remote operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only.
    Query,
    /// State-changing.
    Mutation,
    /// Push stream; only used for notifications.
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// Typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Unsigned integer, emitted unquoted.
    Int(u64),
    /// Boolean, emitted unquoted.
    Bool(bool),
    /// String, emitted as an escaped string literal.
    Str(String),
    /// Composite value, serialized to JSON and emitted as a string literal.
    Json(serde_json::Value),
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::Str(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::Str(s)
    }
}

impl From<u64> for Argument {
    fn from(n: u64) -> Self {
        Argument::Int(n)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Argument::Bool(b)
    }
}

/// Errors raised while encoding a request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EncodeError {
    /// Operation, argument, alias or selection name is not a plain identifier.
    #[error("invalid name '{0}'")]
    InvalidName(String),

    /// Operation carries no fields.
    #[error("operation has no fields")]
    Empty,

    /// Composite argument could not be serialized.
    #[error("failed to serialize argument: {0}")]
    Serialize(String),
}

/// One remote field invocation, possibly aliased.
#[derive(Debug, Clone, PartialEq)]
struct Field {
    alias: Option<String>,
    name: String,
    args: Vec<(String, Argument)>,
    selection: Vec<String>,
}

/// A remote operation before encoding.
///
/// Usually holds a single field; batched reads add more through [`Operation::aliased`].
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    fields: Vec<Field>,
}

impl Operation {
    pub fn query(name: &str) -> Self {
        Self::new(OperationKind::Query, name)
    }

    pub fn mutation(name: &str) -> Self {
        Self::new(OperationKind::Mutation, name)
    }

    /// Start an operation with no fields; add them with [`Operation::aliased`].
    pub fn batch(kind: OperationKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    pub fn new(kind: OperationKind, name: &str) -> Self {
        Self {
            kind,
            fields: vec![Field {
                alias: None,
                name: name.to_string(),
                args: Vec::new(),
                selection: Vec::new(),
            }],
        }
    }

    /// Add an argument to the most recent field.
    pub fn arg(mut self, name: &str, value: impl Into<Argument>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.args.push((name.to_string(), value.into()));
        }
        self
    }

    /// Set the selection set of the most recent field.
    pub fn select(mut self, fields: &[&str]) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.selection = fields.iter().map(|f| f.to_string()).collect();
        }
        self
    }

    /// Append another field under `alias`.
    pub fn aliased(mut self, alias: &str, name: &str) -> Self {
        self.fields.push(Field {
            alias: Some(alias.to_string()),
            name: name.to_string(),
            args: Vec::new(),
            selection: Vec::new(),
        });
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Name of the first field; used for logging and metrics.
    pub fn name(&self) -> &str {
        self.fields.first().map(|f| f.name.as_str()).unwrap_or_default()
    }
}

/// Encoded request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub kind: OperationKind,
    /// GraphQL document.
    pub body: String,
}

impl RemoteRequest {
    /// Wire payload: `{"query": "<document>"}`.
    pub fn to_wire(&self) -> String {
        serde_json::json!({ "query": self.body }).to_string()
    }
}

/// Encode an operation into a request document.
pub fn encode(operation: &Operation) -> Result<RemoteRequest, EncodeError> {
    if operation.fields.is_empty() {
        return Err(EncodeError::Empty);
    }
    let mut body = String::new();
    body.push_str(operation.kind.as_str());
    body.push_str(" {");

    for field in &operation.fields {
        body.push(' ');
        if let Some(alias) = &field.alias {
            check_name(alias)?;
            body.push_str(alias);
            body.push_str(": ");
        }
        check_name(&field.name)?;
        body.push_str(&field.name);

        if !field.args.is_empty() {
            body.push('(');
            for (i, (name, value)) in field.args.iter().enumerate() {
                check_name(name)?;
                if i > 0 {
                    body.push_str(", ");
                }
                body.push_str(name);
                body.push_str(": ");
                write_value(&mut body, value)?;
            }
            body.push(')');
        }

        if !field.selection.is_empty() {
            body.push_str(" {");
            for name in &field.selection {
                check_name(name)?;
                body.push(' ');
                body.push_str(name);
            }
            body.push_str(" }");
        }
    }

    body.push_str(" }");
    Ok(RemoteRequest {
        kind: operation.kind,
        body,
    })
}

fn write_value(out: &mut String, value: &Argument) -> Result<(), EncodeError> {
    match value {
        Argument::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        Argument::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Argument::Str(s) => out.push_str(&quote(s)?),
        Argument::Json(v) => {
            let json = serde_json::to_string(v).map_err(|e| EncodeError::Serialize(e.to_string()))?;
            out.push_str(&quote(&json)?);
        }
    }
    Ok(())
}

/// JSON string escaping is valid GraphQL string-literal escaping.
fn quote(s: &str) -> Result<String, EncodeError> {
    serde_json::to_string(s).map_err(|e| EncodeError::Serialize(e.to_string()))
}

fn check_name(name: &str) -> Result<(), EncodeError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(EncodeError::InvalidName(name.to_string()))
    }
}
