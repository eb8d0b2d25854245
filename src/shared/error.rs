use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hap::ServiceType;
use crate::identity::ServiceIdentity;
use crate::validators::ValidationError;

/// Failure to convert a raw report value into a protocol-native value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Cannot convert field '{field}' value {input:?}: {reason}")]
pub struct ParseError {
    /// Report field the value came from
    pub field: String,
    /// Raw input as received
    pub input: String,
    /// Why the conversion failed
    pub reason: ParseFailure,
}

/// Reason a conversion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no numeric value found")]
    NotNumeric,

    #[error("value is not a recognised flag")]
    NotAFlag,

    #[error("value is outside the accepted range")]
    OutOfRange,
}

impl ParseError {
    pub fn new(field: impl Into<String>, input: impl Into<String>, reason: ParseFailure) -> Self {
        Self {
            field: field.into(),
            input: input.into(),
            reason,
        }
    }

    /// Stable machine-readable code for this failure
    pub fn code(&self) -> &'static str {
        match self.reason {
            ParseFailure::OutOfRange => error_codes::OUT_OF_RANGE,
            ParseFailure::NotNumeric | ParseFailure::NotAFlag => error_codes::PARSE_ERROR,
        }
    }
}

/// Errors raised by an accessory-representation host
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("A service with identity {0} is already attached")]
    DuplicateIdentity(ServiceIdentity),

    #[error("Service handle {0} does not exist on this accessory")]
    UnknownService(usize),

    #[error("Accessory has no information service")]
    MissingInformationService,
}

/// Top-level error type for the synchronization layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Two distinct service names resolved to one identity. Fatal configuration defect.
    #[error("Identity {identity} already belongs to service '{existing}', refusing to alias '{requested}'")]
    IdentityCollision {
        identity: ServiceIdentity,
        existing: String,
        requested: String,
    },

    /// The service registered under this name is of another kind
    #[error("Service '{name}' is a {existing:?}, refusing to reuse it as a {requested:?}")]
    KindMismatch {
        name: String,
        existing: ServiceType,
        requested: ServiceType,
    },

    #[error(transparent)]
    InvalidServiceName(#[from] ValidationError),

    /// Report field with no mapping. Ignored by the dispatcher.
    #[error("Report field '{0}' has no mapping")]
    UnmappedField(String),

    #[error("Accessory host error: {0}")]
    Host(#[from] HostError),
}

/// Per-field failure surfaced by the dispatcher
/// Contains the report field, a stable error code, and a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    /// Report field that failed (e.g., "humidity")
    pub field: String,

    /// Stable machine-readable error code (e.g., "PARSE_ERROR")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl FieldFailure {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&ParseError> for FieldFailure {
    fn from(err: &ParseError) -> Self {
        Self::new(err.field.clone(), err.code(), err.to_string())
    }
}

impl FieldFailure {
    /// Build a failure record for a host error raised while writing `field`
    pub fn host(field: impl Into<String>, err: &HostError) -> Self {
        Self::new(field, error_codes::HOST_ERROR, err.to_string())
    }
}

/// Error codes used in field failure records
pub mod error_codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const OUT_OF_RANGE: &str = "OUT_OF_RANGE";
    pub const HOST_ERROR: &str = "HOST_ERROR";
}
