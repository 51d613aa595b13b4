//! Error types for member persistence.

use std::fmt;

use crate::key::MemberKey;

/// Errors raised while building a [`CodecRegistry`](crate::CodecRegistry).
///
/// Any of these means the codec engine is unusable. Hosts are expected to
/// abort startup instead of continuing without persistence.
#[derive(Debug)]
pub enum InitError {
    /// The configured format name does not match any known format.
    UnknownFormat { name: String },
    /// The format exists but was not compiled in (missing cargo feature).
    FormatUnavailable { name: &'static str, feature: &'static str },
    /// The format failed to round-trip the startup probe.
    ProbeFailed { format: &'static str, message: String },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat { name } => write!(f, "unknown persistence format '{name}'"),
            Self::FormatUnavailable { name, feature } => write!(
                f,
                "persistence format '{name}' is not compiled in (enable feature '{feature}')"
            ),
            Self::ProbeFailed { format, message } => {
                write!(f, "persistence format '{format}' failed startup probe: {message}")
            }
        }
    }
}

impl std::error::Error for InitError {}

/// Errors raised by a member accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The instance handed to the accessor is not of the owning type.
    OwnerMismatch { expected: &'static str },
    /// The value handed to a setter is not of the member's declared type.
    ValueMismatch { member: &'static str, expected: &'static str },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnerMismatch { expected } => {
                write!(f, "accessor invoked on an instance that is not '{expected}'")
            }
            Self::ValueMismatch { member, expected } => {
                write!(f, "value for member '{member}' is not of type '{expected}'")
            }
        }
    }
}

impl std::error::Error for AccessError {}

/// Errors that can occur on the encode path.
#[derive(Debug)]
pub enum SerializeError {
    /// A member value could not be encoded.
    FieldError { field: String, message: String },
    /// A member was read through an accessor that failed.
    Access(AccessError),
    /// The member type has no codec (custom type missing from the resolver).
    Unresolved { type_name: &'static str },
    /// Format encoding error (bincode/RON).
    FormatError(String),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldError { field, message } => {
                write!(f, "failed to serialize field '{field}': {message}")
            }
            Self::Access(e) => write!(f, "{e}"),
            Self::Unresolved { type_name } => {
                write!(f, "no codec registered for custom type '{type_name}'")
            }
            Self::FormatError(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for SerializeError {}

impl From<AccessError> for SerializeError {
    fn from(e: AccessError) -> Self {
        Self::Access(e)
    }
}

/// Errors that can occur while decoding a single member or the envelope.
#[derive(Debug)]
pub enum DeserializeError {
    /// A stored value had an unexpected shape for its member.
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },
    /// The codec produced a value of a different type than declared.
    CodecTypeMismatch { expected: &'static str },
    /// A member was written through an accessor that failed.
    Access(AccessError),
    /// The member type has no codec (custom type missing from the resolver).
    Unresolved { type_name: &'static str },
    /// Format decoding error (corrupt or truncated bytes).
    FormatError(String),
}

impl fmt::Display for DeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "type mismatch for field '{field}': expected {expected}, found {found}"
                )
            }
            Self::CodecTypeMismatch { expected } => {
                write!(f, "codec for '{expected}' produced a value of another type")
            }
            Self::Access(e) => write!(f, "{e}"),
            Self::Unresolved { type_name } => {
                write!(f, "no codec registered for custom type '{type_name}'")
            }
            Self::FormatError(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for DeserializeError {}

impl From<AccessError> for DeserializeError {
    fn from(e: AccessError) -> Self {
        Self::Access(e)
    }
}

/// One failed step of [`apply_bytes`](crate::CodecRegistry::apply_bytes).
///
/// `member` and `key` are `None` when the outer envelope itself could not be
/// decoded.
#[derive(Debug)]
pub struct DecodeFailure {
    /// Name of the type being reconstructed.
    pub owner: &'static str,
    /// Name of the member being written.
    pub member: Option<&'static str>,
    /// The stored key that led to the member.
    pub key: Option<MemberKey>,
    pub error: DeserializeError,
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Some(member) => write!(
                f,
                "failed to deserialize some data from field {}::{member}: {}",
                self.owner, self.error
            ),
            None => write!(
                f,
                "failed to decode persisted data for {}: {}",
                self.owner, self.error
            ),
        }
    }
}

impl std::error::Error for DecodeFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
