//! Outer container for a persisted object.
//!
//! The envelope is the configured format's encoding of a [`FieldMap`]. It
//! carries no version marker: the caller persists the [`WireVersion`] next to
//! the bytes and passes it back on load.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DeserializeError, SerializeError};
use crate::format::{self, Format};
use crate::key::MemberKey;
use crate::value::Value;

/// Stored member values keyed by [`MemberKey`].
pub type FieldMap = BTreeMap<MemberKey, Value>;

/// Selects how stored values are interpreted on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireVersion(pub u32);

impl WireVersion {
    /// Legacy layout: each value is the member value itself.
    pub const INLINE: Self = Self(0);
    /// Each value is the member's own nested encoding.
    pub const NESTED: Self = Self(1);
    /// What [`to_bytes`](crate::CodecRegistry::to_bytes) produces.
    pub const CURRENT: Self = Self::NESTED;

    pub fn is_inline(self) -> bool {
        self.0 == 0
    }
}

impl Default for WireVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl From<u32> for WireVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for WireVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    format: Format,
}

impl Envelope {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn encode(&self, fields: &FieldMap) -> Result<Vec<u8>, SerializeError> {
        format::encode(fields, self.format)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<FieldMap, DeserializeError> {
        format::decode(bytes, self.format)
    }
}
