//! Binary formats backing the codec engine.
//!
//! Provides [`encode`] and [`decode`] functions that convert between
//! serde-serializable types and byte buffers. Bincode is always available;
//! RON is feature-gated behind `serialize-ron`.

use serde::{Deserialize, Serialize};

use crate::error::{DeserializeError, InitError, SerializeError};

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Bincode: compact binary format.
    #[default]
    Bincode,
    /// RON (Rusty Object Notation): human-readable text format.
    #[cfg(feature = "serialize-ron")]
    Ron,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bincode => "bincode",
            #[cfg(feature = "serialize-ron")]
            Self::Ron => "ron",
        }
    }

    /// Look up a format by its configuration name.
    pub fn from_name(name: &str) -> Result<Self, InitError> {
        match name.to_ascii_lowercase().as_str() {
            "bincode" => Ok(Self::Bincode),
            #[cfg(feature = "serialize-ron")]
            "ron" => Ok(Self::Ron),
            #[cfg(not(feature = "serialize-ron"))]
            "ron" => Err(InitError::FormatUnavailable {
                name: "ron",
                feature: "serialize-ron",
            }),
            _ => Err(InitError::UnknownFormat {
                name: name.to_owned(),
            }),
        }
    }
}

/// Encode a serde-serializable value to bytes in the given format.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<Vec<u8>, SerializeError> {
    match format {
        Format::Bincode => {
            bincode::serialize(value).map_err(|e| SerializeError::FormatError(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| SerializeError::FormatError(e.to_string())),
    }
}

/// Decode bytes in the given format to a serde-deserializable type.
pub fn decode<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
    format: Format,
) -> Result<T, DeserializeError> {
    match format {
        Format::Bincode => {
            bincode::deserialize(bytes).map_err(|e| DeserializeError::FormatError(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| DeserializeError::FormatError(e.to_string()))?;
            ron::from_str(s).map_err(|e| DeserializeError::FormatError(e.to_string()))
        }
    }
}
