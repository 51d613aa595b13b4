//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::format::Format;

/// Settings for a [`CodecRegistry`](crate::CodecRegistry).
///
/// Hosts typically deserialize this from their own settings file:
///
/// ```ignore
/// let config: RegistryConfig = ron::from_str("(format: bincode)")?;
/// let registry = CodecRegistry::builder().config(config).build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Binary format for both the envelope and the nested member encodings.
    pub format: Format,
    /// Emit a `trace` record for every stored key the current type no longer
    /// declares.
    pub trace_skipped_keys: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            trace_skipped_keys: true,
        }
    }
}

impl RegistryConfig {
    pub fn with_format(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}
