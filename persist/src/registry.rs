//! The codec registry: all process-wide persistence state in one owned object.
//!
//! Build one [`CodecRegistry`] at startup and share it (`&` or `Arc`) with
//! every caller. Its caches only grow; nothing is ever invalidated.

use std::sync::Arc;

use crate::codec::{CodecResolver, CodecStats};
use crate::config::RegistryConfig;
use crate::diagnostics::{DiagnosticsSink, LogSink};
use crate::discovery::MemberDiscovery;
use crate::envelope::{Envelope, FieldMap};
use crate::error::InitError;
use crate::format::{self, Format};
use crate::key::MemberKey;
use crate::member::MemberTable;
use crate::object::Persist;
use crate::resolver::TypeResolver;
use crate::value::Value;

pub struct CodecRegistry {
    pub(crate) config: RegistryConfig,
    pub(crate) discovery: MemberDiscovery,
    pub(crate) codecs: CodecResolver,
    pub(crate) envelope: Envelope,
    pub(crate) diagnostics: Arc<dyn DiagnosticsSink>,
}

impl CodecRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry with the default configuration, no custom types and the
    /// [`LogSink`].
    pub fn new() -> Result<Self, InitError> {
        Self::builder().build()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn format(&self) -> Format {
        self.config.format
    }

    pub fn codecs(&self) -> &CodecResolver {
        &self.codecs
    }

    pub fn discovery(&self) -> &MemberDiscovery {
        &self.discovery
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn stats(&self) -> CodecStats {
        self.codecs.stats()
    }

    /// Member table of `object`'s concrete type; `None` for an absent object.
    pub fn discover(&self, object: Option<&dyn Persist>) -> Option<Arc<MemberTable>> {
        self.discovery.discover(object)
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("config", &self.config)
            .field("types", self.codecs.types())
            .field("stats", &self.codecs.stats())
            .finish()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    config: RegistryConfig,
    types: TypeResolver,
    diagnostics: Option<Arc<dyn DiagnosticsSink>>,
}

impl RegistryBuilder {
    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    /// Custom type resolver shared by every codec the registry specializes.
    pub fn resolver(mut self, types: TypeResolver) -> Self {
        self.types = types;
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Probe the configured format and assemble the registry.
    ///
    /// An error here leaves the host without persistence and should abort
    /// startup.
    pub fn build(self) -> Result<CodecRegistry, InitError> {
        let format = self.config.format;
        probe(format)?;
        log::debug!(
            "codec registry ready: format {}, {} custom types",
            format.name(),
            self.types.len()
        );
        Ok(CodecRegistry {
            config: self.config,
            discovery: MemberDiscovery::new(),
            codecs: CodecResolver::new(format, Arc::new(self.types)),
            envelope: Envelope::new(format),
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(LogSink)),
        })
    }
}

/// Round-trip an envelope with one nested member through `format`.
fn probe(format: Format) -> Result<(), InitError> {
    let failed = |message: String| InitError::ProbeFailed {
        format: format.name(),
        message,
    };
    let nested = format::encode(&u32::MAX, format).map_err(|e| failed(e.to_string()))?;
    let mut fields = FieldMap::new();
    fields.insert(MemberKey::Index(0), Value::Bytes(nested));
    fields.insert(MemberKey::from("probe"), Value::F32(0.5));

    let envelope = Envelope::new(format);
    let bytes = envelope.encode(&fields).map_err(|e| failed(e.to_string()))?;
    let decoded = envelope.decode(&bytes).map_err(|e| failed(e.to_string()))?;
    if decoded != fields {
        return Err(failed("envelope did not round-trip".into()));
    }
    let nested = decoded
        .get(&MemberKey::Index(0))
        .and_then(Value::as_bytes)
        .ok_or_else(|| failed("nested member missing".into()))?;
    let value: u32 = format::decode(nested, format).map_err(|e| failed(e.to_string()))?;
    if value != u32::MAX {
        return Err(failed("nested member did not round-trip".into()));
    }
    Ok(())
}
