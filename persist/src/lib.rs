//! # RedLilium Persist
//!
//! Keyed member persistence: objects declare which members are saved and
//! under which integer and/or string keys, and the [`CodecRegistry`] turns
//! them into versioned binary envelopes and back.
//!
//! ## Core Types
//!
//! - [`Persist`]: Persistable facet, usually derived with `#[derive(Persist)]`
//! - [`MemberDiscovery`] / [`MemberTable`]: Cached per-type member tables
//! - [`CodecResolver`]: Per-type specialized encoders and decoders
//! - [`TypeResolver`]: Custom surrogate codecs for types without serde
//! - [`CodecRegistry`]: `to_bytes` / `apply_bytes` over all of the above
//!
//! ## Wire layout
//!
//! The envelope is the configured [`Format`]'s encoding of a [`FieldMap`].
//! At [`WireVersion::INLINE`] each value is the member value itself; from
//! [`WireVersion::NESTED`] on, each value is that member's own encoding as
//! bytes. The version is not stored in the envelope.
//!
//! ## Loading
//!
//! Unknown keys are skipped. A member that fails to decode is reported to the
//! registry's [`DiagnosticsSink`] and the remaining members still load.
//!
//! ```ignore
//! let registry = CodecRegistry::new()?;
//! let bytes = registry.to_bytes(Some(&turret))?.unwrap_or_default();
//! let report = registry.apply_bytes(Some(&mut restored), &bytes, WireVersion::CURRENT);
//! assert!(report.is_clean());
//! ```

extern crate self as redlilium_persist;

mod codec;
mod config;
mod diagnostics;
mod discovery;
mod envelope;
mod error;
mod field_codec;
pub mod format;
mod key;
mod member;
mod object;
mod registry;
mod resolver;
pub mod value;

pub use codec::{CodecResolver, CodecStats, DecodeFn, EncodeFn, Recipe, ValueType};
pub use config::RegistryConfig;
pub use diagnostics::{CollectingSink, DecodeReport, DiagnosticsSink, LogSink};
pub use discovery::MemberDiscovery;
pub use envelope::{Envelope, FieldMap, WireVersion};
pub use error::{AccessError, DecodeFailure, DeserializeError, InitError, SerializeError};
pub use format::Format;
pub use key::{KeySpec, MemberKey};
pub use member::{MemberDescriptor, MemberKind, MemberRef, MemberSet, MemberTable};
pub use object::{FacetHost, Persist, PersistType};
pub use persist_macro::Persist;
pub use registry::{CodecRegistry, RegistryBuilder};
pub use resolver::{CustomCodec, TypeResolver};
pub use value::Value;
