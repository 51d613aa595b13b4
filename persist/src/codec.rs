//! Per-type codec resolution.
//!
//! The binary format is generic over the value type, but member types are
//! only known at runtime as a [`ValueType`]. [`CodecResolver`] specializes
//! the generic encode/decode for a type the first time it is requested and
//! caches the resulting type-erased [`EncodeFn`] / [`DecodeFn`], so the
//! specialization is paid once per type instead of once per field per object.
//!
//! Resolution order for a type `T`:
//!
//! 1. a [`CustomCodec`](crate::CustomCodec) registered for `T` in the
//!    [`TypeResolver`] (surrogate [`Value`] encoded by the format);
//! 2. the serde impl of `T`, encoded directly by the format.
//!
//! Types declared with [`ValueType::custom`] have no serde fallback and fail
//! with `Unresolved` when the resolver does not know them. Codecs are cached
//! per type and [`Recipe`], so a serde member of some type never lends its
//! codec to a custom member of the same type.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{DeserializeError, SerializeError};
use crate::format::{self, Format};
use crate::resolver::{CustomCodec, TypeResolver};
use crate::value::{self, Value};

/// Specialized encoder for one type.
pub type EncodeFn = Arc<dyn Fn(&dyn Any) -> Result<Vec<u8>, SerializeError> + Send + Sync>;
/// Specialized decoder for one type.
pub type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<Box<dyn Any + Send>, DeserializeError> + Send + Sync>;

type SpecializeEncode = fn(Format, &TypeResolver) -> Option<EncodeFn>;
type SpecializeDecode = fn(Format, &TypeResolver) -> Option<DecodeFn>;
type InlineFn = fn(Value, &TypeResolver) -> Result<Box<dyn Any + Send>, DeserializeError>;

/// How a [`ValueType`] is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    /// Custom resolver first, then serde.
    Serde,
    /// Custom resolver only.
    Custom,
}

/// Runtime handle for a member's declared type.
///
/// Carries the type identity plus monomorphized recipes for specializing
/// its codec and for converting a legacy inline [`Value`].
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
    recipe: Recipe,
    encoder: SpecializeEncode,
    decoder: SpecializeDecode,
    inline: InlineFn,
}

impl ValueType {
    /// A serde type, optionally overridden by the custom resolver.
    pub fn of<T: Serialize + DeserializeOwned + Send + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            recipe: Recipe::Serde,
            encoder: serde_encoder::<T>,
            decoder: serde_decoder::<T>,
            inline: serde_inline::<T>,
        }
    }

    /// A type known only to the custom resolver.
    pub fn custom<T: Send + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            recipe: Recipe::Custom,
            encoder: custom_encoder::<T>,
            decoder: custom_decoder::<T>,
            inline: custom_inline::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn recipe(&self) -> Recipe {
        self.recipe
    }

    fn cache_key(&self) -> CacheKey {
        (self.id, self.recipe)
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueType")
            .field(&self.name)
            .field(&self.recipe)
            .finish()
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for ValueType {}

fn custom_from_resolver_encoder(format: Format, codec: CustomCodec) -> EncodeFn {
    Arc::new(move |value: &dyn Any| format::encode(&codec.to_value(value)?, format))
}

fn custom_from_resolver_decoder(format: Format, codec: CustomCodec) -> DecodeFn {
    Arc::new(move |bytes: &[u8]| codec.from_value(format::decode::<Value>(bytes, format)?))
}

fn serde_encoder<T: Serialize + Send + 'static>(
    format: Format,
    resolver: &TypeResolver,
) -> Option<EncodeFn> {
    if let Some(codec) = resolver.get(TypeId::of::<T>()) {
        return Some(custom_from_resolver_encoder(format, codec.clone()));
    }
    Some(Arc::new(move |value: &dyn Any| {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| SerializeError::FieldError {
                field: String::new(),
                message: format!("encoder for '{}' received another type", type_name::<T>()),
            })?;
        format::encode(value, format)
    }))
}

fn serde_decoder<T: DeserializeOwned + Send + 'static>(
    format: Format,
    resolver: &TypeResolver,
) -> Option<DecodeFn> {
    if let Some(codec) = resolver.get(TypeId::of::<T>()) {
        return Some(custom_from_resolver_decoder(format, codec.clone()));
    }
    Some(Arc::new(move |bytes: &[u8]| {
        format::decode::<T>(bytes, format).map(|v| Box::new(v) as Box<dyn Any + Send>)
    }))
}

fn serde_inline<T: DeserializeOwned + Send + 'static>(
    raw: Value,
    resolver: &TypeResolver,
) -> Result<Box<dyn Any + Send>, DeserializeError> {
    match resolver.get(TypeId::of::<T>()) {
        Some(codec) => codec.from_value(raw),
        None => value::from_value::<T>(raw).map(|v| Box::new(v) as Box<dyn Any + Send>),
    }
}

fn custom_encoder<T: 'static>(format: Format, resolver: &TypeResolver) -> Option<EncodeFn> {
    let codec = resolver.get(TypeId::of::<T>())?;
    Some(custom_from_resolver_encoder(format, codec.clone()))
}

fn custom_decoder<T: 'static>(format: Format, resolver: &TypeResolver) -> Option<DecodeFn> {
    let codec = resolver.get(TypeId::of::<T>())?;
    Some(custom_from_resolver_decoder(format, codec.clone()))
}

fn custom_inline<T: 'static>(
    raw: Value,
    resolver: &TypeResolver,
) -> Result<Box<dyn Any + Send>, DeserializeError> {
    resolver
        .get(TypeId::of::<T>())
        .ok_or(DeserializeError::Unresolved {
            type_name: type_name::<T>(),
        })?
        .from_value(raw)
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecStats {
    /// Encoders built (one per distinct type and recipe).
    pub encode_specializations: usize,
    /// Decoders built (one per distinct type and recipe).
    pub decode_specializations: usize,
    /// Calls through [`CodecResolver::encode`].
    pub encode_calls: usize,
    /// Calls through [`CodecResolver::decode`].
    pub decode_calls: usize,
}

#[derive(Default)]
struct Counters {
    encode_specializations: AtomicUsize,
    decode_specializations: AtomicUsize,
    encode_calls: AtomicUsize,
    decode_calls: AtomicUsize,
}

type CacheKey = (TypeId, Recipe);

/// Caches one specialized encoder and decoder per type and recipe.
pub struct CodecResolver {
    format: Format,
    types: Arc<TypeResolver>,
    encoders: RwLock<HashMap<CacheKey, EncodeFn>>,
    decoders: RwLock<HashMap<CacheKey, DecodeFn>>,
    counters: Counters,
}

impl CodecResolver {
    pub fn new(format: Format, types: Arc<TypeResolver>) -> Self {
        Self {
            format,
            types,
            encoders: RwLock::new(HashMap::new()),
            decoders: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn types(&self) -> &TypeResolver {
        &self.types
    }

    /// The cached encoder for `ty`, specializing it on first use.
    pub fn encoder(&self, ty: &ValueType) -> Result<EncodeFn, SerializeError> {
        cached(
            &self.encoders,
            ty,
            "encoder",
            &self.counters.encode_specializations,
            || (ty.encoder)(self.format, &self.types),
        )
        .ok_or(SerializeError::Unresolved { type_name: ty.name })
    }

    /// The cached decoder for `ty`, specializing it on first use.
    pub fn decoder(&self, ty: &ValueType) -> Result<DecodeFn, DeserializeError> {
        cached(
            &self.decoders,
            ty,
            "decoder",
            &self.counters.decode_specializations,
            || (ty.decoder)(self.format, &self.types),
        )
        .ok_or(DeserializeError::Unresolved { type_name: ty.name })
    }

    pub fn encode(&self, ty: &ValueType, value: &dyn Any) -> Result<Vec<u8>, SerializeError> {
        self.counters.encode_calls.fetch_add(1, Ordering::Relaxed);
        let encode = self.encoder(ty)?;
        encode(value)
    }

    pub fn decode(&self, ty: &ValueType, bytes: &[u8]) -> Result<Box<dyn Any + Send>, DeserializeError> {
        self.counters.decode_calls.fetch_add(1, Ordering::Relaxed);
        let decode = self.decoder(ty)?;
        let decoded = decode(bytes)?;
        if (*decoded).type_id() != ty.id {
            return Err(DeserializeError::CodecTypeMismatch { expected: ty.name });
        }
        Ok(decoded)
    }

    /// Convert a legacy inline value into `ty` without touching the codec caches.
    pub fn inline(&self, ty: &ValueType, raw: Value) -> Result<Box<dyn Any + Send>, DeserializeError> {
        (ty.inline)(raw, &self.types)
    }

    pub fn encode_value<T>(&self, value: &T) -> Result<Vec<u8>, SerializeError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.encode(&ValueType::of::<T>(), value)
    }

    pub fn decode_value<T>(&self, bytes: &[u8]) -> Result<T, DeserializeError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.decode(&ValueType::of::<T>(), bytes)?
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| DeserializeError::CodecTypeMismatch {
                expected: type_name::<T>(),
            })
    }

    pub fn stats(&self) -> CodecStats {
        CodecStats {
            encode_specializations: self.counters.encode_specializations.load(Ordering::Relaxed),
            decode_specializations: self.counters.decode_specializations.load(Ordering::Relaxed),
            encode_calls: self.counters.encode_calls.load(Ordering::Relaxed),
            decode_calls: self.counters.decode_calls.load(Ordering::Relaxed),
        }
    }

    /// Number of cached encoders and decoders.
    pub fn cached_types(&self) -> (usize, usize) {
        (self.encoders.read().len(), self.decoders.read().len())
    }
}

/// Double-checked cache lookup. The specialization runs under the write lock,
/// so concurrent first requests for one type build exactly one callable.
fn cached<F: Clone>(
    cache: &RwLock<HashMap<CacheKey, F>>,
    ty: &ValueType,
    direction: &str,
    specializations: &AtomicUsize,
    specialize: impl FnOnce() -> Option<F>,
) -> Option<F> {
    let key = ty.cache_key();
    if let Some(f) = cache.read().get(&key) {
        return Some(f.clone());
    }
    let mut cache = cache.write();
    if let Some(f) = cache.get(&key) {
        return Some(f.clone());
    }
    let f = specialize()?;
    specializations.fetch_add(1, Ordering::Relaxed);
    log::debug!("specialized {direction} for {} ({:?})", ty.name, ty.recipe);
    cache.insert(key, f.clone());
    Some(f)
}
