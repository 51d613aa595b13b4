//! Custom type resolver.
//!
//! Teaches the codec engine how to persist types the binary format has no
//! built-in support for (engine handles, interned ids, GPU resources stored by
//! asset path). Each registration maps a type to and from a [`Value`]
//! surrogate; the surrogate is what the format actually encodes.
//!
//! A registration also overrides the serde path for types that do implement
//! serde, so hosts can store e.g. a handle by name instead of by index.
//!
//! The resolver is assembled once at startup and then frozen inside the
//! [`CodecRegistry`](crate::CodecRegistry).

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DeserializeError, SerializeError};
use crate::value::Value;

type ToValueFn = Arc<dyn Fn(&dyn Any) -> Result<Value, SerializeError> + Send + Sync>;
type FromValueFn = Arc<dyn Fn(Value) -> Result<Box<dyn Any + Send>, DeserializeError> + Send + Sync>;

/// Type-erased surrogate conversion for one custom type.
#[derive(Clone)]
pub struct CustomCodec {
    type_name: &'static str,
    to_value: ToValueFn,
    from_value: FromValueFn,
}

impl CustomCodec {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn to_value(&self, value: &dyn Any) -> Result<Value, SerializeError> {
        (self.to_value)(value)
    }

    pub fn from_value(&self, value: Value) -> Result<Box<dyn Any + Send>, DeserializeError> {
        (self.from_value)(value)
    }
}

/// Registry of [`CustomCodec`]s keyed by type.
#[derive(Clone, Default)]
pub struct TypeResolver {
    codecs: HashMap<TypeId, CustomCodec>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surrogate conversion for `T`, replacing any previous one.
    ///
    /// The encoder is fallible so it can go through [`to_value`](crate::value::to_value).
    pub fn register<T, Enc, Dec>(&mut self, to_value: Enc, from_value: Dec) -> &mut Self
    where
        T: Send + 'static,
        Enc: Fn(&T) -> Result<Value, SerializeError> + Send + Sync + 'static,
        Dec: Fn(Value) -> Result<T, DeserializeError> + Send + Sync + 'static,
    {
        let name = type_name::<T>();
        let codec = CustomCodec {
            type_name: name,
            to_value: Arc::new(move |value: &dyn Any| {
                let value = value
                    .downcast_ref::<T>()
                    .ok_or_else(|| SerializeError::FieldError {
                        field: String::new(),
                        message: format!("custom codec for '{name}' received another type"),
                    })?;
                to_value(value)
            }),
            from_value: Arc::new(move |value: Value| {
                from_value(value).map(|v| Box::new(v) as Box<dyn Any + Send>)
            }),
        };
        if self.codecs.insert(TypeId::of::<T>(), codec).is_some() {
            log::debug!("custom codec for {name} replaced");
        }
        self
    }

    pub fn get(&self, id: TypeId) -> Option<&CustomCodec> {
        self.codecs.get(&id)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.values().map(|c| c.type_name))
            .finish()
    }
}
