//! Member descriptors and the declaration builder.
//!
//! A [`MemberDescriptor`] is a uniform get/set pair produced at declaration
//! time. Fields and read-write properties end up as the same shape, so the
//! codec never branches on the member kind again.

use std::any::{Any, type_name};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::ValueType;
use crate::error::AccessError;
use crate::key::{KeySpec, MemberKey};
use crate::object::Persist;

/// A member value read through its accessor.
///
/// Fields are borrowed from the instance; property getters return an owned
/// value.
pub enum MemberRef<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any + Send>),
}

impl MemberRef<'_> {
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (**self).downcast_ref::<T>()
    }
}

impl Deref for MemberRef<'_> {
    type Target = dyn Any;

    fn deref(&self) -> &dyn Any {
        match self {
            Self::Borrowed(v) => *v,
            Self::Owned(v) => &**v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

type ReadFn =
    Box<dyn for<'a> Fn(&'a dyn Any) -> Result<MemberRef<'a>, AccessError> + Send + Sync>;
type WriteFn = Box<dyn Fn(&mut dyn Any, Box<dyn Any + Send>) -> Result<(), AccessError> + Send + Sync>;

fn reader<F>(f: F) -> ReadFn
where
    F: for<'a> Fn(&'a dyn Any) -> Result<MemberRef<'a>, AccessError> + Send + Sync + 'static,
{
    Box::new(f)
}

fn writer<F>(f: F) -> WriteFn
where
    F: Fn(&mut dyn Any, Box<dyn Any + Send>) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Box::new(f)
}

/// One persisted member of a type.
pub struct MemberDescriptor {
    owner: &'static str,
    name: &'static str,
    kind: MemberKind,
    value_type: ValueType,
    read: ReadFn,
    write: WriteFn,
}

impl MemberDescriptor {
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Read the member's current value from `instance`.
    pub fn read<'a>(&self, instance: &'a dyn Any) -> Result<MemberRef<'a>, AccessError> {
        (self.read)(instance)
    }

    /// Write `value` into the member of `instance`.
    ///
    /// `value` must be of the member's declared type.
    pub fn write(&self, instance: &mut dyn Any, value: Box<dyn Any + Send>) -> Result<(), AccessError> {
        (self.write)(instance, value)
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Builder passed to a [`PersistType`](crate::PersistType)'s declaration
/// function.
pub struct MemberSet {
    owner: &'static str,
    entries: BTreeMap<MemberKey, Arc<MemberDescriptor>>,
}

impl MemberSet {
    pub(crate) fn new(owner: &'static str) -> Self {
        Self {
            owner,
            entries: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Declare a field whose type is persisted through serde.
    pub fn field<O, T>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        get: fn(&O) -> &T,
        get_mut: fn(&mut O) -> &mut T,
    ) -> &mut Self
    where
        O: Persist,
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.field_as(name, keys, ValueType::of::<T>(), get, get_mut)
    }

    /// Declare a field whose type is persisted through the custom type resolver.
    pub fn custom_field<O, T>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        get: fn(&O) -> &T,
        get_mut: fn(&mut O) -> &mut T,
    ) -> &mut Self
    where
        O: Persist,
        T: Send + 'static,
    {
        self.field_as(name, keys, ValueType::custom::<T>(), get, get_mut)
    }

    /// Declare a read-write property whose type is persisted through serde.
    pub fn property<O, T>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        get: fn(&O) -> T,
        set: fn(&mut O, T),
    ) -> &mut Self
    where
        O: Persist,
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.property_as(name, keys, ValueType::of::<T>(), get, set)
    }

    /// Declare a read-write property whose type is persisted through the
    /// custom type resolver.
    pub fn custom_property<O, T>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        get: fn(&O) -> T,
        set: fn(&mut O, T),
    ) -> &mut Self
    where
        O: Persist,
        T: Send + 'static,
    {
        self.property_as(name, keys, ValueType::custom::<T>(), get, set)
    }

    fn field_as<O: Persist, T: Send + 'static>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        value_type: ValueType,
        get: fn(&O) -> &T,
        get_mut: fn(&mut O) -> &mut T,
    ) -> &mut Self {
        let owner = self.owner;
        let descriptor = MemberDescriptor {
            owner,
            name,
            kind: MemberKind::Field,
            value_type,
            read: reader(move |instance| {
                let this = downcast_owner::<O>(instance, owner)?;
                Ok(MemberRef::Borrowed(get(this) as &dyn Any))
            }),
            write: writer(move |instance, value| {
                let this = downcast_owner_mut::<O>(instance, owner)?;
                *get_mut(this) = downcast_value::<T>(value, name)?;
                Ok(())
            }),
        };
        self.insert(keys, descriptor)
    }

    fn property_as<O: Persist, T: Send + 'static>(
        &mut self,
        name: &'static str,
        keys: KeySpec,
        value_type: ValueType,
        get: fn(&O) -> T,
        set: fn(&mut O, T),
    ) -> &mut Self {
        let owner = self.owner;
        let descriptor = MemberDescriptor {
            owner,
            name,
            kind: MemberKind::Property,
            value_type,
            read: reader(move |instance| {
                let this = downcast_owner::<O>(instance, owner)?;
                Ok(MemberRef::Owned(Box::new(get(this))))
            }),
            write: writer(move |instance, value| {
                let this = downcast_owner_mut::<O>(instance, owner)?;
                set(this, downcast_value::<T>(value, name)?);
                Ok(())
            }),
        };
        self.insert(keys, descriptor)
    }

    fn insert(&mut self, keys: KeySpec, descriptor: MemberDescriptor) -> &mut Self {
        if keys.is_empty() {
            log::warn!(
                "{}::{} declared without a key, not persisted",
                self.owner,
                descriptor.name
            );
            return self;
        }
        let descriptor = Arc::new(descriptor);
        for key in keys.keys() {
            // Last declaration wins on a reused key.
            if let Some(previous) = self.entries.insert(key.clone(), descriptor.clone()) {
                log::debug!(
                    "{}: key {key} of member '{}' reassigned to '{}'",
                    self.owner,
                    previous.name,
                    descriptor.name
                );
            }
        }
        self
    }

    pub(crate) fn finish(self) -> MemberTable {
        MemberTable {
            owner: self.owner,
            entries: self.entries,
        }
    }
}

fn downcast_owner<'a, O: 'static>(instance: &'a dyn Any, owner: &'static str) -> Result<&'a O, AccessError> {
    instance
        .downcast_ref::<O>()
        .ok_or(AccessError::OwnerMismatch { expected: owner })
}

fn downcast_owner_mut<'a, O: 'static>(
    instance: &'a mut dyn Any,
    owner: &'static str,
) -> Result<&'a mut O, AccessError> {
    instance
        .downcast_mut::<O>()
        .ok_or(AccessError::OwnerMismatch { expected: owner })
}

fn downcast_value<T: 'static>(value: Box<dyn Any + Send>, member: &'static str) -> Result<T, AccessError> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| AccessError::ValueMismatch {
            member,
            expected: type_name::<T>(),
        })
}

/// All persisted members of one type, keyed by [`MemberKey`].
///
/// A member declared with both an integer and a string key appears under
/// both; the two entries share one descriptor.
#[derive(Debug)]
pub struct MemberTable {
    owner: &'static str,
    entries: BTreeMap<MemberKey, Arc<MemberDescriptor>>,
}

impl MemberTable {
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn get(&self, key: &MemberKey) -> Option<&Arc<MemberDescriptor>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &MemberKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, MemberKey, Arc<MemberDescriptor>> {
        self.entries.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, MemberKey, Arc<MemberDescriptor>> {
        self.entries.keys()
    }

    /// Number of keys (a dual-keyed member counts twice).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a MemberTable {
    type Item = (&'a MemberKey, &'a Arc<MemberDescriptor>);
    type IntoIter = btree_map::Iter<'a, MemberKey, Arc<MemberDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
