//! Object <-> bytes.
//!
//! Encoding always produces the nested layout ([`WireVersion::CURRENT`]).
//! Decoding dispatches on the caller-supplied version and applies every
//! stored key independently: one bad member never prevents the others from
//! loading.

use std::any::Any;

use crate::diagnostics::DecodeReport;
use crate::envelope::{FieldMap, WireVersion};
use crate::error::{AccessError, DecodeFailure, DeserializeError, SerializeError};
use crate::key::MemberKey;
use crate::member::{MemberDescriptor, MemberRef};
use crate::object::{FacetHost, Persist};
use crate::registry::CodecRegistry;
use crate::value::Value;

impl CodecRegistry {
    /// Encode every declared member of `object` into a [`FieldMap`].
    ///
    /// A member declared under two keys is stored under both.
    pub fn build_field_map(&self, object: Option<&dyn Persist>) -> Result<Option<FieldMap>, SerializeError> {
        let Some(object) = object else {
            return Ok(None);
        };
        let table = self.discovery.table_for(object.persist_type());
        let instance = object.as_any();
        let mut fields = FieldMap::new();
        for (key, member) in table.iter() {
            let bytes = self
                .encode_member(instance, member)
                .map_err(|e| with_field(e, member))?;
            fields.insert(key.clone(), Value::Bytes(bytes));
        }
        Ok(Some(fields))
    }

    /// Encode `object` into envelope bytes at [`WireVersion::CURRENT`].
    pub fn to_bytes(&self, object: Option<&dyn Persist>) -> Result<Option<Vec<u8>>, SerializeError> {
        self.build_field_map(object)?
            .map(|fields| self.envelope.encode(&fields))
            .transpose()
    }

    /// Decode envelope bytes and apply them to `object`.
    ///
    /// Never fails as a whole. Every failure is forwarded to the diagnostics
    /// sink and recorded in the returned report.
    pub fn apply_bytes(&self, object: Option<&mut dyn Persist>, bytes: &[u8], version: WireVersion) -> DecodeReport {
        let Some(object) = object else {
            return DecodeReport::default();
        };
        match self.envelope.decode(bytes) {
            Ok(fields) => self.apply_field_map(Some(object), fields, version),
            Err(error) => {
                let failure = DecodeFailure {
                    owner: object.persist_type().name(),
                    member: None,
                    key: None,
                    error,
                };
                self.diagnostics.report_error(&failure);
                DecodeReport {
                    failures: vec![failure],
                    ..DecodeReport::default()
                }
            }
        }
    }

    /// Apply an already decoded [`FieldMap`] to `object`.
    pub fn apply_field_map(
        &self,
        object: Option<&mut dyn Persist>,
        fields: FieldMap,
        version: WireVersion,
    ) -> DecodeReport {
        let mut report = DecodeReport::default();
        let Some(object) = object else {
            return report;
        };
        let table = self.discovery.table_for(object.persist_type());
        for (key, stored) in fields {
            let Some(member) = table.get(&key) else {
                if self.config.trace_skipped_keys {
                    log::trace!("{}: skipping unknown key {key}", table.owner());
                }
                report.skipped.push(key);
                continue;
            };
            match self.apply_member(object.as_any_mut(), member, stored, version) {
                Ok(()) => report.applied.push(key),
                Err(error) => {
                    let failure = DecodeFailure {
                        owner: table.owner(),
                        member: Some(member.name()),
                        key: Some(key),
                        error,
                    };
                    self.diagnostics.report_error(&failure);
                    report.failures.push(failure);
                }
            }
        }
        report
    }

    /// Encode the facet `host` chooses to expose; `Ok(None)` when it has none.
    pub fn save_facet<H: FacetHost + ?Sized>(&self, host: &H) -> Result<Option<Vec<u8>>, SerializeError> {
        self.to_bytes(host.find_serializable_facet())
    }

    pub fn load_facet<H: FacetHost + ?Sized>(&self, host: &mut H, bytes: &[u8], version: WireVersion) -> DecodeReport {
        self.apply_bytes(host.find_serializable_facet_mut(), bytes, version)
    }

    /// Current value of the member stored under `key`.
    pub fn member_value<'a>(&self, object: &'a dyn Persist, key: &MemberKey) -> Option<MemberRef<'a>> {
        let table = self.discovery.table_for(object.persist_type());
        let member = table.get(key)?;
        member.read(object.as_any()).ok()
    }

    /// Clone of the member stored under `key` when it is a `T`.
    pub fn member_as<T: Clone + 'static>(&self, object: &dyn Persist, key: &MemberKey) -> Option<T> {
        self.member_value(object, key)?.downcast_ref::<T>().cloned()
    }

    /// Write `value` into the member stored under `key`.
    ///
    /// Returns `Ok(false)` when the type declares no such key.
    pub fn set_member_value(
        &self,
        object: &mut dyn Persist,
        key: &MemberKey,
        value: Box<dyn Any + Send>,
    ) -> Result<bool, AccessError> {
        let table = self.discovery.table_for(object.persist_type());
        let Some(member) = table.get(key) else {
            return Ok(false);
        };
        member.write(object.as_any_mut(), value)?;
        Ok(true)
    }

    fn encode_member(&self, instance: &dyn Any, member: &MemberDescriptor) -> Result<Vec<u8>, SerializeError> {
        let value = member.read(instance)?;
        self.codecs.encode(member.value_type(), &*value)
    }

    fn apply_member(
        &self,
        instance: &mut dyn Any,
        member: &MemberDescriptor,
        stored: Value,
        version: WireVersion,
    ) -> Result<(), DeserializeError> {
        let value = if version.is_inline() {
            self.codecs.inline(member.value_type(), stored)?
        } else {
            match stored {
                Value::Bytes(bytes) => self.codecs.decode(member.value_type(), &bytes)?,
                other => {
                    return Err(DeserializeError::TypeMismatch {
                        field: member.name().to_string(),
                        expected: "nested bytes".into(),
                        found: other.kind().into(),
                    });
                }
            }
        };
        member.write(instance, value)?;
        Ok(())
    }
}

/// Labels an encode failure with `Owner::member`. Errors already naming a
/// field pass through.
fn with_field(error: SerializeError, member: &MemberDescriptor) -> SerializeError {
    let message = match error {
        SerializeError::FieldError { field, message } if !field.is_empty() => {
            return SerializeError::FieldError { field, message };
        }
        SerializeError::FieldError { message, .. } | SerializeError::FormatError(message) => message,
        other @ (SerializeError::Unresolved { .. } | SerializeError::Access(_)) => other.to_string(),
    };
    SerializeError::FieldError {
        field: format!("{}::{}", member.owner(), member.name()),
        message,
    }
}
