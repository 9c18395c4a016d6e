// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dynamic Record
//!
//! Map-backed [`ProtectedRecord`] implementation. Callers without generated
//! glue declare fields at runtime, in declaration order, with a tag string
//! in the `encx` vocabulary; the record then behaves exactly like a typed
//! record would under the same traversal algorithm.
//!
//! ## Usage
//!
//! ```
//! use fieldcrypt_domain::entities::{DynamicRecord, ProtectedRecord};
//! use fieldcrypt_domain::value_objects::CanonicalValue;
//!
//! let record = DynamicRecord::builder()
//!     .field("Email", "encrypt,hash_basic", CanonicalValue::from("user@example.com"))
//!     .unwrap()
//!     .companion_fields("Email")
//!     .field("Age", "", CanonicalValue::UInt8(41))
//!     .unwrap()
//!     .envelope()
//!     .build();
//!
//! assert_eq!(record.value("Email").unwrap(), CanonicalValue::from("user@example.com"));
//! ```
//!
//! `companion_fields` declares the companions the tag set requires
//! (`F + "Encrypted"` as bytes, `F + "Hash"` as string), and `envelope`
//! declares the three reserved holder fields.

use crate::error::CryptoError;
use crate::value_objects::tag_set::{
    encrypted_companion, hash_companion, DEK_ENCRYPTED_FIELD, DEK_FIELD, KEY_VERSION_FIELD,
};
use crate::value_objects::{CanonicalKind, CanonicalValue, TagSet};

use super::protected_record::{FieldSpec, ProtectedRecord};

/// Storage slot backing one declared field.
#[derive(Debug, Clone)]
enum Slot {
    Scalar(CanonicalValue),
    Nested(Box<DynamicRecord>),
}

/// Map-backed record with declaration-ordered fields.
#[derive(Debug, Clone, Default)]
pub struct DynamicRecord {
    specs: Vec<FieldSpec>,
    slots: Vec<Slot>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder
    pub fn builder() -> DynamicRecordBuilder {
        DynamicRecordBuilder {
            record: DynamicRecord::new(),
        }
    }

    fn index_of(&self, field: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == field)
    }

    fn declare(&mut self, spec: FieldSpec, slot: Slot) -> Result<(), CryptoError> {
        if self.index_of(&spec.name).is_some() {
            return Err(CryptoError::invalid_config(format!(
                "field '{}' declared twice",
                spec.name
            )));
        }
        self.specs.push(spec);
        self.slots.push(slot);
        Ok(())
    }

    /// Declares a scalar field with an initial value and a tag string.
    pub fn declare_field(
        &mut self,
        name: impl Into<String>,
        tags: &str,
        value: CanonicalValue,
    ) -> Result<(), CryptoError> {
        let name = name.into();
        let tags = TagSet::parse(tags)?;
        let kind = value.kind();
        self.declare(FieldSpec::scalar(name, kind, tags), Slot::Scalar(value))
    }

    /// Declares an untagged scalar field holding its kind's zero value.
    pub fn declare_zero_field(
        &mut self,
        name: impl Into<String>,
        kind: CanonicalKind,
    ) -> Result<(), CryptoError> {
        let zero = CanonicalValue::zero(&kind);
        self.declare(FieldSpec::plain(name, kind), Slot::Scalar(zero))
    }

    /// Declares a nested record field.
    pub fn declare_nested(
        &mut self,
        name: impl Into<String>,
        nested: DynamicRecord,
    ) -> Result<(), CryptoError> {
        self.declare(FieldSpec::nested(name), Slot::Nested(Box::new(nested)))
    }

    /// Convenience accessor for string fields (tests, callers)
    pub fn get_string(&self, field: &str) -> Option<String> {
        match self.value(field) {
            Ok(CanonicalValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Convenience accessor for byte fields
    pub fn get_bytes(&self, field: &str) -> Option<Vec<u8>> {
        match self.value(field) {
            Ok(CanonicalValue::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    /// Convenience accessor for u32 fields (the `KeyVersion` holder)
    pub fn get_u32(&self, field: &str) -> Option<u32> {
        match self.value(field) {
            Ok(CanonicalValue::UInt32(v)) => Some(v),
            _ => None,
        }
    }
}

impl ProtectedRecord for DynamicRecord {
    fn field_specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    fn value(&self, field: &str) -> Result<CanonicalValue, CryptoError> {
        let idx = self
            .index_of(field)
            .ok_or_else(|| CryptoError::validation(format!("unknown field '{}'", field)))?;
        match &self.slots[idx] {
            Slot::Scalar(value) => Ok(value.clone()),
            Slot::Nested(_) => Err(CryptoError::invalid_config(format!(
                "aggregate field '{}' has no canonical value",
                field
            ))),
        }
    }

    fn set_value(&mut self, field: &str, value: CanonicalValue) -> Result<(), CryptoError> {
        let idx = self
            .index_of(field)
            .ok_or_else(|| CryptoError::validation(format!("unknown field '{}'", field)))?;
        let declared = match self.specs[idx].scalar_kind() {
            Some(kind) => kind.clone(),
            None => {
                return Err(CryptoError::invalid_config(format!(
                    "aggregate field '{}' cannot be assigned a scalar",
                    field
                )))
            }
        };
        if value.kind() != declared {
            return Err(CryptoError::validation(format!(
                "field '{}' is declared {} but was assigned {}",
                field,
                declared,
                value.kind()
            )));
        }
        self.slots[idx] = Slot::Scalar(value);
        Ok(())
    }

    fn nested(&self, field: &str) -> Result<&dyn ProtectedRecord, CryptoError> {
        let idx = self
            .index_of(field)
            .ok_or_else(|| CryptoError::validation(format!("unknown field '{}'", field)))?;
        match &self.slots[idx] {
            Slot::Nested(record) => Ok(record.as_ref()),
            Slot::Scalar(_) => Err(CryptoError::invalid_config(format!(
                "field '{}' is not a nested record",
                field
            ))),
        }
    }

    fn nested_mut(&mut self, field: &str) -> Result<&mut dyn ProtectedRecord, CryptoError> {
        let idx = self
            .index_of(field)
            .ok_or_else(|| CryptoError::validation(format!("unknown field '{}'", field)))?;
        match &mut self.slots[idx] {
            Slot::Nested(record) => Ok(record.as_mut()),
            Slot::Scalar(_) => Err(CryptoError::invalid_config(format!(
                "field '{}' is not a nested record",
                field
            ))),
        }
    }
}

/// Fluent builder over [`DynamicRecord`].
pub struct DynamicRecordBuilder {
    record: DynamicRecord,
}

impl DynamicRecordBuilder {
    /// Declares a scalar field with a tag string
    pub fn field(
        mut self,
        name: &str,
        tags: &str,
        value: CanonicalValue,
    ) -> Result<Self, CryptoError> {
        self.record.declare_field(name, tags, value)?;
        Ok(self)
    }

    /// Declares the companion fields required by `name`'s tag set.
    ///
    /// Call after `field(name, ...)`; unknown source fields are ignored so
    /// the builder stays fluent.
    pub fn companion_fields(mut self, name: &str) -> Self {
        let tags = self
            .record
            .spec(name)
            .map(|s| s.tags.clone())
            .unwrap_or_default();
        use crate::value_objects::FieldTag;
        if tags.contains(FieldTag::Encrypt) {
            let _ = self
                .record
                .declare_zero_field(encrypted_companion(name), CanonicalKind::Bytes);
        }
        if tags.contains(FieldTag::HashBasic) || tags.contains(FieldTag::HashSecure) {
            let _ = self
                .record
                .declare_zero_field(hash_companion(name), CanonicalKind::String);
        }
        self
    }

    /// Declares a nested record field
    pub fn nested(mut self, name: &str, nested: DynamicRecord) -> Result<Self, CryptoError> {
        self.record.declare_nested(name, nested)?;
        Ok(self)
    }

    /// Declares the three reserved envelope holder fields
    pub fn envelope(mut self) -> Self {
        let _ = self
            .record
            .declare_zero_field(DEK_FIELD, CanonicalKind::Bytes);
        let _ = self
            .record
            .declare_zero_field(DEK_ENCRYPTED_FIELD, CanonicalKind::Bytes);
        let _ = self
            .record
            .declare_zero_field(KEY_VERSION_FIELD, CanonicalKind::UInt32);
        self
    }

    pub fn build(self) -> DynamicRecord {
        self.record
    }
}
