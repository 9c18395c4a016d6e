// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Protected Record Contract
//!
//! The record processor does not know concrete record types. It traverses
//! any value implementing [`ProtectedRecord`]: an addressable aggregate that
//! exposes its fields in declaration order, typed accessors for scalar
//! fields, and structural access to nested records.
//!
//! The source system discovered fields through runtime reflection over the
//! `encx` annotations. Here the contract is explicit: generated glue (or a
//! hand-written impl, or the shipped [`DynamicRecord`]) provides the same
//! information statically, and the single traversal algorithm in the record
//! processor runs over the trait.
//!
//! ## Well-Formedness
//!
//! A record accepted for processing must declare:
//!
//! - the three reserved envelope fields `DEK` (bytes), `DEKEncrypted`
//!   (bytes), and `KeyVersion` (u32) at the top level;
//! - for every tagged field `F`, a companion `F + "Encrypted"` (bytes) when
//!   `encrypt` is declared and `F + "Hash"` (string) when either hash tag
//!   is declared;
//! - no tags on reserved fields or on aggregate (nested) fields.
//!
//! [`validate_record`] checks all of this at once and reports every problem
//! found in a single aggregated error.
//!
//! [`DynamicRecord`]: crate::entities::DynamicRecord

use crate::error::CryptoError;
use crate::value_objects::canonical_value::CanonicalValue;
use crate::value_objects::tag_set::{
    encrypted_companion, hash_companion, is_reserved_field, DEK_ENCRYPTED_FIELD, DEK_FIELD,
    KEY_VERSION_FIELD,
};
use crate::value_objects::{CanonicalKind, FieldTag, TagSet};

/// Shape of one declared field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A scalar field holding one canonical value
    Scalar(CanonicalKind),
    /// An aggregate field holding a nested record, reached through
    /// [`ProtectedRecord::nested`] rather than through a canonical value
    Nested,
}

/// Declaration of one record field: name, shape, and parsed tag set.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub tags: TagSet,
}

impl FieldSpec {
    /// Declares a scalar field
    pub fn scalar(name: impl Into<String>, kind: CanonicalKind, tags: TagSet) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(kind),
            tags,
        }
    }

    /// Declares an untagged scalar field (companions, envelope holders)
    pub fn plain(name: impl Into<String>, kind: CanonicalKind) -> Self {
        Self::scalar(name, kind, TagSet::empty())
    }

    /// Declares a nested aggregate field
    pub fn nested(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Nested,
            tags: TagSet::empty(),
        }
    }

    /// Returns the scalar kind, if this is a scalar field
    pub fn scalar_kind(&self) -> Option<&CanonicalKind> {
        match &self.kind {
            FieldKind::Scalar(kind) => Some(kind),
            FieldKind::Nested => None,
        }
    }
}

/// Contract satisfied by any record the engine can process.
///
/// Implementations must report fields in declaration order; the processor
/// guarantees field operations execute in that order.
pub trait ProtectedRecord: Send {
    /// Declared fields in declaration order, companions and reserved
    /// fields included.
    fn field_specs(&self) -> &[FieldSpec];

    /// Reads the current value of a scalar field.
    fn value(&self, field: &str) -> Result<CanonicalValue, CryptoError>;

    /// Writes a scalar field. The value's kind must match the declaration.
    fn set_value(&mut self, field: &str, value: CanonicalValue) -> Result<(), CryptoError>;

    /// Borrows a nested record.
    ///
    /// The default refuses: types without aggregate fields never implement
    /// this.
    fn nested(&self, field: &str) -> Result<&dyn ProtectedRecord, CryptoError> {
        Err(CryptoError::invalid_config(format!(
            "field '{}' is not a nested record",
            field
        )))
    }

    /// Mutably borrows a nested record.
    fn nested_mut(&mut self, field: &str) -> Result<&mut dyn ProtectedRecord, CryptoError> {
        Err(CryptoError::invalid_config(format!(
            "field '{}' is not a nested record",
            field
        )))
    }

    /// Looks up the declaration of a field by name.
    fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.field_specs().iter().find(|s| s.name == field)
    }
}

/// Expected kinds of the reserved envelope fields
fn envelope_expectations() -> [(&'static str, CanonicalKind); 3] {
    [
        (DEK_FIELD, CanonicalKind::Bytes),
        (DEK_ENCRYPTED_FIELD, CanonicalKind::Bytes),
        (KEY_VERSION_FIELD, CanonicalKind::UInt32),
    ]
}

/// Validates record structure, aggregating every problem found.
///
/// `require_envelope` is true for top-level records and false for nested
/// records, which share the outer record's envelope.
///
/// # Errors
///
/// Returns a single `CryptoError::InvalidConfiguration` listing all
/// structural problems, or `Ok(())` when the record is well-formed.
pub fn validate_record(
    record: &dyn ProtectedRecord,
    require_envelope: bool,
) -> Result<(), CryptoError> {
    let mut problems = Vec::new();
    collect_problems(record, require_envelope, "", &mut problems);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CryptoError::invalid_config(problems.join("; ")))
    }
}

fn collect_problems(
    record: &dyn ProtectedRecord,
    require_envelope: bool,
    prefix: &str,
    problems: &mut Vec<String>,
) {
    let specs = record.field_specs();

    if require_envelope {
        for (name, expected) in envelope_expectations() {
            match specs.iter().find(|s| s.name == name) {
                None => problems.push(format!("{}missing reserved field '{}'", prefix, name)),
                Some(spec) => match spec.scalar_kind() {
                    Some(kind) if *kind == expected => {}
                    _ => problems.push(format!(
                        "{}reserved field '{}' must be {}",
                        prefix, name, expected
                    )),
                },
            }
        }
    }

    for spec in specs {
        if is_reserved_field(&spec.name) && !spec.tags.is_empty() {
            problems.push(format!(
                "{}reserved field '{}' must not carry tags",
                prefix, spec.name
            ));
            continue;
        }

        match &spec.kind {
            FieldKind::Nested => {
                if !spec.tags.is_empty() {
                    problems.push(format!(
                        "{}aggregate field '{}' cannot carry tags; tag its fields instead",
                        prefix, spec.name
                    ));
                    continue;
                }
                match record.nested(&spec.name) {
                    Ok(nested) => {
                        let nested_prefix = format!("{}{}.", prefix, spec.name);
                        collect_problems(nested, false, &nested_prefix, problems);
                    }
                    Err(_) => problems.push(format!(
                        "{}nested field '{}' is not accessible",
                        prefix, spec.name
                    )),
                }
            }
            FieldKind::Scalar(_) => {
                if spec.tags.is_empty() {
                    continue;
                }
                if let Err(e) = spec.tags.validate() {
                    problems.push(format!("{}field '{}': {}", prefix, spec.name, e));
                }
                if spec.tags.contains(FieldTag::Encrypt) {
                    expect_companion(
                        record,
                        &encrypted_companion(&spec.name),
                        CanonicalKind::Bytes,
                        prefix,
                        problems,
                    );
                }
                if spec.tags.contains(FieldTag::HashBasic)
                    || spec.tags.contains(FieldTag::HashSecure)
                {
                    expect_companion(
                        record,
                        &hash_companion(&spec.name),
                        CanonicalKind::String,
                        prefix,
                        problems,
                    );
                }
            }
        }
    }
}

fn expect_companion(
    record: &dyn ProtectedRecord,
    companion: &str,
    expected: CanonicalKind,
    prefix: &str,
    problems: &mut Vec<String>,
) {
    match record.spec(companion) {
        None => problems.push(format!("{}missing companion field '{}'", prefix, companion)),
        Some(spec) => match spec.scalar_kind() {
            Some(kind) if *kind == expected => {}
            _ => problems.push(format!(
                "{}companion field '{}' must be {}",
                prefix, companion, expected
            )),
        },
    }
}
