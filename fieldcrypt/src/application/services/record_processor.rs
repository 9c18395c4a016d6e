// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Record Processor
//!
//! Traverses a record and drives the per-record DEK lifecycle.
//!
//! ## Encrypt Pass
//!
//! 1. Validate structure (reserved fields, companions, tag conflicts),
//!    reporting every problem in one aggregated error
//! 2. Generate a fresh DEK
//! 3. Walk fields in declaration order: tagged scalars through the field
//!    processor, nested records recursively under the same DEK
//! 4. Wrap the DEK at the alias's current KEK version, write the envelope
//!    (`DEKEncrypted`, `KeyVersion`), keep the plaintext holder zeroed
//!
//! ## Decrypt Pass
//!
//! 1. Validate; read the envelope; unwrap the DEK bound to the RECORDED
//!    version (deprecated versions resolve fine)
//! 2. Walk fields, restoring each `encrypt`-tagged scalar; hash companions
//!    are left untouched
//!
//! A record encrypted at version V stays decryptable for as long as
//! (alias, V) resolves in the metadata store, across any number of
//! rotations.
//!
//! On failure the record may carry partial companion writes; the caller
//! must treat it as invalid and discard it. The plaintext DEK never
//! outlives the pass either way.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use fieldcrypt_domain::entities::{validate_record, FieldKind, FieldSpec, ProtectedRecord};
use fieldcrypt_domain::services::{MetricsCollector, ObservabilityHook};
use fieldcrypt_domain::value_objects::tag_set::{
    is_reserved_field, DEK_ENCRYPTED_FIELD, DEK_FIELD, KEY_VERSION_FIELD,
};
use fieldcrypt_domain::value_objects::{CanonicalValue, DataKey, KeyVersion};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::runtime::CancellationToken;

use super::dek_service::DekService;
use super::field_processor::FieldProcessor;
use super::key_version_manager::KeyVersionManager;

/// Record traversal and DEK lifecycle orchestration.
pub struct RecordProcessor {
    dek_service: Arc<DekService>,
    versions: Arc<KeyVersionManager>,
    fields: FieldProcessor,
    observability: Arc<dyn ObservabilityHook>,
    metrics: Arc<dyn MetricsCollector>,
}

impl RecordProcessor {
    pub fn new(
        dek_service: Arc<DekService>,
        versions: Arc<KeyVersionManager>,
        fields: FieldProcessor,
        observability: Arc<dyn ObservabilityHook>,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            dek_service,
            versions,
            fields,
            observability,
            metrics,
        }
    }

    pub fn field_processor(&self) -> &FieldProcessor {
        &self.fields
    }

    /// Encrypts one record in place.
    pub async fn encrypt_record(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        let (attrs, started) = self.begin("encrypt_record");
        let result = self.encrypt_inner(token, record).await;
        self.finish("encrypt_record", started, &attrs, &result);
        result
    }

    /// Decrypts one record in place.
    pub async fn decrypt_record(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        let (attrs, started) = self.begin("decrypt_record");
        let result = self.decrypt_inner(token, record).await;
        self.finish("decrypt_record", started, &attrs, &result);
        result
    }

    fn begin(&self, op_name: &str) -> (HashMap<String, String>, Instant) {
        let attrs = HashMap::from([(
            "alias".to_string(),
            self.versions.alias().as_str().to_string(),
        )]);
        self.observability.on_process_start(op_name, &attrs);
        (attrs, Instant::now())
    }

    fn finish(
        &self,
        op_name: &str,
        started: Instant,
        attrs: &HashMap<String, String>,
        result: &Result<(), CryptoError>,
    ) {
        let elapsed = started.elapsed();
        self.metrics
            .record_operation(op_name, elapsed, result.is_ok());
        if let Err(error) = result {
            self.observability.on_error(op_name, error, attrs);
        }
        self.observability
            .on_process_complete(op_name, elapsed, result.as_ref().err(), attrs);
    }

    async fn encrypt_inner(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        validate_record(&*record, true)?;
        token.error_if_cancelled("encrypt_record")?;

        let dek = self.dek_service.generate_dek()?;
        self.process_fields(record, &dek)?;

        let (wrapped, version) = self
            .dek_service
            .wrap_dek(token, &dek, &self.versions)
            .await?;
        record.set_value(DEK_ENCRYPTED_FIELD, CanonicalValue::Bytes(wrapped))?;
        record.set_value(
            KEY_VERSION_FIELD,
            CanonicalValue::UInt32(version.value()),
        )?;
        // The plaintext DEK holder stays zeroed; the DataKey wipes itself
        // when it drops at the end of this scope
        record.set_value(DEK_FIELD, CanonicalValue::Bytes(Vec::new()))?;
        Ok(())
    }

    async fn decrypt_inner(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        validate_record(&*record, true)?;
        token.error_if_cancelled("decrypt_record")?;

        let version = match record.value(KEY_VERSION_FIELD)? {
            CanonicalValue::UInt32(raw) => KeyVersion::new(raw).map_err(|_| {
                CryptoError::validation("record has no key version; was it ever encrypted?")
            })?,
            other => {
                return Err(CryptoError::invalid_config(format!(
                    "reserved field '{}' must be u32, found {}",
                    KEY_VERSION_FIELD,
                    other.kind()
                )))
            }
        };
        let wrapped = match record.value(DEK_ENCRYPTED_FIELD)? {
            CanonicalValue::Bytes(bytes) if !bytes.is_empty() => bytes,
            CanonicalValue::Bytes(_) => {
                return Err(CryptoError::validation(
                    "record has an empty DEK envelope; was it ever encrypted?",
                ))
            }
            other => {
                return Err(CryptoError::invalid_config(format!(
                    "reserved field '{}' must be bytes, found {}",
                    DEK_ENCRYPTED_FIELD,
                    other.kind()
                )))
            }
        };

        let dek = self
            .dek_service
            .unwrap_dek(token, &wrapped, version, &self.versions)
            .await?;
        self.decrypt_fields(record, &dek)
    }

    /// Declaration-order walk of the encrypt pass, recursing into nested
    /// records under the same DEK.
    fn process_fields(
        &self,
        record: &mut dyn ProtectedRecord,
        dek: &DataKey,
    ) -> Result<(), CryptoError> {
        let specs: Vec<FieldSpec> = record.field_specs().to_vec();
        for spec in &specs {
            if is_reserved_field(&spec.name) {
                continue;
            }
            match &spec.kind {
                FieldKind::Nested => {
                    let nested = record.nested_mut(&spec.name)?;
                    self.process_fields(nested, dek)
                        .map_err(|e| e.context(&format!("nested record '{}'", spec.name)))?;
                }
                FieldKind::Scalar(_) => {
                    if !spec.tags.is_empty() {
                        self.fields.process_field(record, spec, dek)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Declaration-order walk of the decrypt pass.
    fn decrypt_fields(
        &self,
        record: &mut dyn ProtectedRecord,
        dek: &DataKey,
    ) -> Result<(), CryptoError> {
        let specs: Vec<FieldSpec> = record.field_specs().to_vec();
        for spec in &specs {
            if is_reserved_field(&spec.name) {
                continue;
            }
            match &spec.kind {
                FieldKind::Nested => {
                    let nested = record.nested_mut(&spec.name)?;
                    self.decrypt_fields(nested, dek)
                        .map_err(|e| e.context(&format!("nested record '{}'", spec.name)))?;
                }
                FieldKind::Scalar(_) => {
                    if !spec.tags.is_empty() {
                        self.fields.decrypt_field(record, spec, dek)?;
                    }
                }
            }
        }
        Ok(())
    }
}
