// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Field Processor
//!
//! Executes one field's declared tag operations against its companion
//! fields:
//!
//! - `hash_basic`: SHA-256 fingerprint of the canonical bytes into
//!   `F + "Hash"`
//! - `hash_secure`: peppered Argon2id hash into `F + "Hash"`
//! - `encrypt`: AES-256-GCM under the record DEK into `F + "Encrypted"`,
//!   then the source field is redacted to its kind's zero value
//!
//! The canonical bytes are captured once before any operation, so hashes
//! are always computed from the original value regardless of tag order, and
//! redaction happens exactly once after every tag ran.
//!
//! The processor is synchronous: everything here is CPU-bound crypto.

use std::sync::Arc;

use fieldcrypt_domain::entities::{FieldSpec, ProtectedRecord};
use fieldcrypt_domain::services::{canonical_serializer, fingerprint};
use fieldcrypt_domain::value_objects::tag_set::{encrypted_companion, hash_companion};
use fieldcrypt_domain::value_objects::{CanonicalValue, DataKey, FieldTag, Pepper};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::encryption::AesGcmCipher;
use crate::infrastructure::hashing::SecureHasher;

/// Per-field tag execution over a record.
pub struct FieldProcessor {
    cipher: AesGcmCipher,
    hasher: SecureHasher,
    pepper: Arc<Pepper>,
}

impl FieldProcessor {
    pub fn new(cipher: AesGcmCipher, hasher: SecureHasher, pepper: Arc<Pepper>) -> Self {
        Self {
            cipher,
            hasher,
            pepper,
        }
    }

    /// Runs every declared operation for one tagged field on the encrypt
    /// path.
    pub fn process_field(
        &self,
        record: &mut dyn ProtectedRecord,
        spec: &FieldSpec,
        dek: &DataKey,
    ) -> Result<(), CryptoError> {
        let kind = spec.scalar_kind().ok_or_else(|| {
            CryptoError::invalid_config(format!(
                "aggregate field '{}' cannot carry tags",
                spec.name
            ))
        })?;
        let value = record.value(&spec.name)?;
        let canonical = canonical_serializer::serialize(&value)
            .map_err(|e| e.context(&format!("field '{}'", spec.name)))?;

        for tag in spec.tags.iter() {
            match tag {
                FieldTag::HashBasic => {
                    let digest = fingerprint::fingerprint_bytes(&canonical);
                    record.set_value(&hash_companion(&spec.name), CanonicalValue::String(digest))?;
                }
                FieldTag::HashSecure => {
                    let hash = self
                        .hasher
                        .hash(&canonical, &self.pepper)
                        .map_err(|e| e.context(&format!("field '{}'", spec.name)))?;
                    record.set_value(&hash_companion(&spec.name), CanonicalValue::String(hash))?;
                }
                FieldTag::Encrypt => {
                    let ciphertext = self
                        .cipher
                        .encrypt(&canonical, dek)
                        .map_err(|e| e.context(&format!("field '{}'", spec.name)))?;
                    record.set_value(
                        &encrypted_companion(&spec.name),
                        CanonicalValue::Bytes(ciphertext),
                    )?;
                }
            }
        }

        // Redaction: after all tags ran, an encrypted source field is
        // cleared to its kind's zero value
        if spec.tags.contains(FieldTag::Encrypt) {
            record.set_value(&spec.name, CanonicalValue::zero(kind))?;
        }
        Ok(())
    }

    /// Restores one encrypted field on the decrypt path. Hash companions
    /// are left untouched; verification re-hashes on demand.
    pub fn decrypt_field(
        &self,
        record: &mut dyn ProtectedRecord,
        spec: &FieldSpec,
        dek: &DataKey,
    ) -> Result<(), CryptoError> {
        if !spec.tags.contains(FieldTag::Encrypt) {
            return Ok(());
        }
        let kind = spec.scalar_kind().ok_or_else(|| {
            CryptoError::invalid_config(format!(
                "aggregate field '{}' cannot carry tags",
                spec.name
            ))
        })?;

        let companion = encrypted_companion(&spec.name);
        let sealed = match record.value(&companion)? {
            CanonicalValue::Bytes(bytes) => bytes,
            other => {
                return Err(CryptoError::invalid_config(format!(
                    "companion field '{}' must be bytes, found {}",
                    companion,
                    other.kind()
                )))
            }
        };

        let canonical = self
            .cipher
            .decrypt(&sealed, dek)
            .map_err(|e| e.context(&format!("field '{}'", spec.name)))?;
        let value = canonical_serializer::deserialize(kind, &canonical)
            .map_err(|e| e.context(&format!("field '{}'", spec.name)))?;
        record.set_value(&spec.name, value)?;
        Ok(())
    }

    /// Peppered secure hash of standalone canonical bytes (facade surface)
    pub fn hash_secure(&self, canonical: &[u8]) -> Result<String, CryptoError> {
        self.hasher.hash(canonical, &self.pepper)
    }

    /// Verifies standalone canonical bytes against a stored secure hash
    pub fn verify_secure(&self, canonical: &[u8], stored: &str) -> Result<bool, CryptoError> {
        self.hasher.verify(canonical, stored, &self.pepper)
    }

    pub fn cipher(&self) -> &AesGcmCipher {
        &self.cipher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcrypt_domain::entities::DynamicRecord;
    use fieldcrypt_domain::value_objects::Argon2Params;

    fn processor() -> FieldProcessor {
        let pepper = Arc::new(Pepper::new(b"test-pepper-exactly-32-bytes-OK!".to_vec()).unwrap());
        let hasher = SecureHasher::new(Argon2Params::new(8192, 1, 1, 16, 32).unwrap()).unwrap();
        FieldProcessor::new(AesGcmCipher::new(), hasher, pepper)
    }

    fn dek() -> DataKey {
        DataKey::new([0x55; 32])
    }

    fn record(tags: &str) -> DynamicRecord {
        DynamicRecord::builder()
            .field("Email", tags, CanonicalValue::from("user@example.com"))
            .unwrap()
            .companion_fields("Email")
            .envelope()
            .build()
    }

    /// Tests encrypt: companion filled, source redacted, round trip
    /// restores.
    #[test]
    fn test_encrypt_and_redact() {
        let processor = processor();
        let mut rec = record("encrypt");
        let spec = rec.spec("Email").unwrap().clone();

        processor.process_field(&mut rec, &spec, &dek()).unwrap();
        assert_eq!(rec.get_string("Email").unwrap(), "");
        assert!(!rec.get_bytes("EmailEncrypted").unwrap().is_empty());

        processor.decrypt_field(&mut rec, &spec, &dek()).unwrap();
        assert_eq!(rec.get_string("Email").unwrap(), "user@example.com");
    }

    /// Tests hash_basic: companion holds the canonical fingerprint and the
    /// source is untouched.
    #[test]
    fn test_hash_basic_leaves_source() {
        let processor = processor();
        let mut rec = record("hash_basic");
        let spec = rec.spec("Email").unwrap().clone();

        processor.process_field(&mut rec, &spec, &dek()).unwrap();
        assert_eq!(rec.get_string("Email").unwrap(), "user@example.com");

        let expected =
            fingerprint::fingerprint_value(&CanonicalValue::from("user@example.com")).unwrap();
        assert_eq!(rec.get_string("EmailHash").unwrap(), expected);
    }

    /// Tests the combined tag set: the hash is computed from the ORIGINAL
    /// value even though the field is redacted afterwards.
    #[test]
    fn test_combined_tags_hash_before_redaction() {
        let processor = processor();
        let mut rec = record("encrypt,hash_basic");
        let spec = rec.spec("Email").unwrap().clone();

        processor.process_field(&mut rec, &spec, &dek()).unwrap();

        let expected =
            fingerprint::fingerprint_value(&CanonicalValue::from("user@example.com")).unwrap();
        assert_eq!(rec.get_string("EmailHash").unwrap(), expected);
        assert_eq!(rec.get_string("Email").unwrap(), "");
        assert!(!rec.get_bytes("EmailEncrypted").unwrap().is_empty());
    }

    /// Tests hash_secure: companion verifies through the hasher.
    #[test]
    fn test_hash_secure_verifiable() {
        let processor = processor();
        let mut rec = record("hash_secure");
        let spec = rec.spec("Email").unwrap().clone();

        processor.process_field(&mut rec, &spec, &dek()).unwrap();
        let stored = rec.get_string("EmailHash").unwrap();
        assert!(stored.starts_with("$argon2id$"));

        let canonical =
            canonical_serializer::serialize(&CanonicalValue::from("user@example.com")).unwrap();
        assert!(processor.verify_secure(&canonical, &stored).unwrap());
    }

    /// Tests decrypting an empty companion fails as invalid ciphertext.
    #[test]
    fn test_decrypt_empty_companion_rejected() {
        let processor = processor();
        let mut rec = record("encrypt");
        let spec = rec.spec("Email").unwrap().clone();

        let err = processor.decrypt_field(&mut rec, &spec, &dek()).unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed(_)));
    }

    /// Tests wrong-DEK decryption surfaces the authentication failure.
    #[test]
    fn test_decrypt_wrong_dek() {
        let processor = processor();
        let mut rec = record("encrypt");
        let spec = rec.spec("Email").unwrap().clone();

        processor.process_field(&mut rec, &spec, &dek()).unwrap();
        let wrong = DataKey::new([0x56; 32]);
        assert!(matches!(
            processor.decrypt_field(&mut rec, &spec, &wrong).unwrap_err(),
            CryptoError::DecryptionFailed(_)
        ));
    }
}
