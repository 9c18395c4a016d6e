// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DEK Service
//!
//! The per-record key lifecycle: generate a fresh 32-byte DEK from the
//! system CSPRNG, wrap it through the KMS under the alias's current KEK
//! version, and unwrap it later bound to the version the record stored.
//!
//! Decryption is always bound to a specific stored version so rotation
//! never invalidates at-rest data: the wrapped DEK and its version travel
//! together on the record.

use std::sync::Arc;

use ring::rand::{SecureRandom, SystemRandom};

use fieldcrypt_domain::services::KmsService;
use fieldcrypt_domain::value_objects::{DataKey, KeyVersion, DEK_LENGTH};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::reliability::ReliabilityService;
use crate::infrastructure::runtime::CancellationToken;

use super::key_version_manager::KeyVersionManager;

/// Generates, wraps, and unwraps per-record data-encryption keys.
pub struct DekService {
    kms: Arc<dyn KmsService>,
    kms_reliability: Arc<ReliabilityService>,
    rng: SystemRandom,
}

impl DekService {
    pub fn new(kms: Arc<dyn KmsService>, kms_reliability: Arc<ReliabilityService>) -> Self {
        Self {
            kms,
            kms_reliability,
            rng: SystemRandom::new(),
        }
    }

    /// Generates a fresh random DEK.
    ///
    /// # Errors
    ///
    /// RNG failure is fatal (`EncryptionFailed`); an exhausted or broken
    /// system CSPRNG must never silently degrade key quality.
    pub fn generate_dek(&self) -> Result<DataKey, CryptoError> {
        let mut bytes = [0u8; DEK_LENGTH];
        self.rng
            .fill(&mut bytes)
            .map_err(|e| CryptoError::encryption_failed(format!("DEK generation failed: {:?}", e)))?;
        Ok(DataKey::new(bytes))
    }

    /// Wraps a plaintext DEK under the alias's current KEK version,
    /// returning the opaque wrapped bytes and the version used.
    pub async fn wrap_dek(
        &self,
        token: &CancellationToken,
        dek: &DataKey,
        versions: &KeyVersionManager,
    ) -> Result<(Vec<u8>, KeyVersion), CryptoError> {
        let current = versions.current_key(token).await.map_err(|e| e.context("wrap_dek"))?;
        let wrapped = self
            .kms_reliability
            .execute(token, || self.kms.encrypt_dek(&current.kms_key_id, dek.as_bytes()))
            .await
            .map_err(|e| {
                e.context(&format!(
                    "wrap_dek (alias '{}', version {})",
                    versions.alias(),
                    current.version
                ))
            })?;
        Ok((wrapped, current.version))
    }

    /// Unwraps a wrapped DEK bound to the specific version the record was
    /// encrypted under.
    ///
    /// # Errors
    ///
    /// - `NotFound` when (alias, version) is absent from the metadata store
    /// - `DecryptionFailed` when the KMS returns anything but 32 bytes
    pub async fn unwrap_dek(
        &self,
        token: &CancellationToken,
        wrapped: &[u8],
        version: KeyVersion,
        versions: &KeyVersionManager,
    ) -> Result<DataKey, CryptoError> {
        let key_id = versions
            .kms_key_id_for_version(token, version)
            .await
            .map_err(|e| e.context("unwrap_dek"))?;
        let plaintext = self
            .kms_reliability
            .execute(token, || self.kms.decrypt_dek(&key_id, wrapped))
            .await
            .map_err(|e| {
                e.context(&format!(
                    "unwrap_dek (alias '{}', version {})",
                    versions.alias(),
                    version
                ))
            })?;
        DataKey::from_slice(&plaintext)
    }
}
