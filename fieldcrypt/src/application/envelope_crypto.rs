// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Envelope Crypto Facade
//!
//! The top-level handle callers hold. One instance owns the whole stack:
//! record and batch processing, KEK rotation, standalone hash/verify
//! helpers, stream encryption, and the health surface. Everything is
//! constructed through [`EnvelopeCryptoBuilder`]; there are no process-wide
//! singletons.
//!
//! Instances are `Send + Sync` and meant to be shared behind an `Arc`
//! across tasks; the pepper, Argon2 profile, and alias are immutable after
//! construction.
//!
//! [`EnvelopeCryptoBuilder`]: super::builder::EnvelopeCryptoBuilder

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use fieldcrypt_domain::entities::ProtectedRecord;
use fieldcrypt_domain::services::{canonical_serializer, fingerprint};
use fieldcrypt_domain::value_objects::{
    Argon2Params, CanonicalValue, DataKey, EncryptionMetadata, KekAlias, KeyVersion, Pepper,
};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::encryption::stream;
use crate::infrastructure::reliability::{HealthRegistry, HealthReport};
use crate::infrastructure::runtime::CancellationToken;

use super::services::batch_executor::{
    BatchConfig, BatchExecutor, BatchResult, ProgressCallback,
};
use super::services::{DekService, KeyVersionManager, RecordProcessor};

/// The assembled envelope-encryption engine.
pub struct EnvelopeCrypto {
    processor: Arc<RecordProcessor>,
    dek_service: Arc<DekService>,
    versions: Arc<KeyVersionManager>,
    pepper: Arc<Pepper>,
    argon2_params: Argon2Params,
    serializer_identity: String,
    health: Arc<HealthRegistry>,
}

impl std::fmt::Debug for EnvelopeCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCrypto")
            .field("alias", self.alias())
            .field("argon2_params", &self.argon2_params)
            .field("serializer_identity", &self.serializer_identity)
            .finish_non_exhaustive()
    }
}

impl EnvelopeCrypto {
    /// Called by the builder once every component is wired.
    pub(crate) fn assemble(
        processor: Arc<RecordProcessor>,
        dek_service: Arc<DekService>,
        versions: Arc<KeyVersionManager>,
        pepper: Arc<Pepper>,
        argon2_params: Argon2Params,
        serializer_identity: String,
        health: Arc<HealthRegistry>,
    ) -> Self {
        Self {
            processor,
            dek_service,
            versions,
            pepper,
            argon2_params,
            serializer_identity,
            health,
        }
    }

    /// The configured KEK alias
    pub fn alias(&self) -> &KekAlias {
        self.versions.alias()
    }

    /// The active Argon2id profile
    pub fn argon2_params(&self) -> &Argon2Params {
        &self.argon2_params
    }

    // ---------------------------------------------------------------------
    // Record operations
    // ---------------------------------------------------------------------

    /// Encrypts one record in place: tagged fields are hashed/encrypted
    /// into their companions, encrypted sources are redacted, and the DEK
    /// envelope is written.
    pub async fn encrypt_record(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        self.processor.encrypt_record(token, record).await
    }

    /// Decrypts one record in place using the KEK version recorded on the
    /// record.
    pub async fn decrypt_record(
        &self,
        token: &CancellationToken,
        record: &mut dyn ProtectedRecord,
    ) -> Result<(), CryptoError> {
        self.processor.decrypt_record(token, record).await
    }

    // ---------------------------------------------------------------------
    // Batch operations
    // ---------------------------------------------------------------------

    /// Encrypts a collection with bounded concurrency.
    pub async fn encrypt_batch<R>(
        &self,
        token: &CancellationToken,
        records: Vec<R>,
        config: BatchConfig,
        progress: Option<ProgressCallback>,
    ) -> BatchResult<R>
    where
        R: ProtectedRecord + 'static,
    {
        BatchExecutor::new(self.processor.clone(), config)
            .encrypt_batch(token, records, progress)
            .await
    }

    /// Decrypts a collection with bounded concurrency.
    pub async fn decrypt_batch<R>(
        &self,
        token: &CancellationToken,
        records: Vec<R>,
        config: BatchConfig,
        progress: Option<ProgressCallback>,
    ) -> BatchResult<R>
    where
        R: ProtectedRecord + 'static,
    {
        BatchExecutor::new(self.processor.clone(), config)
            .decrypt_batch(token, records, progress)
            .await
    }

    // ---------------------------------------------------------------------
    // Standalone hashing
    // ---------------------------------------------------------------------

    /// Deterministic SHA-256 fingerprint of a value's canonical form.
    pub fn hash_basic(&self, value: &CanonicalValue) -> Result<String, CryptoError> {
        fingerprint::fingerprint_value(value)
    }

    /// Verifies a value against a stored fingerprint.
    pub fn verify_basic(&self, value: &CanonicalValue, stored: &str) -> Result<bool, CryptoError> {
        require_present(value)?;
        fingerprint::verify_fingerprint(value, stored)
    }

    /// Peppered Argon2id hash of a value's canonical form.
    pub fn hash_secure(&self, value: &CanonicalValue) -> Result<String, CryptoError> {
        let canonical = canonical_serializer::serialize(value)?;
        self.processor.field_processor().hash_secure(&canonical)
    }

    /// Verifies a value against a stored secure hash at the parameters the
    /// hash was produced with.
    pub fn verify_secure(&self, value: &CanonicalValue, stored: &str) -> Result<bool, CryptoError> {
        require_present(value)?;
        let canonical = canonical_serializer::serialize(value)?;
        self.processor.field_processor().verify_secure(&canonical, stored)
    }

    // ---------------------------------------------------------------------
    // Stream operations
    // ---------------------------------------------------------------------

    /// Generates a standalone DEK for stream use.
    pub fn generate_dek(&self) -> Result<DataKey, CryptoError> {
        self.dek_service.generate_dek()
    }

    /// Encrypts a stream under a DEK in length-framed sealed chunks.
    pub async fn encrypt_stream<R, W>(
        &self,
        token: &CancellationToken,
        dek: &DataKey,
        reader: &mut R,
        writer: &mut W,
        chunk_size: usize,
    ) -> Result<u64, CryptoError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        stream::encrypt_stream(
            self.processor.field_processor().cipher(),
            dek,
            token,
            reader,
            writer,
            chunk_size,
        )
        .await
    }

    /// Decrypts a length-framed stream under a DEK.
    pub async fn decrypt_stream<R, W>(
        &self,
        token: &CancellationToken,
        dek: &DataKey,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<u64, CryptoError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        stream::decrypt_stream(
            self.processor.field_processor().cipher(),
            dek,
            token,
            reader,
            writer,
        )
        .await
    }

    // ---------------------------------------------------------------------
    // Key hierarchy
    // ---------------------------------------------------------------------

    /// Rotates the KEK: the current version is deprecated and a successor
    /// becomes current. Existing records stay decryptable.
    pub async fn rotate_kek(&self, token: &CancellationToken) -> Result<KeyVersion, CryptoError> {
        self.versions.rotate(token).await
    }

    /// The alias's current KEK version (`None` before initialization,
    /// which `build()` normally rules out).
    pub async fn current_key_version(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<KeyVersion>, CryptoError> {
        self.versions.current_version(token).await
    }

    // ---------------------------------------------------------------------
    // Health and metadata
    // ---------------------------------------------------------------------

    /// Point-in-time health rollup over the reliability services.
    pub fn health_report(&self) -> HealthReport {
        self.health.report()
    }

    /// Builds the portable metadata blob for a record sealed now.
    pub fn metadata(&self) -> EncryptionMetadata {
        EncryptionMetadata::now(self.serializer_identity.clone(), self.alias().as_str())
    }

    /// The pepper length in bytes (the pepper itself is never exposed)
    pub fn pepper_len(&self) -> usize {
        self.pepper.len()
    }
}

/// Rejects absent optional values handed to a verifier.
fn require_present(value: &CanonicalValue) -> Result<(), CryptoError> {
    if let CanonicalValue::Optional(_, None) = value {
        return Err(CryptoError::validation(
            "cannot verify an absent value against a stored hash",
        ));
    }
    Ok(())
}
