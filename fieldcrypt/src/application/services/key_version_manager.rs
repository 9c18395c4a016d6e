// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key-Version Manager
//!
//! The per-alias state machine of the KEK hierarchy:
//!
//! ```text
//! absent ──ensure_initial──> version 1 (current)
//! version N (current) ──rotate──> version N deprecated, version N+1 current
//! ```
//!
//! Every DEK is wrapped under the alias's current version and every record
//! stores that version, so decryption resolves the same KMS key id after
//! any number of rotations; deprecation never invalidates at-rest data.
//!
//! ## Concurrency
//!
//! Mutating operations (`ensure_initial`, `rotate`) are serialized per
//! manager through an async mutex, and the store's (alias, version)
//! uniqueness constraint serializes racing processes: the loser's insert
//! fails and the alias history never forks. Read operations are fully
//! concurrent.
//!
//! ## Failure Windows
//!
//! The KMS create happens before the transactional store write, so the only
//! non-atomic residue of a failed rotation is a KMS key with no store row.
//! That state is recoverable: the next `rotate` creates a fresh key and the
//! orphan is never referenced.

use std::sync::Arc;

use tokio::sync::Mutex;

use fieldcrypt_domain::entities::KekVersionRecord;
use fieldcrypt_domain::repositories::KekVersionRepository;
use fieldcrypt_domain::services::observability::Attributes;
use fieldcrypt_domain::services::{KmsService, ObservabilityHook};
use fieldcrypt_domain::value_objects::{KekAlias, KeyVersion};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::reliability::ReliabilityService;
use crate::infrastructure::runtime::CancellationToken;

/// Resolves and advances KEK versions for one alias.
pub struct KeyVersionManager {
    alias: KekAlias,
    repository: Arc<dyn KekVersionRepository>,
    kms: Arc<dyn KmsService>,
    kms_reliability: Arc<ReliabilityService>,
    storage_reliability: Arc<ReliabilityService>,
    observability: Arc<dyn ObservabilityHook>,
    /// Serializes ensure_initial and rotate on this manager
    mutation_lock: Mutex<()>,
}

impl KeyVersionManager {
    pub fn new(
        alias: KekAlias,
        repository: Arc<dyn KekVersionRepository>,
        kms: Arc<dyn KmsService>,
        kms_reliability: Arc<ReliabilityService>,
        storage_reliability: Arc<ReliabilityService>,
        observability: Arc<dyn ObservabilityHook>,
    ) -> Self {
        Self {
            alias,
            repository,
            kms,
            kms_reliability,
            storage_reliability,
            observability,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn alias(&self) -> &KekAlias {
        &self.alias
    }

    /// Returns the current (non-deprecated) version, or `None` when the
    /// alias has never been initialized.
    pub async fn current_version(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<KeyVersion>, CryptoError> {
        Ok(self.find_current(token).await?.map(|r| r.version))
    }

    /// Returns the current version row, failing with `NotFound` when the
    /// alias is uninitialized.
    pub async fn current_key(
        &self,
        token: &CancellationToken,
    ) -> Result<KekVersionRecord, CryptoError> {
        self.find_current(token).await?.ok_or_else(|| {
            CryptoError::NotFound(format!(
                "alias '{}' has no current KEK version; ensure_initial was never run",
                self.alias
            ))
        })
    }

    /// Resolves the KMS key id for a specific (alias, version), deprecated
    /// or not.
    pub async fn kms_key_id_for_version(
        &self,
        token: &CancellationToken,
        version: KeyVersion,
    ) -> Result<String, CryptoError> {
        let record = self
            .storage_reliability
            .execute(token, || self.repository.find_by_version(&self.alias, version))
            .await
            .map_err(|e| e.context("kms_key_id_for_version"))?;
        record.map(|r| r.kms_key_id).ok_or_else(|| {
            CryptoError::NotFound(format!(
                "KEK version {} not found for alias '{}'",
                version, self.alias
            ))
        })
    }

    /// Ensures the alias has a version 1, adopting a pre-existing KMS key
    /// when the provider already holds one. Idempotent.
    pub async fn ensure_initial(
        &self,
        token: &CancellationToken,
    ) -> Result<KeyVersion, CryptoError> {
        let _guard = self.mutation_lock.lock().await;

        if let Some(record) = self.find_current(token).await? {
            return Ok(record.version);
        }

        let existing = self
            .kms_reliability
            .execute(token, || self.kms.get_key_id(self.alias.as_str()))
            .await
            .map_err(|e| e.context("ensure_initial"))?;

        let key_id = match existing {
            Some(key_id) => {
                tracing::debug!(alias = %self.alias, "adopting pre-existing KMS key");
                key_id
            }
            None => self
                .kms_reliability
                .execute(token, || self.kms.create_key(self.alias.as_str()))
                .await
                .map_err(|e| e.context("ensure_initial"))?,
        };

        let record = KekVersionRecord::new(self.alias.clone(), KeyVersion::INITIAL, key_id)?;
        self.storage_reliability
            .execute(token, || self.repository.insert(&record))
            .await
            .map_err(|e| e.context("ensure_initial"))?;

        tracing::info!(alias = %self.alias, version = 1, "initialized KEK alias");
        self.observability.on_key_operation(
            "ensure_initial",
            self.alias.as_str(),
            1,
            &Attributes::new(),
        );
        Ok(KeyVersion::INITIAL)
    }

    /// Rotates the alias: creates a new KMS key, deprecates the current
    /// version, and records the successor, with both store writes in one
    /// transaction.
    pub async fn rotate(&self, token: &CancellationToken) -> Result<KeyVersion, CryptoError> {
        let _guard = self.mutation_lock.lock().await;
        token.error_if_cancelled("rotate")?;

        let current = self.current_key(token).await.map_err(|e| e.context("rotate"))?;
        let next = current.version.next();

        let new_key_id = self
            .kms_reliability
            .execute(token, || self.kms.create_key(self.alias.as_str()))
            .await
            .map_err(|e| e.context("rotate"))?;

        let record = KekVersionRecord::new(self.alias.clone(), next, new_key_id)?;
        self.storage_reliability
            .execute(token, || {
                self.repository.rotate(&self.alias, current.version, &record)
            })
            .await
            .map_err(|e| e.context("rotate"))?;

        tracing::info!(
            alias = %self.alias,
            deprecated = current.version.value(),
            current = next.value(),
            "rotated KEK"
        );
        self.observability.on_key_operation(
            "rotate",
            self.alias.as_str(),
            next.value(),
            &Attributes::new(),
        );
        Ok(next)
    }

    async fn find_current(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<KekVersionRecord>, CryptoError> {
        self.storage_reliability
            .execute(token, || self.repository.find_current(&self.alias))
            .await
            .map_err(|e| e.context("current_version"))
    }
}
