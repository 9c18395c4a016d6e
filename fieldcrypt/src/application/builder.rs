// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Builder
//!
//! Declarative construction of the [`EnvelopeCrypto`] engine. The source
//! system consumed a list of runtime options; here the options are typed
//! builder methods, so unknown options are unrepresentable and conflicts
//! are rejected in [`EnvelopeCryptoBuilder::build`] before any collaborator
//! is touched.
//!
//! ## Options
//!
//! | Method | Effect |
//! |---|---|
//! | `kms_service` | bind a KMS client (required) |
//! | `kek_alias` | KEK alias, `[A-Za-z0-9_-]{1,256}` (required) |
//! | `pepper` | raw pepper bytes, [16, 256], non-zero |
//! | `pepper_secret_path` | fetch the pepper from the KMS secret store at build |
//! | `argon2_params` | override the secure-hash cost profile |
//! | `serializer_identity` | label recorded in metadata blobs |
//! | `key_metadata_repository` | wire an externally owned metadata store |
//! | `db_path` | directory for the default SQLite store |
//! | `db_filename` | file name for the default SQLite store |
//! | `observability_hook`, `metrics_collector` | optional collaborators |
//!
//! ## Conflicts
//!
//! `pepper` and `pepper_secret_path` are mutually exclusive and one is
//! required; `key_metadata_repository`, `db_path`, and `db_filename` are
//! mutually exclusive variants of the same concern.
//!
//! ## Defaults
//!
//! Argon2id at {64 MiB, 3 iterations, parallelism 4, salt 16, key 32}; a
//! SQLite store under a per-process subdirectory of the system temp dir;
//! no-op observability and metrics.
//!
//! `build()` finishes by running `ensure_initial` so the alias is usable
//! the moment construction returns.
//!
//! [`EnvelopeCrypto`]: super::envelope_crypto::EnvelopeCrypto

use std::path::PathBuf;
use std::sync::Arc;

use fieldcrypt_domain::repositories::KekVersionRepository;
use fieldcrypt_domain::services::canonical_serializer::SERIALIZER_ID;
use fieldcrypt_domain::services::{
    KmsService, MetricsCollector, NoopMetricsCollector, NoopObservabilityHook, ObservabilityHook,
};
use fieldcrypt_domain::value_objects::{Argon2Params, KekAlias, Pepper};
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::encryption::AesGcmCipher;
use crate::infrastructure::hashing::SecureHasher;
use crate::infrastructure::reliability::{HealthRegistry, ReliabilityPreset, ReliabilityService};
use crate::infrastructure::repositories::SqliteKekVersionRepository;
use crate::infrastructure::runtime::CancellationToken;

use super::envelope_crypto::EnvelopeCrypto;
use super::services::{DekService, FieldProcessor, KeyVersionManager, RecordProcessor};

/// Default file name of the SQLite metadata store
const DEFAULT_DB_FILENAME: &str = "kek_metadata.db";

/// Declarative options for constructing the engine.
#[derive(Default)]
pub struct EnvelopeCryptoBuilder {
    kms: Option<Arc<dyn KmsService>>,
    kek_alias: Option<String>,
    pepper: Option<Vec<u8>>,
    pepper_secret_path: Option<String>,
    argon2_params: Option<Argon2Params>,
    serializer_identity: Option<String>,
    repository: Option<Arc<dyn KekVersionRepository>>,
    db_path: Option<PathBuf>,
    db_filename: Option<String>,
    observability: Option<Arc<dyn ObservabilityHook>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
}

impl EnvelopeCryptoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the KMS client (required)
    pub fn kms_service(mut self, kms: Arc<dyn KmsService>) -> Self {
        self.kms = Some(kms);
        self
    }

    /// Sets the KEK alias (required)
    pub fn kek_alias(mut self, alias: impl Into<String>) -> Self {
        self.kek_alias = Some(alias.into());
        self
    }

    /// Supplies the pepper directly
    pub fn pepper(mut self, pepper: Vec<u8>) -> Self {
        self.pepper = Some(pepper);
        self
    }

    /// Fetches the pepper from the KMS secret store at build time
    pub fn pepper_secret_path(mut self, path: impl Into<String>) -> Self {
        self.pepper_secret_path = Some(path.into());
        self
    }

    /// Overrides the Argon2id cost profile
    pub fn argon2_params(mut self, params: Argon2Params) -> Self {
        self.argon2_params = Some(params);
        self
    }

    /// Labels the canonical serializer in metadata blobs
    pub fn serializer_identity(mut self, identity: impl Into<String>) -> Self {
        self.serializer_identity = Some(identity.into());
        self
    }

    /// Wires an externally owned metadata store
    pub fn key_metadata_repository(mut self, repository: Arc<dyn KekVersionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Places the default SQLite store in this directory
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    /// Names the default SQLite store file (kept in the default directory)
    pub fn db_filename(mut self, filename: impl Into<String>) -> Self {
        self.db_filename = Some(filename.into());
        self
    }

    /// Installs an observability hook
    pub fn observability_hook(mut self, hook: Arc<dyn ObservabilityHook>) -> Self {
        self.observability = Some(hook);
        self
    }

    /// Installs a metrics collector
    pub fn metrics_collector(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validates the configuration, wires every component, and initializes
    /// the alias.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for missing/conflicting options or invalid
    /// values; collaborator errors from the pepper fetch, store bootstrap,
    /// or `ensure_initial` propagate with their own kinds.
    pub async fn build(self) -> Result<EnvelopeCrypto, CryptoError> {
        let kms = self
            .kms
            .ok_or_else(|| CryptoError::invalid_config("kms_service is required"))?;
        let alias = KekAlias::new(
            self.kek_alias
                .ok_or_else(|| CryptoError::invalid_config("kek_alias is required"))?,
        )?;

        if self.pepper.is_some() && self.pepper_secret_path.is_some() {
            return Err(CryptoError::invalid_config(
                "pepper and pepper_secret_path are mutually exclusive",
            ));
        }
        if self.pepper.is_none() && self.pepper_secret_path.is_none() {
            return Err(CryptoError::invalid_config(
                "one of pepper or pepper_secret_path is required",
            ));
        }

        let db_variants = [
            self.repository.is_some(),
            self.db_path.is_some(),
            self.db_filename.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if db_variants > 1 {
            return Err(CryptoError::invalid_config(
                "key_metadata_repository, db_path, and db_filename are mutually exclusive",
            ));
        }

        let argon2_params = self.argon2_params.unwrap_or_default();
        argon2_params.validate()?;

        // Reliability services and the health rollup
        let kms_reliability = Arc::new(ReliabilityService::new("kms", ReliabilityPreset::kms()));
        let storage_reliability = Arc::new(ReliabilityService::new(
            "storage",
            ReliabilityPreset::storage(),
        ));
        let network_reliability = Arc::new(ReliabilityService::new(
            "network",
            ReliabilityPreset::network(),
        ));
        let health = Arc::new(HealthRegistry::new());
        health.register(kms_reliability.clone(), true);
        health.register(storage_reliability.clone(), true);
        health.register(network_reliability.clone(), false);

        let token = CancellationToken::new();

        // Pepper: direct bytes, or fetched through the KMS secret store
        let pepper_bytes = match (self.pepper, self.pepper_secret_path) {
            (Some(bytes), None) => bytes,
            (None, Some(path)) => kms_reliability
                .execute(&token, || kms.get_secret(&path))
                .await
                .map_err(|e| e.context("fetching pepper"))?,
            _ => unreachable!("validated above"),
        };
        let pepper = Arc::new(Pepper::new(pepper_bytes)?);

        // Metadata store: external, or the default SQLite store
        let repository: Arc<dyn KekVersionRepository> = match self.repository {
            Some(repository) => repository,
            None => {
                let (dir, filename) = match (self.db_path, self.db_filename) {
                    (Some(dir), None) => (dir, DEFAULT_DB_FILENAME.to_string()),
                    (None, Some(filename)) => (default_db_dir(), filename),
                    (None, None) => (default_db_dir(), DEFAULT_DB_FILENAME.to_string()),
                    (Some(_), Some(_)) => unreachable!("validated above"),
                };
                std::fs::create_dir_all(&dir).map_err(|e| {
                    CryptoError::storage_unavailable(format!(
                        "creating metadata directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
                Arc::new(SqliteKekVersionRepository::connect(&dir.join(filename)).await?)
            }
        };

        let observability = self
            .observability
            .unwrap_or_else(|| Arc::new(NoopObservabilityHook));
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(NoopMetricsCollector));

        let versions = Arc::new(KeyVersionManager::new(
            alias.clone(),
            repository,
            kms.clone(),
            kms_reliability.clone(),
            storage_reliability.clone(),
            observability.clone(),
        ));
        let dek_service = Arc::new(DekService::new(kms, kms_reliability));
        let fields = FieldProcessor::new(
            AesGcmCipher::new(),
            SecureHasher::new(argon2_params)?,
            pepper.clone(),
        );
        let processor = Arc::new(RecordProcessor::new(
            dek_service.clone(),
            versions.clone(),
            fields,
            observability,
            metrics,
        ));

        // Make the alias usable immediately
        versions.ensure_initial(&token).await?;

        tracing::info!(alias = %alias, "fieldcrypt engine initialized");
        Ok(EnvelopeCrypto::assemble(
            processor,
            dek_service,
            versions,
            pepper,
            argon2_params,
            self.serializer_identity
                .unwrap_or_else(|| SERIALIZER_ID.to_string()),
            health,
        ))
    }
}

/// Per-process subdirectory under the system temp dir
fn default_db_dir() -> PathBuf {
    std::env::temp_dir().join(format!("fieldcrypt-{}", std::process::id()))
}
