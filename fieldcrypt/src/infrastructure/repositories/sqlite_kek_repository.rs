// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # SQLite Key-Version Repository
//!
//! Default implementation of the key-version metadata port on SQLite via
//! `sqlx`. The schema is created on connect; every statement is
//! parameterized; the rotation write (deprecate old + insert new) runs in
//! one transaction so a crash can never leave an alias with zero or two
//! current versions.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kek_versions (
//!     alias         TEXT      NOT NULL,
//!     version       INTEGER   NOT NULL,
//!     kms_key_id    TEXT      NOT NULL,
//!     is_deprecated BOOLEAN   NOT NULL DEFAULT FALSE,
//!     created_at    TIMESTAMP NOT NULL,
//!     UNIQUE (alias, version)
//! );
//! ```
//!
//! The UNIQUE constraint backs rotation serialization: two racing rotations
//! compute the same successor version and the second insert fails instead
//! of forking the version history.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use fieldcrypt_domain::entities::KekVersionRecord;
use fieldcrypt_domain::repositories::KekVersionRepository;
use fieldcrypt_domain::value_objects::{KekAlias, KeyVersion};
use fieldcrypt_domain::CryptoError;

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS kek_versions (
    alias         TEXT      NOT NULL,
    version       INTEGER   NOT NULL,
    kms_key_id    TEXT      NOT NULL,
    is_deprecated BOOLEAN   NOT NULL DEFAULT FALSE,
    created_at    TIMESTAMP NOT NULL,
    UNIQUE (alias, version)
)";

const CREATE_INDEX: &str = "\
CREATE INDEX IF NOT EXISTS idx_kek_versions_current
    ON kek_versions (alias, is_deprecated)";

/// SQLite-backed key-version store.
pub struct SqliteKekVersionRepository {
    pool: SqlitePool,
}

impl SqliteKekVersionRepository {
    /// Opens (creating if missing) a file-backed store.
    pub async fn connect(path: &Path) -> Result<Self, CryptoError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                CryptoError::storage_unavailable(format!(
                    "opening metadata store {}: {}",
                    path.display(),
                    e
                ))
            })?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Opens an in-memory store (tests, throwaway environments).
    pub async fn in_memory() -> Result<Self, CryptoError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CryptoError::storage_unavailable(format!("opening in-memory store: {}", e))
            })?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CryptoError> {
        for statement in [CREATE_TABLE, CREATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| CryptoError::storage_unavailable(format!("creating schema: {}", e)))?;
        }
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<KekVersionRecord, CryptoError> {
        let alias: String = row
            .try_get("alias")
            .map_err(|e| CryptoError::storage_unavailable(format!("reading alias: {}", e)))?;
        let version: i64 = row
            .try_get("version")
            .map_err(|e| CryptoError::storage_unavailable(format!("reading version: {}", e)))?;
        let kms_key_id: String = row
            .try_get("kms_key_id")
            .map_err(|e| CryptoError::storage_unavailable(format!("reading kms_key_id: {}", e)))?;
        let is_deprecated: bool = row.try_get("is_deprecated").map_err(|e| {
            CryptoError::storage_unavailable(format!("reading is_deprecated: {}", e))
        })?;
        let created_at: chrono::DateTime<chrono::Utc> = row
            .try_get("created_at")
            .map_err(|e| CryptoError::storage_unavailable(format!("reading created_at: {}", e)))?;

        Ok(KekVersionRecord {
            alias: KekAlias::new(alias)?,
            version: KeyVersion::new(u32::try_from(version).map_err(|_| {
                CryptoError::storage_unavailable(format!("stored version {} out of range", version))
            })?)?,
            kms_key_id,
            is_deprecated,
            created_at,
        })
    }
}

#[async_trait]
impl KekVersionRepository for SqliteKekVersionRepository {
    async fn find_current(
        &self,
        alias: &KekAlias,
    ) -> Result<Option<KekVersionRecord>, CryptoError> {
        let row = sqlx::query(
            "SELECT alias, version, kms_key_id, is_deprecated, created_at \
             FROM kek_versions WHERE alias = ? AND is_deprecated = FALSE",
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CryptoError::storage_unavailable(format!("find_current: {}", e)))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_version(
        &self,
        alias: &KekAlias,
        version: KeyVersion,
    ) -> Result<Option<KekVersionRecord>, CryptoError> {
        let row = sqlx::query(
            "SELECT alias, version, kms_key_id, is_deprecated, created_at \
             FROM kek_versions WHERE alias = ? AND version = ?",
        )
        .bind(alias.as_str())
        .bind(i64::from(version.value()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CryptoError::storage_unavailable(format!("find_by_version: {}", e)))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn insert(&self, record: &KekVersionRecord) -> Result<(), CryptoError> {
        sqlx::query(
            "INSERT INTO kek_versions (alias, version, kms_key_id, is_deprecated, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.alias.as_str())
        .bind(i64::from(record.version.value()))
        .bind(&record.kms_key_id)
        .bind(record.is_deprecated)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CryptoError::storage_unavailable(format!("insert: {}", e)))?;
        Ok(())
    }

    async fn rotate(
        &self,
        alias: &KekAlias,
        deprecate: KeyVersion,
        insert: &KekVersionRecord,
    ) -> Result<(), CryptoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CryptoError::storage_unavailable(format!("rotate begin: {}", e)))?;

        sqlx::query(
            "UPDATE kek_versions SET is_deprecated = TRUE WHERE alias = ? AND version = ?",
        )
        .bind(alias.as_str())
        .bind(i64::from(deprecate.value()))
        .execute(&mut *tx)
        .await
        .map_err(|e| CryptoError::storage_unavailable(format!("rotate deprecate: {}", e)))?;

        sqlx::query(
            "INSERT INTO kek_versions (alias, version, kms_key_id, is_deprecated, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(insert.alias.as_str())
        .bind(i64::from(insert.version.value()))
        .bind(&insert.kms_key_id)
        .bind(insert.is_deprecated)
        .bind(insert.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| CryptoError::storage_unavailable(format!("rotate insert: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| CryptoError::storage_unavailable(format!("rotate commit: {}", e)))?;
        Ok(())
    }
}
