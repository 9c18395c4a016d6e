// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # KEK Version Repository Port
//!
//! Persistence contract for the single logical table behind the key-version
//! manager:
//!
//! ```sql
//! CREATE TABLE kek_versions (
//!     alias         TEXT      NOT NULL,
//!     version       INTEGER   NOT NULL,
//!     kms_key_id    TEXT      NOT NULL,
//!     is_deprecated BOOLEAN   NOT NULL DEFAULT FALSE,
//!     created_at    TIMESTAMP NOT NULL,
//!     UNIQUE (alias, version)
//! );
//! ```
//!
//! Implementations issue parameterized statements only. The uniqueness
//! constraint on (alias, version) is part of the contract; it backs the
//! serialization of concurrent rotations.
//!
//! ## Error Mapping
//!
//! Engine failures surface as `StorageUnavailable` so the storage-class
//! reliability budget applies. Absent rows are expressed as `Ok(None)`, not
//! errors; the key-version manager decides what absence means.

use async_trait::async_trait;

use crate::entities::KekVersionRecord;
use crate::error::CryptoError;
use crate::value_objects::{KekAlias, KeyVersion};

/// SQL-shaped store of KEK version rows.
#[async_trait]
pub trait KekVersionRepository: Send + Sync {
    /// Finds the single non-deprecated row for the alias, or `None` when
    /// the alias has no rows yet.
    async fn find_current(&self, alias: &KekAlias) -> Result<Option<KekVersionRecord>, CryptoError>;

    /// Finds a specific (alias, version) row.
    async fn find_by_version(
        &self,
        alias: &KekAlias,
        version: KeyVersion,
    ) -> Result<Option<KekVersionRecord>, CryptoError>;

    /// Inserts a new version row. Fails on a duplicate (alias, version).
    async fn insert(&self, record: &KekVersionRecord) -> Result<(), CryptoError>;

    /// Atomically deprecates `deprecate` and inserts `insert` for the same
    /// alias. Both writes happen in one transaction: either the rotation is
    /// fully recorded or the store is unchanged.
    async fn rotate(
        &self,
        alias: &KekAlias,
        deprecate: KeyVersion,
        insert: &KekVersionRecord,
    ) -> Result<(), CryptoError>;
}
