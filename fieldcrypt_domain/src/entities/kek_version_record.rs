// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # KEK Version Record Entity
//!
//! One row of the key-version metadata store: the binding between a KEK
//! alias, a monotonic version, and the KMS key id that version resolves to.
//!
//! ## Invariants
//!
//! - For each alias, versions are contiguous integers starting at 1
//! - Exactly one version per alias is non-deprecated ("current")
//! - (alias, version) is unique
//! - The KMS key id is non-empty
//!
//! The store enforces uniqueness; this entity enforces the local field
//! rules at construction.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::value_objects::{KekAlias, KeyVersion};

/// A (alias, version, kms_key_id, is_deprecated, created_at) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KekVersionRecord {
    pub alias: KekAlias,
    pub version: KeyVersion,
    pub kms_key_id: String,
    pub is_deprecated: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl KekVersionRecord {
    /// Creates a fresh, current (non-deprecated) version row.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Validation` when the KMS key id is empty.
    pub fn new(
        alias: KekAlias,
        version: KeyVersion,
        kms_key_id: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        let kms_key_id = kms_key_id.into();
        if kms_key_id.trim().is_empty() {
            return Err(CryptoError::validation("KMS key id must not be empty"));
        }
        Ok(Self {
            alias,
            version,
            kms_key_id,
            is_deprecated: false,
            created_at: chrono::Utc::now(),
        })
    }

    /// Returns true when this row is the current version for its alias
    pub fn is_current(&self) -> bool {
        !self.is_deprecated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_current() {
        let alias = KekAlias::new("app").unwrap();
        let record = KekVersionRecord::new(alias, KeyVersion::INITIAL, "kms-key-1").unwrap();
        assert!(record.is_current());
        assert!(!record.is_deprecated);
    }

    #[test]
    fn test_empty_key_id_rejected() {
        let alias = KekAlias::new("app").unwrap();
        assert!(KekVersionRecord::new(alias.clone(), KeyVersion::INITIAL, "").is_err());
        assert!(KekVersionRecord::new(alias, KeyVersion::INITIAL, "   ").is_err());
    }
}
