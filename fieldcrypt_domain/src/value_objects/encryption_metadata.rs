// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Encryption Metadata Blob
//!
//! Optional portable envelope stored alongside a record by callers that opt
//! in. It records enough producer identity to debug cross-version decryption
//! issues: which serializer produced the canonical bytes, which pepper
//! generation and KEK alias were active, and when the record was sealed.
//! The blob is advisory; the decrypt path never requires it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CryptoError;

/// Portable key/value metadata describing one encryption pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Label of the canonical serializer that produced hash/cipher inputs
    pub serializer_id: String,
    /// Pepper generation active at encryption time
    pub pepper_version: u32,
    /// KEK alias the DEK was wrapped under
    pub kek_alias: String,
    /// When the record was sealed
    pub encrypted_at: chrono::DateTime<chrono::Utc>,
    /// Version of the producing library
    pub producer_version: String,
}

impl EncryptionMetadata {
    /// Builds a metadata blob stamped with the current time and this
    /// library's version.
    pub fn now(serializer_id: impl Into<String>, kek_alias: impl Into<String>) -> Self {
        Self {
            serializer_id: serializer_id.into(),
            pepper_version: 1,
            kek_alias: kek_alias.into(),
            encrypted_at: chrono::Utc::now(),
            producer_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serializes to the portable textual map form (JSON)
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self)
            .map_err(|e| CryptoError::Serialization(format!("metadata encode: {}", e)))
    }

    /// Parses the portable textual map form
    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Serialization(format!("metadata decode: {}", e)))
    }

    /// Flattens to string pairs for observability attributes
    pub fn as_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("serializer_id".into(), self.serializer_id.clone());
        attrs.insert("pepper_version".into(), self.pepper_version.to_string());
        attrs.insert("kek_alias".into(), self.kek_alias.clone());
        attrs.insert("encrypted_at".into(), self.encrypted_at.to_rfc3339());
        attrs.insert("producer_version".into(), self.producer_version.clone());
        attrs
    }
}
