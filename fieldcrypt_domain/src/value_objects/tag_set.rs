// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tag Vocabulary
//!
//! Field annotations carry the literal key `encx` whose value is a
//! comma-separated subset of `{encrypt, hash_basic, hash_secure}`. This
//! module parses that vocabulary and owns the companion-field naming rules.
//!
//! ## Operations
//!
//! - `encrypt`: seal the canonical bytes under the record DEK into
//!   `F + "Encrypted"` and redact the source field afterwards
//! - `hash_basic`: deterministic SHA-256 fingerprint into `F + "Hash"`,
//!   suitable for equality lookup
//! - `hash_secure`: peppered Argon2id hash into `F + "Hash"`, suitable for
//!   authentication
//!
//! Operations on a single field are independent and tag order is irrelevant
//! to the outcome. `hash_basic` and `hash_secure` on the same field would
//! overwrite the same companion, so that combination is rejected as a
//! configuration error.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Annotation key recognized by record glue
pub const TAG_KEY: &str = "encx";

/// Reserved field: plaintext DEK holder (32 bytes, kept zeroed)
pub const DEK_FIELD: &str = "DEK";

/// Reserved field: KMS-wrapped DEK envelope
pub const DEK_ENCRYPTED_FIELD: &str = "DEKEncrypted";

/// Reserved field: KEK version the DEK was wrapped under
pub const KEY_VERSION_FIELD: &str = "KeyVersion";

/// Suffix of the ciphertext companion field
pub const ENCRYPTED_SUFFIX: &str = "Encrypted";

/// Suffix of the hash companion field
pub const HASH_SUFFIX: &str = "Hash";

/// One declared operation on a tagged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTag {
    Encrypt,
    HashBasic,
    HashSecure,
}

impl FieldTag {
    /// Parses a single tag token.
    pub fn parse(token: &str) -> Result<Self, CryptoError> {
        match token {
            "encrypt" => Ok(FieldTag::Encrypt),
            "hash_basic" => Ok(FieldTag::HashBasic),
            "hash_secure" => Ok(FieldTag::HashSecure),
            other => Err(CryptoError::invalid_config(format!(
                "unknown {} tag value '{}'",
                TAG_KEY, other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldTag::Encrypt => "encrypt",
            FieldTag::HashBasic => "hash_basic",
            FieldTag::HashSecure => "hash_secure",
        }
    }
}

impl std::fmt::Display for FieldTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed, deduplicated tag set for one field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<FieldTag>,
}

impl TagSet {
    /// Creates an empty tag set (untagged field)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a tag set from explicit tags, deduplicating while keeping
    /// first-seen order.
    pub fn from_tags(tags: impl IntoIterator<Item = FieldTag>) -> Self {
        let mut out = Vec::new();
        for tag in tags {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        Self { tags: out }
    }

    /// Parses a comma-separated tag value, tolerating whitespace around
    /// commas. An empty or whitespace-only value parses to the empty set.
    ///
    /// # Examples
    ///
    /// ```
    /// use fieldcrypt_domain::value_objects::{FieldTag, TagSet};
    ///
    /// let tags = TagSet::parse("encrypt, hash_basic").unwrap();
    /// assert!(tags.contains(FieldTag::Encrypt));
    /// assert!(tags.contains(FieldTag::HashBasic));
    ///
    /// assert!(TagSet::parse("encrypt,searchable").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, CryptoError> {
        let mut tags = Vec::new();
        for token in value.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let tag = FieldTag::parse(token)?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(Self { tags })
    }

    pub fn contains(&self, tag: FieldTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldTag> + '_ {
        self.tags.iter().copied()
    }

    /// Rejects combinations that cannot share companion fields.
    ///
    /// `hash_basic` and `hash_secure` both write `F + "Hash"`; declaring
    /// both on one field silently loses one of the outputs, so it is a
    /// configuration error.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.contains(FieldTag::HashBasic) && self.contains(FieldTag::HashSecure) {
            return Err(CryptoError::invalid_config(
                "hash_basic and hash_secure on the same field write the same companion",
            ));
        }
        Ok(())
    }
}

/// Returns the name of the ciphertext companion for a tagged field
pub fn encrypted_companion(field: &str) -> String {
    format!("{}{}", field, ENCRYPTED_SUFFIX)
}

/// Returns the name of the hash companion for a tagged field
pub fn hash_companion(field: &str) -> String {
    format!("{}{}", field, HASH_SUFFIX)
}

/// Returns true for the three reserved envelope field names
pub fn is_reserved_field(name: &str) -> bool {
    name == DEK_FIELD || name == DEK_ENCRYPTED_FIELD || name == KEY_VERSION_FIELD
}
