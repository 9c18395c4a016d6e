// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # KEK Alias Value Object
//!
//! Type-safe identifier for a Key Encryption Key. Versions pivot under an
//! alias: the alias is stable for the lifetime of a deployment while the
//! underlying KMS key id changes on every rotation.
//!
//! ## Validation Rules
//!
//! - Length between 1 and 256 characters
//! - Characters restricted to `[A-Za-z0-9_-]`
//! - No whitespace-only or empty values
//!
//! An alias that exists is a valid alias; construction is the only
//! validation point.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

static ALIAS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,256}$").expect("alias pattern is valid"));

/// Maximum alias length in characters
pub const MAX_ALIAS_LENGTH: usize = 256;

/// Validated KEK alias.
///
/// # Examples
///
/// ```
/// use fieldcrypt_domain::value_objects::KekAlias;
///
/// let alias = KekAlias::new("customer-data").unwrap();
/// assert_eq!(alias.as_str(), "customer-data");
///
/// assert!(KekAlias::new("").is_err());
/// assert!(KekAlias::new("has spaces").is_err());
/// assert!(KekAlias::new("dollar$sign").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KekAlias(String);

impl KekAlias {
    /// Creates a validated alias.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidConfiguration` when the alias is empty,
    /// longer than 256 characters, or contains characters outside
    /// `[A-Za-z0-9_-]`.
    pub fn new(alias: impl Into<String>) -> Result<Self, CryptoError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(CryptoError::invalid_config("KEK alias must not be empty"));
        }
        if alias.len() > MAX_ALIAS_LENGTH {
            return Err(CryptoError::invalid_config(format!(
                "KEK alias exceeds {} characters: {} characters",
                MAX_ALIAS_LENGTH,
                alias.len()
            )));
        }
        if !ALIAS_PATTERN.is_match(&alias) {
            return Err(CryptoError::invalid_config(format!(
                "KEK alias '{}' contains characters outside [A-Za-z0-9_-]",
                alias
            )));
        }
        Ok(Self(alias))
    }

    /// Returns the alias as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KekAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for KekAlias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests alias creation with valid shapes.
    #[test]
    fn test_alias_valid_cases() {
        for candidate in ["app", "customer-data", "Tenant_7", "a", &"x".repeat(256)] {
            assert!(KekAlias::new(candidate).is_ok(), "{} should be valid", candidate);
        }
    }

    /// Tests alias rejection: emptiness, length, and character set.
    #[test]
    fn test_alias_invalid_cases() {
        for candidate in ["", "  ", "white space", "sla/sh", "dot.ted", "émoji", &"x".repeat(257)] {
            assert!(
                KekAlias::new(candidate).is_err(),
                "{:?} should be rejected",
                candidate
            );
        }
    }

    #[test]
    fn test_alias_display_roundtrip() {
        let alias = KekAlias::new("payments").unwrap();
        assert_eq!(alias.to_string(), "payments");
        assert_eq!(alias.as_ref(), "payments");
    }
}
