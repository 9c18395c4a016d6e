// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fingerprint Hash
//!
//! Deterministic SHA-256 over canonical bytes, hex-encoded lowercase. This
//! is the `hash_basic` operation: it supports equality lookup across records
//! and over time, which is exactly why the pepper is NOT applied here. Use
//! the peppered secure hash for anything an attacker could brute-force.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;
use crate::services::canonical_serializer;
use crate::value_objects::CanonicalValue;

/// Computes the lowercase-hex SHA-256 fingerprint of canonical bytes.
pub fn fingerprint_bytes(canonical: &[u8]) -> String {
    let digest = Sha256::digest(canonical);
    hex::encode(digest)
}

/// Canonicalizes a value and computes its fingerprint.
pub fn fingerprint_value(value: &CanonicalValue) -> Result<String, CryptoError> {
    let canonical = canonical_serializer::serialize(value)?;
    Ok(fingerprint_bytes(&canonical))
}

/// Verifies a runtime value against a stored fingerprint.
///
/// The value is re-serialized through the same canonical encoding used at
/// hash time, then compared in constant time. A malformed stored hash is a
/// mismatch, not an error.
///
/// # Errors
///
/// Returns `CryptoError::Validation` when the stored hash is empty; that is
/// a caller bug rather than a mismatch.
pub fn verify_fingerprint(value: &CanonicalValue, stored: &str) -> Result<bool, CryptoError> {
    if stored.is_empty() {
        return Err(CryptoError::validation(
            "stored fingerprint is empty; nothing to compare against",
        ));
    }
    let computed = fingerprint_value(value)?;
    Ok(computed.as_bytes().ct_eq(stored.as_bytes()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Pepper;

    /// Tests determinism: the fingerprint is a function of the value alone.
    #[test]
    fn test_fingerprint_is_deterministic() {
        let value = CanonicalValue::from("user@example.com");
        let first = fingerprint_value(&value).unwrap();
        let second = fingerprint_value(&value).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Tests independence from the pepper: two deployments with different
    /// peppers compute the same fingerprint.
    #[test]
    fn test_fingerprint_ignores_pepper() {
        let _p1 = Pepper::new(vec![1u8; 32]).unwrap();
        let _p2 = Pepper::new(vec![2u8; 32]).unwrap();
        let value = CanonicalValue::from("+1-555-0123");
        // fingerprint_value takes no pepper at all; the signature is the test
        let a = fingerprint_value(&value).unwrap();
        let b = fingerprint_value(&value).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_verify_matches_and_rejects() {
        let value = CanonicalValue::from("hello");
        let stored = fingerprint_value(&value).unwrap();
        assert!(verify_fingerprint(&value, &stored).unwrap());
        assert!(!verify_fingerprint(&CanonicalValue::from("goodbye"), &stored).unwrap());
        assert!(!verify_fingerprint(&value, "deadbeef").unwrap());
        assert!(verify_fingerprint(&value, "").is_err());
    }
}
