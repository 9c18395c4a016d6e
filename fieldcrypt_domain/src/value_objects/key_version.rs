// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Key Version Value Object
//!
//! Monotonic version number tagging a specific KMS key id under a KEK
//! alias. Versions are contiguous integers starting at 1; exactly one
//! version per alias is current (non-deprecated) at any time. Records store
//! the version their DEK was wrapped under so decryption resolves the same
//! KMS key id after any number of rotations.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Validated key version (≥ 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyVersion(u32);

impl KeyVersion {
    /// The initial version assigned by `ensure_initial`
    pub const INITIAL: KeyVersion = KeyVersion(1);

    /// Creates a version, rejecting 0.
    ///
    /// Version 0 is the source system's "not initialized" sentinel and is
    /// never a valid stored version.
    pub fn new(version: u32) -> Result<Self, CryptoError> {
        if version == 0 {
            return Err(CryptoError::validation("key version must be >= 1"));
        }
        Ok(Self(version))
    }

    /// Returns the numeric version
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the successor version produced by a rotation
    pub fn next(&self) -> KeyVersion {
        KeyVersion(self.0 + 1)
    }
}

impl std::fmt::Display for KeyVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rejected() {
        assert!(KeyVersion::new(0).is_err());
        assert!(KeyVersion::new(1).is_ok());
    }

    #[test]
    fn test_next_is_monotonic() {
        let v = KeyVersion::INITIAL;
        assert_eq!(v.next().value(), 2);
        assert!(v.next() > v);
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyVersion::new(3).unwrap().to_string(), "v3");
    }
}
