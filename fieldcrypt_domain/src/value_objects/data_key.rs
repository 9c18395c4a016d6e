// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data Encryption Key Value Object
//!
//! Per-record symmetric key. A DEK is 32 uniformly random bytes, owned by
//! exactly one record, and exists in plaintext only between generation and
//! wrapping on the encrypt path, or between unwrapping and the final field
//! decryption on the decrypt path.
//!
//! ## Memory Security
//!
//! The key bytes are wiped on drop and the `Debug` representation is
//! redacted. The plaintext never appears in logs or error messages.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// DEK length in bytes (AES-256 key size)
pub const DEK_LENGTH: usize = 32;

/// A 32-byte data-encryption key with secure memory management.
#[derive(Clone)]
pub struct DataKey {
    bytes: [u8; DEK_LENGTH],
}

impl Zeroize for DataKey {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl ZeroizeOnDrop for DataKey {}

impl Drop for DataKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl DataKey {
    /// Wraps raw key bytes produced by a secure random source.
    pub fn new(bytes: [u8; DEK_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Builds a DEK from a variable-length buffer, typically the result of
    /// a KMS unwrap call.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::DecryptionFailed` when the buffer is not
    /// exactly 32 bytes; a KMS that returns a short or long key indicates a
    /// corrupted or foreign envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; DEK_LENGTH] = bytes.try_into().map_err(|_| {
            CryptoError::decryption_failed(format!(
                "unwrapped DEK must be exactly {} bytes, got {}",
                DEK_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes: arr })
    }

    /// Returns the key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey").field("bytes", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_length_check() {
        assert!(DataKey::from_slice(&[7u8; 32]).is_ok());
        assert!(matches!(
            DataKey::from_slice(&[7u8; 31]),
            Err(CryptoError::DecryptionFailed(_))
        ));
        assert!(matches!(
            DataKey::from_slice(&[7u8; 33]),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_debug_redacts() {
        let key = DataKey::new([0xAB; 32]);
        assert!(!format!("{:?}", key).contains("171"));
    }
}
