// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pepper Value Object
//!
//! Deployment-wide secret mixed into secure hashes. Unlike a salt, the
//! pepper is global to the deployment and never stored per record; losing it
//! invalidates every stored secure hash, so it lives in the KMS or an
//! equivalent secret store and is fetched once at startup.
//!
//! ## Validation Rules
//!
//! - Length between 16 and 256 bytes
//! - The all-zero byte string is rejected as uninitialized memory
//!
//! ## Memory Security
//!
//! The pepper is wiped on drop and its `Debug` representation is redacted.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Minimum pepper length in bytes
pub const MIN_PEPPER_LENGTH: usize = 16;

/// Maximum pepper length in bytes
pub const MAX_PEPPER_LENGTH: usize = 256;

/// Validated deployment pepper with secure memory management.
#[derive(Clone)]
pub struct Pepper {
    bytes: Vec<u8>,
}

impl Zeroize for Pepper {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl ZeroizeOnDrop for Pepper {}

impl Drop for Pepper {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Pepper {
    /// Creates a validated pepper.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidConfiguration` when the length is
    /// outside [16, 256] or every byte is zero.
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_PEPPER_LENGTH || bytes.len() > MAX_PEPPER_LENGTH {
            return Err(CryptoError::invalid_config(format!(
                "pepper length must be in [{}, {}] bytes, got {}",
                MIN_PEPPER_LENGTH,
                MAX_PEPPER_LENGTH,
                bytes.len()
            )));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(CryptoError::invalid_config(
                "pepper is all zero bytes; refusing uninitialized secret",
            ));
        }
        Ok(Self { bytes })
    }

    /// Returns the pepper bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the pepper length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Pepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pepper")
            .field("bytes", &"<redacted>")
            .field("len", &self.bytes.len())
            .finish()
    }
}
