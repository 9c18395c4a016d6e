// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Argon2 Parameters Value Object
//!
//! Validated cost parameters for the peppered secure hash. The bounds
//! enforce a hardness floor below which Argon2id stops being memory-hard in
//! any meaningful sense; the defaults are a production-grade profile.
//!
//! ## Validation Rules
//!
//! | Parameter | Bound |
//! |---|---|
//! | memory_kib | ≥ 8192 (8 MiB) |
//! | iterations | ≥ 1 |
//! | parallelism | ≥ 1 |
//! | salt_length | 8 to 48 bytes |
//! | key_length | ≥ 16 bytes |
//!
//! Stored hashes embed the parameters they were produced with, so raising
//! these values later never invalidates existing hashes; verification always
//! replays the stored parameters.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Validated Argon2id cost parameters.
///
/// # Examples
///
/// ```
/// use fieldcrypt_domain::value_objects::Argon2Params;
///
/// let defaults = Argon2Params::default();
/// assert_eq!(defaults.memory_kib, 65536);
///
/// let weak = Argon2Params { memory_kib: 1024, ..Default::default() };
/// assert!(weak.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Time cost (passes over memory)
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
    /// Random salt length in bytes, fresh per hash
    pub salt_length: usize,
    /// Derived key length in bytes
    pub key_length: usize,
}

/// Minimum memory cost (8 MiB)
pub const MIN_MEMORY_KIB: u32 = 8 * 1024;

/// Minimum salt length in bytes
pub const MIN_SALT_LENGTH: usize = 8;

/// Maximum salt length in bytes (48 raw bytes encode to the 64-character
/// PHC B64 salt field ceiling)
pub const MAX_SALT_LENGTH: usize = 48;

/// Minimum derived key length in bytes
pub const MIN_KEY_LENGTH: usize = 16;

impl Default for Argon2Params {
    /// Production defaults: 64 MiB, 3 passes, 4 lanes, 16-byte salt,
    /// 32-byte key.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 4,
            salt_length: 16,
            key_length: 32,
        }
    }
}

impl Argon2Params {
    /// Creates validated parameters.
    pub fn new(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        salt_length: usize,
        key_length: usize,
    ) -> Result<Self, CryptoError> {
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
            salt_length,
            key_length,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validates the hardness floor.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidConfiguration` naming the offending
    /// parameter.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(CryptoError::invalid_config(format!(
                "argon2 memory must be >= {} KiB, got {}",
                MIN_MEMORY_KIB, self.memory_kib
            )));
        }
        if self.iterations < 1 {
            return Err(CryptoError::invalid_config("argon2 iterations must be >= 1"));
        }
        if self.parallelism < 1 {
            return Err(CryptoError::invalid_config("argon2 parallelism must be >= 1"));
        }
        if self.salt_length < MIN_SALT_LENGTH {
            return Err(CryptoError::invalid_config(format!(
                "argon2 salt length must be >= {} bytes, got {}",
                MIN_SALT_LENGTH, self.salt_length
            )));
        }
        if self.salt_length > MAX_SALT_LENGTH {
            return Err(CryptoError::invalid_config(format!(
                "argon2 salt length must be <= {} bytes, got {}",
                MAX_SALT_LENGTH, self.salt_length
            )));
        }
        if self.key_length < MIN_KEY_LENGTH {
            return Err(CryptoError::invalid_config(format!(
                "argon2 key length must be >= {} bytes, got {}",
                MIN_KEY_LENGTH, self.key_length
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Argon2Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "m={},t={},p={}",
            self.memory_kib, self.iterations, self.parallelism
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests the documented default profile.
    #[test]
    fn test_defaults_are_valid() {
        let params = Argon2Params::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 3);
        assert_eq!(params.parallelism, 4);
        assert_eq!(params.salt_length, 16);
        assert_eq!(params.key_length, 32);
    }

    /// Tests each bound of the hardness floor individually.
    #[test]
    fn test_bounds() {
        assert!(Argon2Params::new(8191, 3, 4, 16, 32).is_err());
        assert!(Argon2Params::new(8192, 3, 4, 16, 32).is_ok());
        assert!(Argon2Params::new(65536, 0, 4, 16, 32).is_err());
        assert!(Argon2Params::new(65536, 3, 0, 16, 32).is_err());
        assert!(Argon2Params::new(65536, 3, 4, 7, 32).is_err());
        assert!(Argon2Params::new(65536, 3, 4, 48, 32).is_ok());
        assert!(Argon2Params::new(65536, 3, 4, 49, 32).is_err());
        assert!(Argon2Params::new(65536, 3, 4, 16, 15).is_err());
    }
}
