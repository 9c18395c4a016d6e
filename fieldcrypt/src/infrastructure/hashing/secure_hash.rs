// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Peppered Secure Hash
//!
//! Argon2id over `canonical_bytes || pepper` with a fresh random salt per
//! call. This is the `hash_secure` operation: non-deterministic by design
//! (the salt), brute-force resistant (the memory-hard KDF), and bound to
//! the deployment (the pepper).
//!
//! ## Output Format
//!
//! The self-describing PHC string
//! `$argon2id$v=19$m=<M>,t=<T>,p=<P>$<salt_b64>$<hash_b64>` with standard
//! B64 (no padding). Because the parameters travel inside the string, a
//! later parameter upgrade never invalidates stored hashes: the verifier
//! replays the STORED parameters, not the current profile.
//!
//! ## Verification Semantics
//!
//! - A matching value and pepper verify `true`
//! - A different value, a different pepper, or a tampered string verify
//!   `false`; tampering is a mismatch, never an error
//! - The comparison of derived bytes is constant-time

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use fieldcrypt_domain::value_objects::{Argon2Params, Pepper};
use fieldcrypt_domain::CryptoError;

/// Argon2id hasher bound to a validated parameter profile.
pub struct SecureHasher {
    params: Argon2Params,
    rng: SystemRandom,
}

impl SecureHasher {
    /// Creates a hasher after re-validating the profile.
    pub fn new(params: Argon2Params) -> Result<Self, CryptoError> {
        params.validate()?;
        Ok(Self {
            params,
            rng: SystemRandom::new(),
        })
    }

    /// Returns the active parameter profile
    pub fn params(&self) -> &Argon2Params {
        &self.params
    }

    fn kdf_params(&self, output_len: usize) -> Result<Params, CryptoError> {
        Params::new(
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            Some(output_len),
        )
        .map_err(|e| CryptoError::invalid_config(format!("argon2 rejected parameters: {}", e)))
    }

    /// Hashes canonical bytes with the pepper appended, returning the PHC
    /// string.
    ///
    /// The all-zero pepper cannot reach this function: [`Pepper`] rejects
    /// it at construction.
    pub fn hash(&self, canonical: &[u8], pepper: &Pepper) -> Result<String, CryptoError> {
        let mut salt_bytes = vec![0u8; self.params.salt_length];
        self.rng.fill(&mut salt_bytes).map_err(|e| {
            CryptoError::encryption_failed(format!("salt generation failed: {:?}", e))
        })?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CryptoError::internal(format!("salt encoding failed: {}", e)))?;

        let mut peppered = peppered_input(canonical, pepper);
        let params = self.kdf_params(self.params.key_length)?;
        let kdf = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
        let hash = kdf
            .hash_password_customized(&peppered, None, None, params, &salt)
            .map(|h| h.to_string())
            .map_err(|e| CryptoError::encryption_failed(format!("argon2 hashing failed: {}", e)));
        peppered.zeroize();
        hash
    }

    /// Verifies canonical bytes against a stored PHC string.
    ///
    /// Re-derives at the parameters and version recorded in the string so
    /// hashes produced under an older profile keep verifying. Malformed or
    /// tampered strings are reported as a mismatch.
    pub fn verify(
        &self,
        canonical: &[u8],
        stored: &str,
        pepper: &Pepper,
    ) -> Result<bool, CryptoError> {
        if stored.is_empty() {
            return Err(CryptoError::validation(
                "stored secure hash is empty; nothing to compare against",
            ));
        }

        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };
        if parsed.algorithm.as_str() != "argon2id" {
            return Ok(false);
        }
        let version = match parsed.version {
            Some(decimal) => match Version::try_from(decimal) {
                Ok(version) => version,
                Err(_) => return Ok(false),
            },
            None => Version::V0x13,
        };
        let stored_params = match Params::try_from(&parsed) {
            Ok(params) => params,
            Err(_) => return Ok(false),
        };
        let salt = match parsed.salt {
            Some(salt) => salt,
            None => return Ok(false),
        };
        let mut salt_buf = [0u8; 64];
        let raw_salt = match salt.decode_b64(&mut salt_buf) {
            Ok(raw) => raw,
            Err(_) => return Ok(false),
        };
        let expected = match parsed.hash {
            Some(output) => output,
            None => return Ok(false),
        };

        let mut peppered = peppered_input(canonical, pepper);
        let kdf = Argon2::new(Algorithm::Argon2id, version, stored_params);
        let mut derived = vec![0u8; expected.as_bytes().len()];
        let outcome = kdf.hash_password_into(&peppered, raw_salt, &mut derived);
        peppered.zeroize();
        if outcome.is_err() {
            return Ok(false);
        }

        Ok(derived.as_slice().ct_eq(expected.as_bytes()).into())
    }
}

/// Appends the pepper to the canonical bytes
fn peppered_input(canonical: &[u8], pepper: &Pepper) -> Vec<u8> {
    let mut input = Vec::with_capacity(canonical.len() + pepper.len());
    input.extend_from_slice(canonical);
    input.extend_from_slice(pepper.as_bytes());
    input
}
