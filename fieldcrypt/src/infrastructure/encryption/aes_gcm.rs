// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # AES-256-GCM Primitive
//!
//! Authenticated encryption for canonical field bytes under a per-record
//! DEK. Every seal draws a fresh 12-byte nonce from the system CSPRNG and
//! prepends it to the ciphertext, so the at-rest layout is
//! `nonce(12) || ciphertext_and_tag` with no additional framing.
//!
//! ## Security Properties
//!
//! - **Confidentiality and integrity**: GCM is an AEAD; tampering fails the
//!   tag check and surfaces as `DecryptionFailed`
//! - **Semantic security**: the fresh nonce makes identical plaintexts
//!   produce distinct ciphertexts (collision probability 2^-96)
//! - **No retry on auth failure**: a failed tag check is never retried;
//!   retrying cannot succeed and would mask corruption

use aes_gcm::{AeadInPlace, Aes256Gcm, Key, KeyInit, Nonce};
use ring::rand::{SecureRandom, SystemRandom};

use fieldcrypt_domain::value_objects::DataKey;
use fieldcrypt_domain::CryptoError;

/// GCM nonce length in bytes
pub const NONCE_LENGTH: usize = 12;

/// AES-256-GCM cipher bound to the system CSPRNG.
///
/// Stateless apart from the random source; a single instance is shared
/// across all workers.
pub struct AesGcmCipher {
    rng: SystemRandom,
}

impl Default for AesGcmCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl AesGcmCipher {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Generates a fresh random nonce
    fn generate_nonce(&self) -> Result<[u8; NONCE_LENGTH], CryptoError> {
        let mut nonce = [0u8; NONCE_LENGTH];
        self.rng
            .fill(&mut nonce)
            .map_err(|e| CryptoError::encryption_failed(format!("nonce generation failed: {:?}", e)))?;
        Ok(nonce)
    }

    /// Seals plaintext under the DEK, returning `nonce || ciphertext_and_tag`.
    pub fn encrypt(&self, plaintext: &[u8], key: &DataKey) -> Result<Vec<u8>, CryptoError> {
        let nonce = self.generate_nonce()?;

        let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        let cipher = Aes256Gcm::new(cipher_key);
        let nonce_array = Nonce::from_slice(&nonce);

        let mut buffer = plaintext.to_vec();
        cipher
            .encrypt_in_place(nonce_array, b"", &mut buffer)
            .map_err(|e| CryptoError::encryption_failed(format!("AES-256-GCM seal failed: {:?}", e)))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&buffer);
        Ok(result)
    }

    /// Opens `nonce || ciphertext_and_tag` under the DEK.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed("invalid ciphertext ...")` for inputs shorter
    ///   than the nonce
    /// - `DecryptionFailed` for authentication-tag mismatches
    pub fn decrypt(&self, data: &[u8], key: &DataKey) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_LENGTH {
            return Err(CryptoError::decryption_failed(format!(
                "invalid ciphertext: {} bytes is shorter than the {}-byte nonce",
                data.len(),
                NONCE_LENGTH
            )));
        }

        let (nonce, ciphertext) = data.split_at(NONCE_LENGTH);
        let cipher_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        let cipher = Aes256Gcm::new(cipher_key);
        let nonce_array = Nonce::from_slice(nonce);

        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place(nonce_array, b"", &mut buffer)
            .map_err(|_| {
                CryptoError::decryption_failed("AES-256-GCM authentication failed")
            })?;

        Ok(buffer)
    }
}
