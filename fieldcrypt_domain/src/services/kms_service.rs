// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # KMS Service Port
//!
//! The narrow key-management-service contract the core consumes. Concrete
//! providers (cloud KMS clients, local vaults, HSM bridges) implement this
//! trait outside the core; the core never sees provider-specific types.
//!
//! ## Error Mapping
//!
//! Implementations translate provider failures into the domain taxonomy:
//! access denials become `AuthenticationFailed`, transient faults (network,
//! 5xx, throttling) become `KmsUnavailable` so the reliability envelope can
//! retry them, and everything else keeps its provider message under an
//! appropriate kind.
//!
//! ## Threading
//!
//! Implementations must be thread-safe; a single client instance is shared
//! across all batch workers.

use async_trait::async_trait;

use crate::error::CryptoError;

/// Key-management-service provider contract.
#[async_trait]
pub trait KmsService: Send + Sync {
    /// Encrypts a plaintext DEK under the KMS key identified by `key_id`,
    /// returning the opaque wrapped form.
    async fn encrypt_dek(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypts a wrapped DEK under the KMS key identified by `key_id`.
    async fn decrypt_dek(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Creates a new key (or key version) under the alias, returning the
    /// new key id. Used for initialization and rotation; providers that
    /// treat the alias as a rotation pointer return the post-rotation id.
    async fn create_key(&self, alias: &str) -> Result<String, CryptoError>;

    /// Resolves the alias to an existing key id, or `None` when the alias
    /// is unknown to the provider.
    async fn get_key_id(&self, alias: &str) -> Result<Option<String>, CryptoError>;

    /// Fetches a secret byte string (e.g. the deployment pepper) from the
    /// provider's secret store.
    async fn get_secret(&self, path: &str) -> Result<Vec<u8>, CryptoError>;
}
