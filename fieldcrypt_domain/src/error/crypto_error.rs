// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error system for the fieldcrypt domain. Failures
//! are organized as a flat set of error kinds rather than a typed exception
//! hierarchy: every error carries a stable kind plus a human-readable
//! message, and predicate methods (`is_retryable`, `is_auth_error`, ...)
//! classify errors for automated handling.
//!
//! ## Error Categories
//!
//! ### Configuration Errors
//! - **InvalidConfiguration**: Missing or invalid options, unknown tags,
//!   missing companion fields, unserializable field types. Fatal at
//!   construction and never retried.
//!
//! ### Cryptographic Errors
//! - **EncryptionFailed**: GCM seal failures (key length, RNG exhaustion).
//!   Fatal for the record being processed.
//! - **DecryptionFailed**: GCM open failures, authentication tag mismatches,
//!   and unwrapped-DEK length mismatches. Never retried.
//!
//! ### Collaborator Errors
//! - **AuthenticationFailed**: The KMS denied access. Not retried.
//! - **KmsUnavailable**: Transient KMS failures (network, 5xx, throttling).
//!   Retried under the KMS reliability budget.
//! - **StorageUnavailable**: Metadata store failures. Retried under the
//!   storage budget.
//! - **NetworkUnavailable**: Generic transport failures. Retried under the
//!   network budget.
//!
//! ### Control-Flow Errors
//! - **CircuitOpen**: A circuit breaker refused the call; carries the time
//!   at which the next probe is admitted.
//! - **Cancelled**: The surrounding operation was cancelled cooperatively.
//! - **NotFound**: A KEK version row is absent from the metadata store;
//!   signals a rotation or bootstrap bug.
//! - **Validation**: An input value failed a pre-operation check.
//! - **Serialization**: Canonical encoding/decoding failed (insufficient
//!   data, trailing bytes, oversized values).
//!
//! ## Wrapping
//!
//! Boundaries annotate errors with operation context via
//! [`CryptoError::context`], which prefixes the message while preserving the
//! kind, so deeply wrapped errors remain classifiable.

use thiserror::Error;

/// Failure class used to select a reliability budget for a retryable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Key-management-service failures (tightest budget)
    Kms,
    /// Metadata-store failures (medium budget)
    Storage,
    /// Generic transport failures (loosest budget)
    Network,
}

/// Domain-specific errors for the envelope-encryption system.
///
/// Each variant represents a stable error kind with a descriptive message.
/// The kind is preserved across context wrapping so callers can rely on the
/// classification predicates regardless of how many boundaries an error has
/// crossed.
#[derive(Error, Debug, Clone)]
pub enum CryptoError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("KMS unavailable: {0}")]
    KmsUnavailable(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Circuit open until {next_attempt_at}: {message}")]
    CircuitOpen {
        message: String,
        next_attempt_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CryptoError {
    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new KMS-unavailable error
    pub fn kms_unavailable(msg: impl Into<String>) -> Self {
        Self::KmsUnavailable(msg.into())
    }

    /// Creates a new storage-unavailable error
    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Creates a new encryption error
    pub fn encryption_failed(msg: impl Into<String>) -> Self {
        Self::EncryptionFailed(msg.into())
    }

    /// Creates a new decryption error
    pub fn decryption_failed(msg: impl Into<String>) -> Self {
        Self::DecryptionFailed(msg.into())
    }

    /// Creates a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new serialization error for truncated input
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::Serialization(format!("insufficient data: {}", msg.into()))
    }

    /// Creates a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks whether the error is safe to retry.
    ///
    /// Only transient collaborator failures are retryable. Cryptographic
    /// failures, configuration errors, and authentication denials are final:
    /// retrying an authentication-tag mismatch can never succeed and would
    /// hide corruption.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CryptoError::KmsUnavailable(_)
                | CryptoError::StorageUnavailable(_)
                | CryptoError::NetworkUnavailable(_)
        )
    }

    /// Checks whether the error is an authentication / authorization denial
    pub fn is_auth_error(&self) -> bool {
        matches!(self, CryptoError::AuthenticationFailed(_))
    }

    /// Checks whether the error is security-relevant (worth audit logging)
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            CryptoError::AuthenticationFailed(_)
                | CryptoError::EncryptionFailed(_)
                | CryptoError::DecryptionFailed(_)
        )
    }

    /// Checks whether the error came from a refused (open) circuit.
    ///
    /// Open-circuit refusals are retryable from the caller's point of view
    /// once `next_attempt_at` has passed, but the internal retry executor
    /// treats them as an immediate stop signal.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CryptoError::CircuitOpen { .. })
    }

    /// Checks whether the error was caused by cooperative cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CryptoError::Cancelled(_))
    }

    /// Returns the reliability budget class for retryable errors
    pub fn failure_class(&self) -> Option<FailureClass> {
        match self {
            CryptoError::KmsUnavailable(_) => Some(FailureClass::Kms),
            CryptoError::StorageUnavailable(_) => Some(FailureClass::Storage),
            CryptoError::NetworkUnavailable(_) => Some(FailureClass::Network),
            _ => None,
        }
    }

    /// Gets the error category as a stable label
    pub fn category(&self) -> &'static str {
        match self {
            CryptoError::InvalidConfiguration(_) => "configuration",
            CryptoError::AuthenticationFailed(_) => "authentication",
            CryptoError::KmsUnavailable(_) => "kms",
            CryptoError::StorageUnavailable(_) => "storage",
            CryptoError::NetworkUnavailable(_) => "network",
            CryptoError::EncryptionFailed(_) => "encryption",
            CryptoError::DecryptionFailed(_) => "decryption",
            CryptoError::Validation(_) => "validation",
            CryptoError::CircuitOpen { .. } => "circuit",
            CryptoError::NotFound(_) => "not_found",
            CryptoError::Serialization(_) => "serialization",
            CryptoError::Cancelled(_) => "cancellation",
            CryptoError::Internal(_) => "internal",
        }
    }

    /// Wraps the error with operation context, preserving the kind.
    ///
    /// The context is prefixed to the message so the root cause remains
    /// readable and the classification predicates keep working on the
    /// wrapped value.
    pub fn context(self, operation: &str) -> Self {
        let wrap = |msg: String| format!("{}: {}", operation, msg);
        match self {
            CryptoError::InvalidConfiguration(m) => CryptoError::InvalidConfiguration(wrap(m)),
            CryptoError::AuthenticationFailed(m) => CryptoError::AuthenticationFailed(wrap(m)),
            CryptoError::KmsUnavailable(m) => CryptoError::KmsUnavailable(wrap(m)),
            CryptoError::StorageUnavailable(m) => CryptoError::StorageUnavailable(wrap(m)),
            CryptoError::NetworkUnavailable(m) => CryptoError::NetworkUnavailable(wrap(m)),
            CryptoError::EncryptionFailed(m) => CryptoError::EncryptionFailed(wrap(m)),
            CryptoError::DecryptionFailed(m) => CryptoError::DecryptionFailed(wrap(m)),
            CryptoError::Validation(m) => CryptoError::Validation(wrap(m)),
            CryptoError::CircuitOpen {
                message,
                next_attempt_at,
            } => CryptoError::CircuitOpen {
                message: wrap(message),
                next_attempt_at,
            },
            CryptoError::NotFound(m) => CryptoError::NotFound(wrap(m)),
            CryptoError::Serialization(m) => CryptoError::Serialization(wrap(m)),
            CryptoError::Cancelled(m) => CryptoError::Cancelled(wrap(m)),
            CryptoError::Internal(m) => CryptoError::Internal(wrap(m)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests that only transient collaborator failures are retryable.
    #[test]
    fn test_retryable_classification() {
        assert!(CryptoError::kms_unavailable("throttled").is_retryable());
        assert!(CryptoError::storage_unavailable("locked").is_retryable());
        assert!(CryptoError::NetworkUnavailable("reset".into()).is_retryable());

        assert!(!CryptoError::decryption_failed("tag mismatch").is_retryable());
        assert!(!CryptoError::AuthenticationFailed("denied".into()).is_retryable());
        assert!(!CryptoError::invalid_config("bad tag").is_retryable());
    }

    /// Tests that context wrapping preserves the error kind.
    #[test]
    fn test_context_preserves_kind() {
        let err = CryptoError::kms_unavailable("timeout")
            .context("wrap_dek")
            .context("encrypt_record");

        assert!(err.is_retryable());
        assert_eq!(err.failure_class(), Some(FailureClass::Kms));
        assert_eq!(err.to_string(), "KMS unavailable: encrypt_record: wrap_dek: timeout");
    }

    /// Tests the failure-class mapping used for budget selection.
    #[test]
    fn test_failure_class() {
        assert_eq!(
            CryptoError::storage_unavailable("x").failure_class(),
            Some(FailureClass::Storage)
        );
        assert_eq!(CryptoError::validation("x").failure_class(), None);
    }

    /// Tests circuit-open detection and display.
    #[test]
    fn test_circuit_open() {
        let at = chrono::Utc::now();
        let err = CryptoError::CircuitOpen {
            message: "kms".into(),
            next_attempt_at: at,
        };
        assert!(err.is_circuit_open());
        assert!(!err.is_retryable());
        assert_eq!(err.category(), "circuit");
    }
}
