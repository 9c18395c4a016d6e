// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fieldcrypt
//!
//! Field-level envelope encryption for record-like data. Callers annotate
//! record fields with a small tag vocabulary (`encrypt`, `hash_basic`,
//! `hash_secure`); the engine orchestrates a two-tier key hierarchy (a KMS
//! held Key Encryption Key and per-record Data Encryption Keys), a peppered
//! Argon2id hash, and a deterministic SHA-256 fingerprint, transforming a
//! populated record into an at-rest record whose sensitive fields are
//! replaced by ciphertexts, hashes, and an encrypted-DEK envelope.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fieldcrypt::application::EnvelopeCryptoBuilder;
//! use fieldcrypt::infrastructure::runtime::CancellationToken;
//! use fieldcrypt_domain::entities::DynamicRecord;
//! use fieldcrypt_domain::value_objects::CanonicalValue;
//! # use fieldcrypt_domain::services::KmsService;
//! # async fn example(kms: Arc<dyn KmsService>) -> Result<(), fieldcrypt_domain::CryptoError> {
//! let crypto = EnvelopeCryptoBuilder::new()
//!     .kms_service(kms)
//!     .kek_alias("app")
//!     .pepper(b"test-pepper-exactly-32-bytes-OK!".to_vec())
//!     .build()
//!     .await?;
//!
//! let mut record = DynamicRecord::builder()
//!     .field("Email", "encrypt,hash_basic", CanonicalValue::from("user@example.com"))?
//!     .companion_fields("Email")
//!     .envelope()
//!     .build();
//!
//! let token = CancellationToken::new();
//! crypto.encrypt_record(&token, &mut record).await?;
//! assert_eq!(record.get_string("Email").unwrap(), "");
//! crypto.decrypt_record(&token, &mut record).await?;
//! assert_eq!(record.get_string("Email").unwrap(), "user@example.com");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate follows the domain/infrastructure split of its domain
//! companion `fieldcrypt-domain`:
//!
//! - [`infrastructure`]: AES-256-GCM primitives and the framed stream
//!   variant, Argon2id peppered hashing, the SQLite metadata repository,
//!   the reliability envelope (retry, circuit breaker, health), and the
//!   cancellation runtime
//! - [`application`]: the DEK service, key-version manager, field and
//!   record processors, batch executor, and the [`EnvelopeCrypto`] facade
//!   with its builder
//!
//! [`EnvelopeCrypto`]: application::EnvelopeCrypto

pub mod application;
pub mod infrastructure;

pub use application::{EnvelopeCrypto, EnvelopeCryptoBuilder};
pub use infrastructure::runtime::CancellationToken;

// Re-export the domain crate so callers need a single dependency
pub use fieldcrypt_domain as domain;
