// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fieldcrypt Domain
//!
//! The fieldcrypt domain crate contains the core business logic of the
//! field-level envelope-encryption system. It is completely independent of
//! external concerns like KMS providers, databases, or async runtimes, and
//! follows Domain-Driven Design (DDD) patterns.
//!
//! ## Module Structure
//!
//! - [`error`]: The `CryptoError` taxonomy shared by every layer
//! - [`value_objects`]: Validated, immutable domain values (KEK alias, key
//!   version, pepper, Argon2 parameters, tag sets, canonical values, DEKs)
//! - [`entities`]: Objects with identity and lifecycle (KEK version records,
//!   the protected-record abstraction)
//! - [`services`]: Stateless domain services and infrastructure ports (the
//!   canonical serializer, the fingerprint hash, the KMS port, observability
//!   and metrics hooks)
//! - [`repositories`]: Persistence ports (the KEK version metadata store)
//!
//! ## Design Principles
//!
//! ### Value Objects
//! Immutable, self-validating values compared by attributes. A `KekAlias`
//! that exists is a valid alias; a `Pepper` that exists has passed the
//! length and non-zero checks.
//!
//! ### Ports
//! I/O-bound collaborators (KMS, metadata store) are expressed as
//! `async_trait` traits here and implemented in the infrastructure layer of
//! the `fieldcrypt` crate or by the embedding application.
//!
//! ### Synchronous CPU-bound services
//! The canonical serializer and the fingerprint hash are pure synchronous
//! functions. Only I/O ports are async.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types at the crate root
pub use entities::{
    DynamicRecord, FieldKind, FieldSpec, KekVersionRecord, ProtectedRecord,
};
pub use error::CryptoError;
pub use repositories::KekVersionRepository;
pub use services::{
    canonical_serializer, fingerprint, KmsService, MetricsCollector, NoopMetricsCollector,
    NoopObservabilityHook, ObservabilityHook,
};
pub use value_objects::{
    Argon2Params, CanonicalKind, CanonicalValue, DataKey, EncryptionMetadata, FieldTag, KekAlias,
    KeyVersion, Pepper, TagSet,
};
