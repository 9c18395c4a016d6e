// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services
//!
//! Stateless domain services and the ports infrastructure implements.
//!
//! ## Core Services (synchronous, CPU-bound)
//!
//! - [`canonical_serializer`]: the deterministic binary encoding that
//!   underpins every hash and ciphertext
//! - [`fingerprint`]: the SHA-256 equality-lookup hash
//!
//! ## Infrastructure Ports (async, I/O-bound)
//!
//! - [`KmsService`]: the narrow key-management-service contract the core
//!   consumes; concrete cloud or vault clients are provided by the caller
//! - [`ObservabilityHook`] / [`MetricsCollector`]: optional collaborator
//!   hooks with no-op defaults
//!
//! Core domain services are sync because they are pure computation; only
//! ports that talk to the outside world are async.

pub mod canonical_serializer;
pub mod fingerprint;
pub mod kms_service;
pub mod metrics;
pub mod observability;

pub use kms_service::KmsService;
pub use metrics::{MetricsCollector, NoopMetricsCollector};
pub use observability::{NoopObservabilityHook, ObservabilityHook};
