// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Concrete implementations of the domain ports plus the technical
//! machinery the application layer runs on:
//!
//! - [`encryption`]: AES-256-GCM single-shot sealing and the length-framed
//!   chunked stream variant
//! - [`hashing`]: the Argon2id peppered secure hash
//! - [`repositories`]: the SQLite key-version metadata store
//! - [`reliability`]: retry policies, circuit breakers, preset budgets,
//!   and the health surface
//! - [`runtime`]: cooperative cancellation

pub mod encryption;
pub mod hashing;
pub mod reliability;
pub mod repositories;
pub mod runtime;
