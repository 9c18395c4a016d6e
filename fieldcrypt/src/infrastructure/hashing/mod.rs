// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hashing
//!
//! The peppered Argon2id secure hash (`hash_secure`). The deterministic
//! SHA-256 fingerprint (`hash_basic`) lives in the domain crate next to the
//! canonical serializer; this module holds the KDF-backed construction that
//! needs the infrastructure crypto stack.

pub mod secure_hash;

pub use secure_hash::SecureHasher;
