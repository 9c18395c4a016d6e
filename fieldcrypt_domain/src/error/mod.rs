// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Error types for the fieldcrypt domain.
//!
//! A single flat error enum ([`CryptoError`]) carries every failure kind the
//! system distinguishes. Classification predicates on the enum drive the
//! retry and circuit-breaker decisions in the reliability layer, so the kind
//! must survive wrapping; see [`CryptoError::context`].

pub mod crypto_error;

pub use crypto_error::{CryptoError, FailureClass};
