// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Data Encryption
//!
//! AES-256-GCM sealing for canonical field bytes and a length-framed
//! chunked variant for values too large to buffer.
//!
//! ## At-Rest Formats
//!
//! - Per field: `nonce(12) || ciphertext_and_tag`, no additional framing
//! - Per stream: `[length u32 BE || sealed_block]*` with a 10 MiB chunk cap

pub mod aes_gcm;
pub mod stream;

pub use aes_gcm::{AesGcmCipher, NONCE_LENGTH};
pub use stream::{decrypt_stream, encrypt_stream, DEFAULT_CHUNK_SIZE, MAX_CHUNK};
