// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Framed stream encryption through the facade.

mod common;

use common::test_engine;

use fieldcrypt::CancellationToken;
use rand::RngCore;

/// The S4 walk: a 1 MiB random buffer in 4 KiB chunks decrypts
/// byte-for-byte, and an adversarial 0xFFFFFFFF length header is refused.
#[tokio::test]
async fn test_one_mebibyte_roundtrip() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let dek = crypto.generate_dek().unwrap();

    let mut payload = vec![0u8; 1024 * 1024];
    rand::rng().fill_bytes(&mut payload);

    let mut sealed = Vec::new();
    let written = crypto
        .encrypt_stream(&token, &dek, &mut payload.as_slice(), &mut sealed, 4096)
        .await
        .unwrap();
    assert_eq!(written, payload.len() as u64);
    // 256 full chunks, each framed with a 4-byte header and sealed with a
    // 28-byte nonce+tag overhead
    assert_eq!(sealed.len(), payload.len() + 256 * (4 + 28));

    let mut recovered = Vec::new();
    let read = crypto
        .decrypt_stream(&token, &dek, &mut sealed.as_slice(), &mut recovered)
        .await
        .unwrap();
    assert_eq!(read, payload.len() as u64);
    assert_eq!(recovered, payload);
}

#[tokio::test]
async fn test_adversarial_length_header() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let dek = crypto.generate_dek().unwrap();

    let adversarial = 0xFFFF_FFFFu32.to_be_bytes().to_vec();
    let mut out = Vec::new();
    let err = crypto
        .decrypt_stream(&token, &dek, &mut adversarial.as_slice(), &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("exceeds maximum allowed size"));
    assert!(out.is_empty());
}

/// A stream sealed under one DEK does not open under another.
#[tokio::test]
async fn test_wrong_dek_fails_authentication() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let dek = crypto.generate_dek().unwrap();
    let other = crypto.generate_dek().unwrap();

    let payload = b"stream payload".to_vec();
    let mut sealed = Vec::new();
    crypto
        .encrypt_stream(&token, &dek, &mut payload.as_slice(), &mut sealed, 4096)
        .await
        .unwrap();

    let mut out = Vec::new();
    let err = crypto
        .decrypt_stream(&token, &other, &mut sealed.as_slice(), &mut out)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        fieldcrypt_domain::CryptoError::DecryptionFailed(_)
    ));
}

/// Truncating a sealed stream mid-chunk is a framing error.
#[tokio::test]
async fn test_truncated_stream_rejected() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let dek = crypto.generate_dek().unwrap();

    let payload = vec![7u8; 10_000];
    let mut sealed = Vec::new();
    crypto
        .encrypt_stream(&token, &dek, &mut payload.as_slice(), &mut sealed, 1024)
        .await
        .unwrap();

    sealed.truncate(sealed.len() - 5);
    let mut out = Vec::new();
    let err = crypto
        .decrypt_stream(&token, &dek, &mut sealed.as_slice(), &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("short read"));
}
