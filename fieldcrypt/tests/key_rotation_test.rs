// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! KEK rotation: version monotonicity, deprecation, and decryption of
//! records sealed under deprecated versions.

mod common;

use common::{sample_record, test_engine};

use fieldcrypt::CancellationToken;
use fieldcrypt_domain::value_objects::KeyVersion;

/// The S2 walk: rotate, observe version 2 current and version 1
/// deprecated, then decrypt a record sealed before the rotation.
#[tokio::test]
async fn test_rotation_keeps_old_records_decryptable() {
    let (crypto, _kms, repo) = test_engine().await;
    let token = CancellationToken::new();

    let mut record = sample_record();
    crypto.encrypt_record(&token, &mut record).await.unwrap();
    assert_eq!(record.get_u32("KeyVersion").unwrap(), 1);

    let new_version = crypto.rotate_kek(&token).await.unwrap();
    assert_eq!(new_version.value(), 2);
    assert_eq!(
        crypto.current_key_version(&token).await.unwrap(),
        Some(KeyVersion::new(2).unwrap())
    );

    let rows = repo.rows();
    let v1 = rows.iter().find(|r| r.version.value() == 1).unwrap();
    let v2 = rows.iter().find(|r| r.version.value() == 2).unwrap();
    assert!(v1.is_deprecated);
    assert!(!v2.is_deprecated);
    assert_ne!(v1.kms_key_id, v2.kms_key_id);

    // The pre-rotation record still decrypts: unwrap resolves version 1's
    // key id even though version 1 is deprecated
    crypto.decrypt_record(&token, &mut record).await.unwrap();
    assert_eq!(record.get_string("Email").unwrap(), "user@example.com");
}

/// After N rotations from version 1: current == N+1 and versions 1..N are
/// deprecated.
#[tokio::test]
async fn test_repeated_rotations() {
    let (crypto, _kms, repo) = test_engine().await;
    let token = CancellationToken::new();
    const ROTATIONS: u32 = 5;

    for _ in 0..ROTATIONS {
        crypto.rotate_kek(&token).await.unwrap();
    }

    assert_eq!(
        crypto.current_key_version(&token).await.unwrap(),
        Some(KeyVersion::new(ROTATIONS + 1).unwrap())
    );

    let rows = repo.rows();
    assert_eq!(rows.len(), (ROTATIONS + 1) as usize);
    for row in &rows {
        if row.version.value() <= ROTATIONS {
            assert!(row.is_deprecated, "version {} must be deprecated", row.version);
        } else {
            assert!(!row.is_deprecated);
        }
    }
}

/// Records sealed under different versions decrypt side by side.
#[tokio::test]
async fn test_mixed_version_records() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    let mut old_record = sample_record();
    crypto.encrypt_record(&token, &mut old_record).await.unwrap();

    crypto.rotate_kek(&token).await.unwrap();

    let mut new_record = sample_record();
    crypto.encrypt_record(&token, &mut new_record).await.unwrap();

    assert_eq!(old_record.get_u32("KeyVersion").unwrap(), 1);
    assert_eq!(new_record.get_u32("KeyVersion").unwrap(), 2);

    crypto.decrypt_record(&token, &mut old_record).await.unwrap();
    crypto.decrypt_record(&token, &mut new_record).await.unwrap();
    assert_eq!(old_record.get_string("Email").unwrap(), "user@example.com");
    assert_eq!(new_record.get_string("Email").unwrap(), "user@example.com");
}

/// ensure_initial is idempotent: a second engine over the same store and
/// alias adopts version 1 instead of re-initializing.
#[tokio::test]
async fn test_ensure_initial_idempotent() {
    let (first, kms, repo) = test_engine().await;
    let token = CancellationToken::new();
    assert_eq!(
        first.current_key_version(&token).await.unwrap(),
        Some(KeyVersion::new(1).unwrap())
    );

    let second = fieldcrypt::application::EnvelopeCryptoBuilder::new()
        .kms_service(kms)
        .kek_alias("app")
        .pepper(common::TEST_PEPPER.to_vec())
        .argon2_params(common::fast_argon2())
        .key_metadata_repository(repo.clone())
        .build()
        .await
        .unwrap();

    assert_eq!(
        second.current_key_version(&token).await.unwrap(),
        Some(KeyVersion::new(1).unwrap())
    );
    assert_eq!(repo.rows().len(), 1);
}
