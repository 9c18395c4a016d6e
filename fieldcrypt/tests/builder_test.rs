// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Construction-time validation: required options, conflicts, and the
//! ensure-initial bootstrap.

mod common;

use std::sync::Arc;

use common::{fast_argon2, InMemoryKekRepository, MockKms, TEST_PEPPER};

use fieldcrypt::application::EnvelopeCryptoBuilder;
use fieldcrypt::CancellationToken;
use fieldcrypt_domain::value_objects::{Argon2Params, KeyVersion};
use fieldcrypt_domain::CryptoError;

fn base_builder(kms: Arc<MockKms>, repo: Arc<InMemoryKekRepository>) -> EnvelopeCryptoBuilder {
    EnvelopeCryptoBuilder::new()
        .kms_service(kms)
        .kek_alias("app")
        .pepper(TEST_PEPPER.to_vec())
        .argon2_params(fast_argon2())
        .key_metadata_repository(repo)
}

#[tokio::test]
async fn test_missing_required_options() {
    let err = EnvelopeCryptoBuilder::new().build().await.unwrap_err();
    assert!(matches!(err, CryptoError::InvalidConfiguration(_)));
    assert!(err.to_string().contains("kms_service"));

    let err = EnvelopeCryptoBuilder::new()
        .kms_service(Arc::new(MockKms::new()))
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("kek_alias"));

    let err = EnvelopeCryptoBuilder::new()
        .kms_service(Arc::new(MockKms::new()))
        .kek_alias("app")
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("pepper"));
}

#[tokio::test]
async fn test_conflicting_options() {
    let kms = Arc::new(MockKms::new());

    let err = EnvelopeCryptoBuilder::new()
        .kms_service(kms.clone())
        .kek_alias("app")
        .pepper(TEST_PEPPER.to_vec())
        .pepper_secret_path("secrets/pepper")
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));

    let err = EnvelopeCryptoBuilder::new()
        .kms_service(kms)
        .kek_alias("app")
        .pepper(TEST_PEPPER.to_vec())
        .key_metadata_repository(Arc::new(InMemoryKekRepository::new()))
        .db_path("/tmp/somewhere")
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mutually exclusive"));
}

#[tokio::test]
async fn test_invalid_values_rejected() {
    let kms = Arc::new(MockKms::new());
    let repo = Arc::new(InMemoryKekRepository::new());

    // Alias grammar
    let err = EnvelopeCryptoBuilder::new()
        .kms_service(kms.clone())
        .kek_alias("not valid!")
        .pepper(TEST_PEPPER.to_vec())
        .key_metadata_repository(repo.clone())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, CryptoError::InvalidConfiguration(_)));

    // Pepper bounds and the all-zero rejection
    let err = base_builder(kms.clone(), repo.clone())
        .pepper(vec![1u8; 8])
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("pepper length"));

    let err = base_builder(kms.clone(), repo.clone())
        .pepper(vec![0u8; 32])
        .build()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("zero"));

    // Argon2 hardness floor
    let weak = Argon2Params {
        memory_kib: 1024,
        ..Argon2Params::default()
    };
    let err = base_builder(kms, repo).argon2_params(weak).build().await.unwrap_err();
    assert!(err.to_string().contains("argon2 memory"));
}

/// build() runs ensure_initial: the alias is usable immediately and a
/// pre-existing KMS key is adopted instead of creating a new one.
#[tokio::test]
async fn test_build_initializes_alias() {
    let kms = Arc::new(MockKms::new());
    let pre_existing = kms.seed_key("app");
    let repo = Arc::new(InMemoryKekRepository::new());

    let crypto = base_builder(kms, repo.clone()).build().await.unwrap();

    let token = CancellationToken::new();
    assert_eq!(
        crypto.current_key_version(&token).await.unwrap(),
        Some(KeyVersion::new(1).unwrap())
    );
    let rows = repo.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kms_key_id, pre_existing, "existing KMS key adopted");
}

/// The pepper can be fetched from the KMS secret store at build time.
#[tokio::test]
async fn test_pepper_from_secret_path() {
    let kms = Arc::new(MockKms::new());
    kms.put_secret("secrets/pepper", TEST_PEPPER.to_vec());
    let repo = Arc::new(InMemoryKekRepository::new());

    let crypto = EnvelopeCryptoBuilder::new()
        .kms_service(kms.clone())
        .kek_alias("app")
        .pepper_secret_path("secrets/pepper")
        .argon2_params(fast_argon2())
        .key_metadata_repository(repo)
        .build()
        .await
        .unwrap();
    assert_eq!(crypto.pepper_len(), TEST_PEPPER.len());

    // Missing secret surfaces the lookup failure
    let err = EnvelopeCryptoBuilder::new()
        .kms_service(kms)
        .kek_alias("other")
        .pepper_secret_path("secrets/missing")
        .key_metadata_repository(Arc::new(InMemoryKekRepository::new()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, CryptoError::NotFound(_)));
}

/// The metadata blob carries the configured identity and alias.
#[tokio::test]
async fn test_metadata_blob() {
    let kms = Arc::new(MockKms::new());
    let repo = Arc::new(InMemoryKekRepository::new());
    let crypto = base_builder(kms, repo)
        .serializer_identity("custom-serializer")
        .build()
        .await
        .unwrap();

    let blob = crypto.metadata();
    assert_eq!(blob.serializer_id, "custom-serializer");
    assert_eq!(blob.kek_alias, "app");

    let json = blob.to_json().unwrap();
    let parsed = fieldcrypt_domain::value_objects::EncryptionMetadata::from_json(&json).unwrap();
    assert_eq!(parsed, blob);
}
