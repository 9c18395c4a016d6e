// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end record encrypt/decrypt round trips against the mock KMS.

mod common;

use common::{broken_record, sample_record, test_engine, TEST_PEPPER};

use fieldcrypt::CancellationToken;
use fieldcrypt_domain::entities::DynamicRecord;
use fieldcrypt_domain::services::{canonical_serializer, fingerprint};
use fieldcrypt_domain::value_objects::{CanonicalValue, Pepper};
use fieldcrypt_domain::CryptoError;

/// The S1 walk: encrypt redacts and fills companions exactly as specified,
/// decrypt restores the original values.
#[tokio::test]
async fn test_roundtrip_with_combined_tags() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let mut record = sample_record();

    crypto.encrypt_record(&token, &mut record).await.unwrap();

    // Encrypted sources are redacted
    assert_eq!(record.get_string("Email").unwrap(), "");
    assert_eq!(record.get_string("Name").unwrap(), "");
    // Untagged-for-encrypt fields stay put
    assert_eq!(record.get_string("Phone").unwrap(), "+1-555-0123");

    // Ciphertext companions are populated
    assert!(!record.get_bytes("EmailEncrypted").unwrap().is_empty());
    assert!(!record.get_bytes("NameEncrypted").unwrap().is_empty());

    // Fingerprints are the deterministic SHA-256 of the canonical form
    let email_fp =
        fingerprint::fingerprint_value(&CanonicalValue::from("user@example.com")).unwrap();
    let phone_fp = fingerprint::fingerprint_value(&CanonicalValue::from("+1-555-0123")).unwrap();
    assert_eq!(record.get_string("EmailHash").unwrap(), email_fp);
    assert_eq!(record.get_string("PhoneHash").unwrap(), phone_fp);

    // Envelope written at version 1; plaintext DEK holder stays zeroed
    assert_eq!(record.get_u32("KeyVersion").unwrap(), 1);
    assert!(!record.get_bytes("DEKEncrypted").unwrap().is_empty());
    assert!(record.get_bytes("DEK").unwrap().is_empty());

    crypto.decrypt_record(&token, &mut record).await.unwrap();
    assert_eq!(record.get_string("Email").unwrap(), "user@example.com");
    assert_eq!(record.get_string("Name").unwrap(), "John Doe");
    // Hash companions are untouched by decrypt
    assert_eq!(record.get_string("EmailHash").unwrap(), email_fp);
}

/// Two encryptions of the same record yield distinct ciphertexts (fresh
/// DEK and nonce per pass).
#[tokio::test]
async fn test_ciphertexts_are_nondeterministic() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    let mut first = sample_record();
    let mut second = sample_record();
    crypto.encrypt_record(&token, &mut first).await.unwrap();
    crypto.encrypt_record(&token, &mut second).await.unwrap();

    assert_ne!(
        first.get_bytes("EmailEncrypted").unwrap(),
        second.get_bytes("EmailEncrypted").unwrap()
    );
    // The deterministic fingerprint is identical across passes
    assert_eq!(
        first.get_string("EmailHash").unwrap(),
        second.get_string("EmailHash").unwrap()
    );
}

/// Structural validation reports every problem in one aggregated error and
/// leaves the record untouched.
#[tokio::test]
async fn test_validation_aggregates_problems() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();
    let mut record = broken_record();

    let err = crypto.encrypt_record(&token, &mut record).await.unwrap_err();
    assert!(matches!(err, CryptoError::InvalidConfiguration(_)));
    assert!(err.to_string().contains("EmailEncrypted"));
    assert_eq!(record.get_string("Email").unwrap(), "user@example.com");
}

/// Nested records are processed under the outer record's DEK and restored
/// on decrypt.
#[tokio::test]
async fn test_nested_record_roundtrip() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    let identity = DynamicRecord::builder()
        .field("Ssn", "encrypt,hash_basic", CanonicalValue::from("123-45-6789"))
        .unwrap()
        .companion_fields("Ssn")
        .build();
    let mut record = DynamicRecord::builder()
        .field("Email", "encrypt", CanonicalValue::from("user@example.com"))
        .unwrap()
        .companion_fields("Email")
        .nested("Identity", identity)
        .unwrap()
        .envelope()
        .build();

    crypto.encrypt_record(&token, &mut record).await.unwrap();
    {
        use fieldcrypt_domain::entities::ProtectedRecord;
        let nested = record.nested("Identity").unwrap();
        assert_eq!(
            nested.value("Ssn").unwrap(),
            CanonicalValue::from("")
        );
    }

    crypto.decrypt_record(&token, &mut record).await.unwrap();
    {
        use fieldcrypt_domain::entities::ProtectedRecord;
        let nested = record.nested("Identity").unwrap();
        assert_eq!(nested.value("Ssn").unwrap(), CanonicalValue::from("123-45-6789"));
    }
}

/// Non-string kinds survive the canonical round trip through encryption.
#[tokio::test]
async fn test_typed_fields_roundtrip() {
    let (crypto, _kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    let birthday = chrono::DateTime::from_timestamp_nanos(633_830_400_000_000_000);
    let mut record = DynamicRecord::builder()
        .field("Age", "encrypt", CanonicalValue::UInt8(41))
        .unwrap()
        .companion_fields("Age")
        .field("Balance", "encrypt", CanonicalValue::Float64(1234.56))
        .unwrap()
        .companion_fields("Balance")
        .field("Birthday", "encrypt", CanonicalValue::Timestamp(birthday))
        .unwrap()
        .companion_fields("Birthday")
        .field(
            "Nickname",
            "encrypt",
            CanonicalValue::some(CanonicalValue::from("Johnny")),
        )
        .unwrap()
        .companion_fields("Nickname")
        .envelope()
        .build();

    use fieldcrypt_domain::entities::ProtectedRecord;

    crypto.encrypt_record(&token, &mut record).await.unwrap();
    assert_eq!(record.value("Age").unwrap(), CanonicalValue::UInt8(0));
    crypto.decrypt_record(&token, &mut record).await.unwrap();

    assert_eq!(record.value("Age").unwrap(), CanonicalValue::UInt8(41));
    assert_eq!(record.value("Balance").unwrap(), CanonicalValue::Float64(1234.56));
    assert_eq!(
        record.value("Birthday").unwrap(),
        CanonicalValue::Timestamp(birthday)
    );
    assert_eq!(
        record.value("Nickname").unwrap(),
        CanonicalValue::some(CanonicalValue::from("Johnny"))
    );
}

/// The S3 walk: secure hash round trip through the facade, with the
/// wrong-pepper mismatch.
#[tokio::test]
async fn test_secure_hash_facade() {
    let (crypto, _kms, _repo) = test_engine().await;
    let value = CanonicalValue::from("hunter2");

    let stored = crypto.hash_secure(&value).unwrap();
    assert!(stored.starts_with("$argon2id$"));
    assert!(crypto.verify_secure(&value, &stored).unwrap());
    assert!(!crypto
        .verify_secure(&CanonicalValue::from("hunter3"), &stored)
        .unwrap());

    // Same stored hash, different pepper: mismatch, not error
    let other_pepper = Pepper::new(vec![7u8; 32]).unwrap();
    let canonical = canonical_serializer::serialize(&value).unwrap();
    let hasher = fieldcrypt::infrastructure::hashing::SecureHasher::new(common::fast_argon2()).unwrap();
    assert!(!hasher.verify(&canonical, &stored, &other_pepper).unwrap());

    // Sanity: the engine's own pepper still verifies through the hasher
    let own_pepper = Pepper::new(TEST_PEPPER.to_vec()).unwrap();
    assert!(hasher.verify(&canonical, &stored, &own_pepper).unwrap());
}

/// Absent optional values are rejected by the verifiers as a validation
/// error.
#[tokio::test]
async fn test_verify_absent_value_rejected() {
    let (crypto, _kms, _repo) = test_engine().await;
    let absent = CanonicalValue::none(fieldcrypt_domain::value_objects::CanonicalKind::String);

    assert!(matches!(
        crypto.verify_basic(&absent, "deadbeef"),
        Err(CryptoError::Validation(_))
    ));
    assert!(matches!(
        crypto.verify_secure(&absent, "$argon2id$v=19$m=8192,t=1,p=1$c2FsdA$aGFzaA"),
        Err(CryptoError::Validation(_))
    ));
}
