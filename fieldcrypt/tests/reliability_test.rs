// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The reliability envelope against a failing KMS, plus the health
//! surface.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{sample_record, test_engine, MockKms};

use fieldcrypt::infrastructure::reliability::{
    BackoffStrategy, CircuitBreakerConfig, CircuitState, HealthStatus, ReliabilityPreset,
    ReliabilityService, RetryPolicy,
};
use fieldcrypt::CancellationToken;
use fieldcrypt_domain::entities::ProtectedRecord;
use fieldcrypt_domain::services::KmsService;
use fieldcrypt_domain::CryptoError;

fn fast_kms_preset() -> ReliabilityPreset {
    ReliabilityPreset {
        breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            timeout: Duration::from_millis(50),
            success_threshold: 2,
            max_concurrent_probes: 1,
        },
        retry: RetryPolicy::new(
            3,
            BackoffStrategy::Fixed {
                delay: Duration::from_millis(1),
            },
        ),
    }
}

/// The S6 walk against the mock KMS: failures trip the breaker, the open
/// circuit fails fast without reaching the KMS, recovery goes through
/// HalfOpen back to Closed.
#[tokio::test]
async fn test_breaker_walk_against_failing_kms() {
    let kms = Arc::new(MockKms::new());
    kms.seed_key("app");
    kms.set_failing(true);

    let service = ReliabilityService::new("kms", fast_kms_preset());
    let token = CancellationToken::new();

    // failure_threshold executes, each one exhausting its retry budget
    for _ in 0..3 {
        let err = service
            .execute(&token, || kms.get_key_id("app"))
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::KmsUnavailable(_)));
    }
    assert_eq!(service.state(), CircuitState::Open);

    // Fail-fast: the KMS must not see this call
    let calls_before = kms.call_count();
    let err = service
        .execute(&token, || kms.get_key_id("app"))
        .await
        .unwrap_err();
    assert!(err.is_circuit_open());
    assert_eq!(kms.call_count(), calls_before);

    // KMS restored; after the open timeout one probe reaches HalfOpen and
    // success_threshold successes close the circuit
    kms.set_failing(false);
    tokio::time::sleep(Duration::from_millis(60)).await;

    service.execute(&token, || kms.get_key_id("app")).await.unwrap();
    assert_eq!(service.state(), CircuitState::HalfOpen);
    service.execute(&token, || kms.get_key_id("app")).await.unwrap();
    assert_eq!(service.state(), CircuitState::Closed);
}

/// A KMS that recovers within the retry budget never surfaces an error or
/// trips the breaker.
#[tokio::test]
async fn test_transient_blip_absorbed_by_retry() {
    let kms = Arc::new(MockKms::new());
    kms.seed_key("app");
    let service = ReliabilityService::new("kms", fast_kms_preset());
    let token = CancellationToken::new();

    let flipped = Arc::new(std::sync::atomic::AtomicBool::new(false));
    kms.set_failing(true);

    let kms_for_op = kms.clone();
    let flipped_for_op = flipped.clone();
    let result = service
        .execute(&token, move || {
            let kms = kms_for_op.clone();
            let flipped = flipped_for_op.clone();
            async move {
                // Heal the KMS after the first failed attempt
                let result = kms.get_key_id("app").await;
                if result.is_err() && !flipped.swap(true, std::sync::atomic::Ordering::SeqCst) {
                    kms.set_failing(false);
                }
                result
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(service.state(), CircuitState::Closed);
}

/// Engine-level: KMS failure during encrypt surfaces a retryable
/// KmsUnavailable annotated with the operation, and the record is treated
/// as invalid.
#[tokio::test]
async fn test_encrypt_surfaces_kms_failure() {
    let (crypto, kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    kms.set_failing(true);
    let mut record = sample_record();
    let err = crypto.encrypt_record(&token, &mut record).await.unwrap_err();
    assert!(matches!(err, CryptoError::KmsUnavailable(_)));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("wrap_dek"));

    // Collaborator restored: a fresh record processes fine
    kms.set_failing(false);
    let mut fresh = sample_record();
    crypto.encrypt_record(&token, &mut fresh).await.unwrap();
}

/// The engine health surface: Healthy after construction.
#[tokio::test]
async fn test_health_report() {
    let (crypto, _kms, _repo) = test_engine().await;
    let report = crypto.health_report();
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.checks.len(), 3);
    assert!(report.checks.iter().all(|c| c.healthy));
    let names: Vec<_> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"kms"));
    assert!(names.contains(&"storage"));
    assert!(names.contains(&"network"));
}

/// Decryption failures are never retried: the KMS sees exactly one
/// decrypt call for a corrupt envelope.
#[tokio::test]
async fn test_decryption_failure_not_retried() {
    let (crypto, kms, _repo) = test_engine().await;
    let token = CancellationToken::new();

    let mut record = sample_record();
    crypto.encrypt_record(&token, &mut record).await.unwrap();

    // Corrupt the wrapped DEK so the KMS-side unwrap succeeds but yields
    // garbage of the wrong length
    let mut wrapped = record.get_bytes("DEKEncrypted").unwrap();
    wrapped.pop();
    record
        .set_value(
            "DEKEncrypted",
            fieldcrypt_domain::value_objects::CanonicalValue::Bytes(wrapped),
        )
        .unwrap();

    let calls_before = kms.call_count();
    let err = crypto.decrypt_record(&token, &mut record).await.unwrap_err();
    assert!(matches!(err, CryptoError::DecryptionFailed(_)));
    // One storage lookup plus one KMS decrypt, no retries
    assert_eq!(kms.call_count(), calls_before + 1);
}
