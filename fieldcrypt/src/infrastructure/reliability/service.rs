// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reliability Service
//!
//! Named composition of a circuit breaker around a retrying executor: the
//! breaker sees the post-retry outcome, so a collaborator that recovers
//! within the retry budget never trips the circuit, while one that stays
//! down accrues exactly one counted failure per `execute`.
//!
//! The composed breaker counts only kind-retryable failures: a
//! `DecryptionFailed` flowing through the KMS service is a data problem,
//! not a KMS outage, and must not shed load from healthy infrastructure.

use fieldcrypt_domain::CryptoError;

use crate::infrastructure::runtime::CancellationToken;

use super::circuit_breaker::{CircuitBreaker, CircuitState};
use super::policy::ReliabilityPreset;
use super::retry::{execute_with_retry, RetryPolicy};

/// Breaker-around-retry with a stable name for health reporting.
pub struct ReliabilityService {
    name: String,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl ReliabilityService {
    /// Creates a named service from a preset budget.
    pub fn new(name: impl Into<String>, preset: ReliabilityPreset) -> Self {
        let name = name.into();
        let breaker = CircuitBreaker::with_predicate(
            name.clone(),
            preset.breaker,
            Box::new(|e: &CryptoError| e.is_retryable()),
        );
        Self {
            name,
            breaker,
            retry: preset.retry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Healthy means the breaker is admitting calls
    pub fn is_healthy(&self) -> bool {
        self.breaker.is_healthy()
    }

    /// Runs `op` inside the circuit, which wraps the retrying executor.
    pub async fn execute<T, F, Fut>(
        &self,
        token: &CancellationToken,
        op: F,
    ) -> Result<T, CryptoError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CryptoError>>,
    {
        self.breaker
            .call(|| async {
                execute_with_retry(&self.retry, token, |e, _| e.is_retryable(), || op()).await
            })
            .await
    }

    /// Like [`execute`](Self::execute), but runs `fallback` when the
    /// primary path fails with an open circuit or a retried-out transient
    /// error. Final errors (authentication, decryption, validation)
    /// propagate without consulting the fallback.
    pub async fn execute_with_fallback<T, F, Fut, FB, FutB>(
        &self,
        token: &CancellationToken,
        op: F,
        fallback: FB,
    ) -> Result<T, CryptoError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CryptoError>>,
        FB: FnOnce() -> FutB,
        FutB: std::future::Future<Output = Result<T, CryptoError>>,
    {
        match self.execute(token, op).await {
            Ok(value) => Ok(value),
            Err(error) if error.is_circuit_open() || error.is_retryable() => {
                tracing::debug!(service = %self.name, error = %error, "primary path failed, using fallback");
                fallback().await
            }
            Err(error) => Err(error),
        }
    }
}
