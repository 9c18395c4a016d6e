// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Retry Executor
//!
//! Bounded retry with pluggable backoff around transient collaborator
//! failures. Strategies: exponential with cap and jitter, fixed delay, and
//! linear ramp. Retries abort immediately on non-retryable error kinds, on
//! open circuits, and on cancellation; the sleep between attempts is itself
//! a cancellation point.

use std::time::Duration;

use rand::Rng;

use fieldcrypt_domain::CryptoError;

use crate::infrastructure::runtime::CancellationToken;

/// Delay schedule between attempts.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// `initial * multiplier^attempt`, capped at `max`; with `jitter` the
    /// sleep is drawn uniformly from the upper half of the computed delay
    /// to decorrelate competing workers
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
        jitter: bool,
    },
    /// The same delay before every attempt
    Fixed { delay: Duration },
    /// `initial + increment * attempt`, capped at `max`
    Linear {
        initial: Duration,
        increment: Duration,
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Conventional exponential profile: doubling with jitter.
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self::Exponential {
            initial,
            max,
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// Computes the delay before retrying after attempt `attempt`
    /// (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Exponential {
                initial,
                max,
                multiplier,
                jitter,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let raw = initial.as_millis() as f64 * factor;
                let capped = raw.min(max.as_millis() as f64).max(0.0) as u64;
                let millis = if *jitter && capped > 1 {
                    let half = capped / 2;
                    half + rand::rng().random_range(0..=capped - half)
                } else {
                    capped
                };
                Duration::from_millis(millis)
            }
            BackoffStrategy::Fixed { delay } => *delay,
            BackoffStrategy::Linear {
                initial,
                increment,
                max,
            } => {
                let raw = initial.saturating_add(*increment * attempt);
                raw.min(*max)
            }
        }
    }
}

/// Retry budget: attempt ceiling plus delay schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub strategy: BackoffStrategy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, strategy: BackoffStrategy) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            strategy,
        }
    }
}

/// Runs an operation under a retry policy.
///
/// `should_retry(error, attempt)` is consulted after every failure; the
/// executor additionally stops on non-retryable kinds, open circuits, and
/// cancellation regardless of the predicate, because retrying those can
/// never help.
///
/// # Errors
///
/// The last failure when attempts are exhausted, or `Cancelled` when the
/// token fires between attempts or during a sleep.
pub async fn execute_with_retry<T, F, Fut, P>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    should_retry: P,
    mut op: F,
) -> Result<T, CryptoError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, CryptoError>>,
    P: Fn(&CryptoError, u32) -> bool,
{
    let mut attempt = 0u32;
    loop {
        token.error_if_cancelled("retry")?;

        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let last_attempt = attempt + 1 >= policy.max_attempts;
                let hard_stop = !error.is_retryable()
                    || error.is_circuit_open()
                    || error.is_cancelled();
                if last_attempt || hard_stop || !should_retry(&error, attempt) {
                    return Err(error);
                }

                let delay = policy.strategy.delay_for(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying after transient failure"
                );
                tokio::select! {
                    _ = token.cancelled() => {
                        return Err(CryptoError::cancelled("retry sleep interrupted"));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}
