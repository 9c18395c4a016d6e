// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reliability Presets
//!
//! Budget profiles per collaborator class. The KMS budget is the tightest:
//! a key service that is down blocks every record, so failing fast and
//! shedding load matters more than persistence. Storage sits in the middle
//! and generic network calls get the loosest budget.
//!
//! | Class | failure_threshold | open timeout | max_attempts | initial delay | max delay |
//! |---|---|---|---|---|---|
//! | KMS | 3 | 30 s | 3 | 200 ms | 10 s |
//! | Storage | 5 | 15 s | 5 | 100 ms | 5 s |
//! | Network | 7 | 45 s | 4 | 150 ms | 15 s |

use std::time::Duration;

use super::circuit_breaker::CircuitBreakerConfig;
use super::retry::{BackoffStrategy, RetryPolicy};

/// A breaker configuration paired with a retry budget.
#[derive(Debug, Clone)]
pub struct ReliabilityPreset {
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
}

impl ReliabilityPreset {
    /// KMS-class budget (tightest)
    pub fn kms() -> Self {
        Self {
            breaker: CircuitBreakerConfig {
                failure_threshold: 3,
                timeout: Duration::from_secs(30),
                success_threshold: 2,
                max_concurrent_probes: 1,
            },
            retry: RetryPolicy::new(
                3,
                BackoffStrategy::exponential(Duration::from_millis(200), Duration::from_secs(10)),
            ),
        }
    }

    /// Storage-class budget (medium)
    pub fn storage() -> Self {
        Self {
            breaker: CircuitBreakerConfig {
                failure_threshold: 5,
                timeout: Duration::from_secs(15),
                success_threshold: 2,
                max_concurrent_probes: 1,
            },
            retry: RetryPolicy::new(
                5,
                BackoffStrategy::exponential(Duration::from_millis(100), Duration::from_secs(5)),
            ),
        }
    }

    /// Network-class budget (loosest)
    pub fn network() -> Self {
        Self {
            breaker: CircuitBreakerConfig {
                failure_threshold: 7,
                timeout: Duration::from_secs(45),
                success_threshold: 2,
                max_concurrent_probes: 1,
            },
            retry: RetryPolicy::new(
                4,
                BackoffStrategy::exponential(Duration::from_millis(150), Duration::from_secs(15)),
            ),
        }
    }
}
