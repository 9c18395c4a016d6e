// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Circuit Breaker
//!
//! Three-state breaker protecting a collaborator:
//!
//! - **Closed**: calls pass through; counted failures increment a
//!   consecutive-failure counter; reaching the threshold opens the circuit
//! - **Open**: calls fail fast with `CircuitOpen` carrying the time the
//!   next probe is admitted; no load reaches the collaborator
//! - **HalfOpen**: entered automatically once the open timeout elapses;
//!   admits a bounded number of concurrent probes; a run of consecutive
//!   successes closes the circuit, any counted failure reopens it
//!
//! A caller-supplied predicate decides which errors count as failures
//! (default: every error). State transitions notify an optional callback
//! and are logged at `warn`/`info`.
//!
//! State lives behind a `parking_lot` mutex that is never held across an
//! await; the protected operation runs outside the lock.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use fieldcrypt_domain::CryptoError;

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Breaker tuning knobs.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive counted failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting probes
    pub timeout: Duration,
    /// Consecutive successes in HalfOpen that close the circuit
    pub success_threshold: u32,
    /// Concurrent probes admitted in HalfOpen
    pub max_concurrent_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
            max_concurrent_probes: 1,
        }
    }
}

/// Callback invoked on every state transition with (from, to)
pub type StateChangeCallback = Box<dyn Fn(CircuitState, CircuitState) + Send + Sync>;

/// Predicate deciding whether an error counts as a breaker failure
pub type FailurePredicate = Box<dyn Fn(&CryptoError) -> bool + Send + Sync>;

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    next_attempt_instant: Option<Instant>,
    next_attempt_at: Option<chrono::DateTime<chrono::Utc>>,
    active_probes: u32,
}

/// Named circuit breaker.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    on_state_change: Option<StateChangeCallback>,
    counts_as_failure: FailurePredicate,
}

/// How `before_call` admitted the call
#[derive(Clone, Copy)]
enum Admission {
    Normal,
    Probe,
}

impl CircuitBreaker {
    /// Creates a breaker where every error counts as a failure.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self::with_predicate(name, config, Box::new(|_| true))
    }

    /// Creates a breaker with a custom failure predicate.
    pub fn with_predicate(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
        counts_as_failure: FailurePredicate,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                next_attempt_instant: None,
                next_attempt_at: None,
                active_probes: 0,
            }),
            on_state_change: None,
            counts_as_failure,
        }
    }

    /// Installs a state-transition callback.
    pub fn with_state_change_callback(mut self, callback: StateChangeCallback) -> Self {
        self.on_state_change = Some(callback);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state (as last transitioned; Open flips to HalfOpen lazily
    /// on the next admitted call)
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Healthy means calls are being admitted: Closed or HalfOpen
    pub fn is_healthy(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Runs an operation inside the breaker.
    ///
    /// # Errors
    ///
    /// Fails fast with `CircuitOpen` when the circuit is open or the
    /// half-open probe budget is exhausted; otherwise returns the
    /// operation's own result.
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, CryptoError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, CryptoError>>,
    {
        let admission = self.before_call()?;
        let result = op().await;
        self.after_call(admission, &result);
        result
    }

    fn before_call(&self) -> Result<Admission, CryptoError> {
        let mut transition = None;
        let admitted = {
            let mut inner = self.inner.lock();
            match inner.state {
                CircuitState::Closed => Ok(Admission::Normal),
                CircuitState::Open => {
                    let elapsed = inner
                        .next_attempt_instant
                        .map(|at| Instant::now() >= at)
                        .unwrap_or(true);
                    if elapsed {
                        transition =
                            Some(self.transition(&mut inner, CircuitState::HalfOpen));
                        inner.active_probes = 1;
                        Ok(Admission::Probe)
                    } else {
                        Err(self.open_error(&inner))
                    }
                }
                CircuitState::HalfOpen => {
                    if inner.active_probes < self.config.max_concurrent_probes {
                        inner.active_probes += 1;
                        Ok(Admission::Probe)
                    } else {
                        Err(CryptoError::CircuitOpen {
                            message: format!(
                                "{}: half-open probe budget exhausted",
                                self.name
                            ),
                            next_attempt_at: chrono::Utc::now(),
                        })
                    }
                }
            }
        };
        if let Some((from, to)) = transition {
            self.notify(from, to);
        }
        admitted
    }

    fn after_call<T>(&self, admission: Admission, result: &Result<T, CryptoError>) {
        let mut transition = None;
        {
            let mut inner = self.inner.lock();
            if matches!(admission, Admission::Probe) {
                inner.active_probes = inner.active_probes.saturating_sub(1);
            }
            match result {
                Ok(_) => match inner.state {
                    CircuitState::Closed => {
                        inner.consecutive_failures = 0;
                    }
                    CircuitState::HalfOpen => {
                        inner.consecutive_successes += 1;
                        if inner.consecutive_successes >= self.config.success_threshold {
                            transition = Some(self.transition(&mut inner, CircuitState::Closed));
                        }
                    }
                    CircuitState::Open => {}
                },
                Err(error) => {
                    if (self.counts_as_failure)(error) {
                        match inner.state {
                            CircuitState::Closed => {
                                inner.consecutive_failures += 1;
                                if inner.consecutive_failures >= self.config.failure_threshold {
                                    transition =
                                        Some(self.transition(&mut inner, CircuitState::Open));
                                }
                            }
                            CircuitState::HalfOpen => {
                                transition = Some(self.transition(&mut inner, CircuitState::Open));
                            }
                            CircuitState::Open => {}
                        }
                    }
                }
            }
        }
        if let Some((from, to)) = transition {
            self.notify(from, to);
        }
    }

    /// Applies a transition under the lock, returning (from, to) for the
    /// callback invoked after the lock is released.
    fn transition(
        &self,
        inner: &mut BreakerInner,
        to: CircuitState,
    ) -> (CircuitState, CircuitState) {
        let from = inner.state;
        inner.state = to;
        match to {
            CircuitState::Open => {
                inner.next_attempt_instant = Some(Instant::now() + self.config.timeout);
                inner.next_attempt_at = Some(
                    chrono::Utc::now()
                        + chrono::Duration::from_std(self.config.timeout)
                            .unwrap_or_else(|_| chrono::Duration::seconds(30)),
                );
                inner.consecutive_successes = 0;
            }
            CircuitState::HalfOpen => {
                inner.consecutive_successes = 0;
                inner.active_probes = 0;
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.consecutive_successes = 0;
                inner.next_attempt_instant = None;
                inner.next_attempt_at = None;
            }
        }
        (from, to)
    }

    fn notify(&self, from: CircuitState, to: CircuitState) {
        match to {
            CircuitState::Open => {
                tracing::warn!(breaker = %self.name, %from, %to, "circuit opened")
            }
            _ => tracing::info!(breaker = %self.name, %from, %to, "circuit state changed"),
        }
        if let Some(callback) = &self.on_state_change {
            callback(from, to);
        }
    }

    fn open_error(&self, inner: &BreakerInner) -> CryptoError {
        CryptoError::CircuitOpen {
            message: format!("{}: circuit is open", self.name),
            next_attempt_at: inner.next_attempt_at.unwrap_or_else(chrono::Utc::now),
        }
    }
}
