// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Collector Port
//!
//! Minimal metrics surface the engine reports into. Concrete backends are
//! external collaborators; the no-op default keeps call sites unconditional.

use std::time::Duration;

/// Sink for operation timings and counters.
pub trait MetricsCollector: Send + Sync {
    /// Records one completed operation with its outcome
    fn record_operation(&self, name: &str, duration: Duration, success: bool);

    /// Increments a named counter by one
    fn increment_counter(&self, name: &str);
}

/// Default collector that records nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopMetricsCollector;

impl MetricsCollector for NoopMetricsCollector {
    fn record_operation(&self, _name: &str, _duration: Duration, _success: bool) {}

    fn increment_counter(&self, _name: &str) {}
}
