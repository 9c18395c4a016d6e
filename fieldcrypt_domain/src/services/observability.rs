// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Observability Hook Port
//!
//! Optional collaborator notified at operation boundaries. Implementations
//! (tracing exporters, audit pipelines) are external; the core ships a
//! no-op default so the hook is never `Option`-checked at call sites.
//!
//! Hooks run synchronously on the caller's task and must be cheap; heavy
//! exporters should hand off to their own channel.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::CryptoError;

/// String attributes attached to hook notifications
pub type Attributes = HashMap<String, String>;

/// Observation points exposed by the engine.
pub trait ObservabilityHook: Send + Sync {
    /// An operation (encrypt_record, decrypt_record, rotate_kek, ...) began
    fn on_process_start(&self, op_name: &str, attrs: &Attributes);

    /// An operation finished; `error` is `None` on success
    fn on_process_complete(
        &self,
        op_name: &str,
        duration: Duration,
        error: Option<&CryptoError>,
        attrs: &Attributes,
    );

    /// An operation failed; called in addition to `on_process_complete`
    fn on_error(&self, op_name: &str, error: &CryptoError, attrs: &Attributes);

    /// A key operation (ensure_initial, rotate, wrap, unwrap) touched the
    /// key hierarchy at (alias, version)
    fn on_key_operation(&self, kind: &str, alias: &str, version: u32, attrs: &Attributes);
}

/// Default hook that observes nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopObservabilityHook;

impl ObservabilityHook for NoopObservabilityHook {
    fn on_process_start(&self, _op_name: &str, _attrs: &Attributes) {}

    fn on_process_complete(
        &self,
        _op_name: &str,
        _duration: Duration,
        _error: Option<&CryptoError>,
        _attrs: &Attributes,
    ) {
    }

    fn on_error(&self, _op_name: &str, _error: &CryptoError, _attrs: &Attributes) {}

    fn on_key_operation(&self, _kind: &str, _alias: &str, _version: u32, _attrs: &Attributes) {}
}
