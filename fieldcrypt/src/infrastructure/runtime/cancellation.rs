// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancellation Token
//!
//! Lightweight clonable token propagating cancellation to async work.
//!
//! ## Usage
//!
//! ```rust
//! use fieldcrypt::infrastructure::runtime::CancellationToken;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let token = CancellationToken::new();
//!     let worker_token = token.clone();
//!
//!     tokio::spawn(async move {
//!         tokio::select! {
//!             _ = worker_token.cancelled() => {
//!                 // shut down between records
//!             }
//!             _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                 // work
//!             }
//!         }
//!     });
//!
//!     token.cancel();
//! }
//! ```
//!
//! A cancelled token aborts in-flight retries at their next suspension
//! point, prevents new batch workers from claiming records, and makes
//! [`CancellationToken::error_if_cancelled`] return the `Cancelled` error
//! kind for uniform propagation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use fieldcrypt_domain::CryptoError;

/// Clonable cancellation token.
///
/// All clones observe the same flag; cancelling any clone cancels them all.
#[derive(Clone, Default)]
pub struct CancellationToken {
    /// Shared cancellation flag
    cancelled: Arc<AtomicBool>,
    /// Notification for waiters
    notify: Arc<Notify>,
}

impl CancellationToken {
    /// Creates a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels this token and wakes every waiter
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Checks for cancellation without blocking
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Waits until the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register interest before re-checking so a cancel between the
            // check and the await cannot be missed
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Maps the cancelled state onto the error taxonomy
    pub fn error_if_cancelled(&self, operation: &str) -> Result<(), CryptoError> {
        if self.is_cancelled() {
            Err(CryptoError::cancelled(operation.to_string()))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
