// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Batch Executor
//!
//! Runs the record processor over a collection with bounded concurrency.
//!
//! ## Scheduling Model
//!
//! `max_concurrency` worker tasks claim record indices from a shared
//! atomic counter, take the record out of its slot, process it, and put it
//! back. Outcomes flow through a bounded channel to a single collector
//! loop on the caller's task, which updates counters and invokes the
//! progress callback, so the callback is strictly serialized even though
//! completion order is nondeterministic. Workers share no mutable state
//! beyond the claim counter, the stop flag, and the slot vector.
//!
//! ## Modes
//!
//! - **collect-all** (default): every record is attempted; per-record
//!   errors are gathered into the result
//! - **stop-on-first-error**: the first failure raises the stop flag; no
//!   new records are claimed, in-flight records finish
//!
//! ## Cancellation
//!
//! Between records: a cancelled token stops workers from claiming further
//! indices; records already processed are returned as completed, the rest
//! come back untouched.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use fieldcrypt_domain::entities::ProtectedRecord;
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::runtime::CancellationToken;

use super::record_processor::RecordProcessor;

/// Batch tuning knobs.
#[derive(Clone)]
pub struct BatchConfig {
    /// Worker-task ceiling (>= 1); defaults to the machine's available
    /// parallelism
    pub max_concurrency: usize,
    /// Raise the stop flag on the first per-record failure
    pub stop_on_first_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            stop_on_first_error: false,
        }
    }
}

/// One progress notification, emitted after each attempted record.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Records attempted so far (success or failure)
    pub processed: usize,
    /// Collection size
    pub total: usize,
    /// Index of the record this notification is about
    pub index: usize,
    /// The record's error, if it failed
    pub error: Option<CryptoError>,
}

/// Serialized progress callback.
pub type ProgressCallback = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// Outcome of a batch run.
pub struct BatchResult<R> {
    /// Records in input order; failed and unattempted records come back in
    /// whatever state they were left in and must be treated as invalid
    pub records: Vec<R>,
    /// Per-record errors by input index
    pub errors: Vec<(usize, CryptoError)>,
    /// Records that completed successfully
    pub processed: usize,
    /// Records that failed
    pub failed: usize,
    /// True when the run ended because the token was cancelled
    pub cancelled: bool,
}

impl<R> BatchResult<R> {
    /// Records attempted: `processed + failed`
    pub fn attempted(&self) -> usize {
        self.processed + self.failed
    }
}

enum BatchMode {
    Encrypt,
    Decrypt,
}

/// Bounded-parallel execution of the record processor.
pub struct BatchExecutor {
    processor: Arc<RecordProcessor>,
    config: BatchConfig,
}

impl BatchExecutor {
    pub fn new(processor: Arc<RecordProcessor>, config: BatchConfig) -> Self {
        Self { processor, config }
    }

    /// Encrypts every record in the collection.
    pub async fn encrypt_batch<R>(
        &self,
        token: &CancellationToken,
        records: Vec<R>,
        progress: Option<ProgressCallback>,
    ) -> BatchResult<R>
    where
        R: ProtectedRecord + 'static,
    {
        self.run(token, records, progress, BatchMode::Encrypt).await
    }

    /// Decrypts every record in the collection.
    pub async fn decrypt_batch<R>(
        &self,
        token: &CancellationToken,
        records: Vec<R>,
        progress: Option<ProgressCallback>,
    ) -> BatchResult<R>
    where
        R: ProtectedRecord + 'static,
    {
        self.run(token, records, progress, BatchMode::Decrypt).await
    }

    async fn run<R>(
        &self,
        token: &CancellationToken,
        records: Vec<R>,
        progress: Option<ProgressCallback>,
        mode: BatchMode,
    ) -> BatchResult<R>
    where
        R: ProtectedRecord + 'static,
    {
        let total = records.len();
        if total == 0 {
            return BatchResult {
                records,
                errors: Vec::new(),
                processed: 0,
                failed: 0,
                cancelled: token.is_cancelled(),
            };
        }

        let slots: Arc<Mutex<Vec<Option<R>>>> =
            Arc::new(Mutex::new(records.into_iter().map(Some).collect()));
        let next_index = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let mode = Arc::new(mode);

        let queue_bound = derive_batch_size(total);
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<(usize, Option<CryptoError>)>(queue_bound);

        let worker_count = self.config.max_concurrency.max(1).min(total);
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let slots = slots.clone();
            let next_index = next_index.clone();
            let stop = stop.clone();
            let token = token.clone();
            let processor = self.processor.clone();
            let outcome_tx = outcome_tx.clone();
            let mode = mode.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if token.is_cancelled() || stop.load(Ordering::SeqCst) {
                        break;
                    }
                    let index = next_index.fetch_add(1, Ordering::SeqCst);
                    if index >= total {
                        break;
                    }

                    let record = slots.lock()[index].take();
                    let Some(mut record) = record else { break };

                    let result = match *mode {
                        BatchMode::Encrypt => {
                            processor.encrypt_record(&token, &mut record).await
                        }
                        BatchMode::Decrypt => {
                            processor.decrypt_record(&token, &mut record).await
                        }
                    };
                    slots.lock()[index] = Some(record);

                    if outcome_tx.send((index, result.err())).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(outcome_tx);

        // Single collector loop: counters and the progress callback are
        // strictly serialized here
        let mut errors: Vec<(usize, CryptoError)> = Vec::new();
        let mut processed = 0usize;
        let mut failed = 0usize;
        while let Some((index, error)) = outcome_rx.recv().await {
            match &error {
                Some(err) => {
                    failed += 1;
                    errors.push((index, err.clone()));
                    if self.config.stop_on_first_error {
                        stop.store(true, Ordering::SeqCst);
                    }
                }
                None => processed += 1,
            }
            if let Some(callback) = &progress {
                callback(&BatchProgress {
                    processed: processed + failed,
                    total,
                    index,
                    error,
                });
            }
        }

        for handle in handles {
            if let Err(join_error) = handle.await {
                tracing::warn!(error = %join_error, "batch worker task failed to join");
            }
        }

        errors.sort_by_key(|(index, _)| *index);
        let records: Vec<R> = match Arc::try_unwrap(slots) {
            Ok(mutex) => mutex.into_inner(),
            Err(arc) => arc.lock().drain(..).collect(),
        }
        .into_iter()
        .flatten()
        .collect();

        tracing::debug!(
            total,
            processed,
            failed,
            cancelled = token.is_cancelled(),
            "batch run finished"
        );

        BatchResult {
            records,
            errors,
            processed,
            failed,
            cancelled: token.is_cancelled(),
        }
    }
}

/// Derives the internal queue bound from the collection size: small
/// collections are unbatched, large ones target size/10 clamped to
/// [10, 1000].
fn derive_batch_size(total: usize) -> usize {
    if total <= 10 {
        total.max(1)
    } else {
        (total / 10).clamp(10, 1000)
    }
}
