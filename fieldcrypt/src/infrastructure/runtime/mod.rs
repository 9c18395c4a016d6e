// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Utilities
//!
//! Cooperative cancellation shared by every suspension point: KMS calls,
//! metadata-store calls, retry sleeps, stream chunk loops, and batch
//! worker queues.

pub mod cancellation;

pub use cancellation::CancellationToken;
