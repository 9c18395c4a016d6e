// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! Orchestration of the envelope-encryption workflow over the domain
//! services and infrastructure implementations:
//!
//! - [`services`]: the DEK service, key-version manager, field and record
//!   processors, and the batch executor
//! - [`builder`]: declarative construction and validation of the engine
//! - [`envelope_crypto`]: the top-level facade callers hold

pub mod builder;
pub mod envelope_crypto;
pub mod services;

pub use builder::EnvelopeCryptoBuilder;
pub use envelope_crypto::EnvelopeCrypto;
pub use services::batch_executor::{BatchConfig, BatchProgress, BatchResult, ProgressCallback};
