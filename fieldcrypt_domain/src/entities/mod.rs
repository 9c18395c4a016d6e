// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entities
//!
//! Domain objects with identity and lifecycle:
//!
//! - [`KekVersionRecord`]: one row of the key-version metadata store,
//!   identified by (alias, version)
//! - [`ProtectedRecord`]: the contract a record type satisfies to be
//!   processed by the envelope-encryption engine; generated glue or
//!   hand-written impls provide it for concrete types
//! - [`DynamicRecord`]: the shipped map-backed implementation for callers
//!   without generated glue

pub mod dynamic_record;
pub mod kek_version_record;
pub mod protected_record;

pub use dynamic_record::DynamicRecord;
pub use kek_version_record::KekVersionRecord;
pub use protected_record::{validate_record, FieldKind, FieldSpec, ProtectedRecord};
