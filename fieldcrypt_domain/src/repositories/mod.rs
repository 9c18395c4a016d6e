// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repositories
//!
//! Persistence ports. The domain works with the key-version metadata store
//! through [`KekVersionRepository`] without knowing the engine behind it;
//! the `fieldcrypt` crate ships a SQLite implementation and callers may
//! wire any other SQL-shaped engine.

pub mod kek_version_repository;

pub use kek_version_repository::KekVersionRepository;
