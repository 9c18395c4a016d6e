// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, self-validating values of the envelope-encryption domain.
//! A value object that exists has already passed its invariants: a
//! [`KekAlias`] matches the alias grammar, a [`Pepper`] is within bounds and
//! non-zero, an [`Argon2Params`] meets the hardness floor.
//!
//! - [`CanonicalValue`] / [`CanonicalKind`]: the closed type set subject to
//!   encryption and hashing
//! - [`TagSet`] / [`FieldTag`]: the `encx` tag vocabulary and companion
//!   naming rules
//! - [`DataKey`]: a per-record 32-byte data-encryption key, zeroized on drop
//! - [`KekAlias`] / [`KeyVersion`]: the key-hierarchy coordinates
//! - [`Pepper`]: the deployment-wide hashing secret
//! - [`Argon2Params`]: validated secure-hash cost parameters
//! - [`EncryptionMetadata`]: the optional portable metadata blob

pub mod argon2_params;
pub mod canonical_value;
pub mod data_key;
pub mod encryption_metadata;
pub mod kek_alias;
pub mod key_version;
pub mod pepper;
pub mod tag_set;

pub use argon2_params::Argon2Params;
pub use canonical_value::{CanonicalKind, CanonicalValue};
pub use data_key::{DataKey, DEK_LENGTH};
pub use encryption_metadata::EncryptionMetadata;
pub use kek_alias::KekAlias;
pub use key_version::KeyVersion;
pub use pepper::Pepper;
pub use tag_set::{FieldTag, TagSet, DEK_ENCRYPTED_FIELD, DEK_FIELD, KEY_VERSION_FIELD, TAG_KEY};
