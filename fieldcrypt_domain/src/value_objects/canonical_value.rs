// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Canonical Value
//!
//! Typed representation of the closed set of values the system can encrypt
//! or hash. Every tagged field is reduced to a [`CanonicalValue`] before any
//! cryptographic operation, and the canonical byte form produced by the
//! serializer is the sole source of identity: two values hash identically
//! iff their canonical forms are byte-equal.
//!
//! ## Supported Kinds
//!
//! Strings, booleans, signed and unsigned integers of widths 8 through 64,
//! IEEE-754 floats, epoch-nanosecond timestamps, byte strings, and nullable
//! (optional) forms of all of the above. Fixed-length byte arrays are
//! represented as `Bytes`; a string-backed enumeration is represented as a
//! plain `String`, so both encode identically to their underlying kind.
//!
//! Compound aggregates (records, maps, non-byte slices) are intentionally
//! not representable here. Nested records are traversed structurally by the
//! record processor instead of being serialized as a single value.
//!
//! ## Zero Values
//!
//! Redaction after encryption replaces a field with its kind's zero value:
//! empty string, `0`, `false`, empty bytes, the Unix epoch, or `None` for
//! optional kinds. See [`CanonicalValue::zero`].

use serde::{Deserialize, Serialize};

/// Static type of a canonical value.
///
/// Used by field specifications to declare what a field holds and by the
/// deserializer to know what to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalKind {
    String,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Timestamp,
    Bytes,
    /// Nullable form of a scalar kind
    Optional(Box<CanonicalKind>),
}

impl CanonicalKind {
    /// Returns true when the kind is the nullable wrapper
    pub fn is_optional(&self) -> bool {
        matches!(self, CanonicalKind::Optional(_))
    }

    /// Strips one level of nullability, if present
    pub fn unwrap_optional(&self) -> &CanonicalKind {
        match self {
            CanonicalKind::Optional(inner) => inner,
            other => other,
        }
    }
}

impl std::fmt::Display for CanonicalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalKind::String => write!(f, "string"),
            CanonicalKind::Bool => write!(f, "bool"),
            CanonicalKind::Int8 => write!(f, "i8"),
            CanonicalKind::Int16 => write!(f, "i16"),
            CanonicalKind::Int32 => write!(f, "i32"),
            CanonicalKind::Int64 => write!(f, "i64"),
            CanonicalKind::UInt8 => write!(f, "u8"),
            CanonicalKind::UInt16 => write!(f, "u16"),
            CanonicalKind::UInt32 => write!(f, "u32"),
            CanonicalKind::UInt64 => write!(f, "u64"),
            CanonicalKind::Float32 => write!(f, "f32"),
            CanonicalKind::Float64 => write!(f, "f64"),
            CanonicalKind::Timestamp => write!(f, "timestamp"),
            CanonicalKind::Bytes => write!(f, "bytes"),
            CanonicalKind::Optional(inner) => write!(f, "optional<{}>", inner),
        }
    }
}

/// A value of one of the supported canonical kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    String(String),
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Bytes(Vec<u8>),
    /// Nullable form; the kind is kept so absent values stay typed
    Optional(CanonicalKind, Option<Box<CanonicalValue>>),
}

impl CanonicalValue {
    /// Returns the static kind of this value
    pub fn kind(&self) -> CanonicalKind {
        match self {
            CanonicalValue::String(_) => CanonicalKind::String,
            CanonicalValue::Bool(_) => CanonicalKind::Bool,
            CanonicalValue::Int8(_) => CanonicalKind::Int8,
            CanonicalValue::Int16(_) => CanonicalKind::Int16,
            CanonicalValue::Int32(_) => CanonicalKind::Int32,
            CanonicalValue::Int64(_) => CanonicalKind::Int64,
            CanonicalValue::UInt8(_) => CanonicalKind::UInt8,
            CanonicalValue::UInt16(_) => CanonicalKind::UInt16,
            CanonicalValue::UInt32(_) => CanonicalKind::UInt32,
            CanonicalValue::UInt64(_) => CanonicalKind::UInt64,
            CanonicalValue::Float32(_) => CanonicalKind::Float32,
            CanonicalValue::Float64(_) => CanonicalKind::Float64,
            CanonicalValue::Timestamp(_) => CanonicalKind::Timestamp,
            CanonicalValue::Bytes(_) => CanonicalKind::Bytes,
            CanonicalValue::Optional(kind, _) => CanonicalKind::Optional(Box::new(kind.clone())),
        }
    }

    /// Returns the zero value used to redact a field of the given kind
    pub fn zero(kind: &CanonicalKind) -> CanonicalValue {
        match kind {
            CanonicalKind::String => CanonicalValue::String(String::new()),
            CanonicalKind::Bool => CanonicalValue::Bool(false),
            CanonicalKind::Int8 => CanonicalValue::Int8(0),
            CanonicalKind::Int16 => CanonicalValue::Int16(0),
            CanonicalKind::Int32 => CanonicalValue::Int32(0),
            CanonicalKind::Int64 => CanonicalValue::Int64(0),
            CanonicalKind::UInt8 => CanonicalValue::UInt8(0),
            CanonicalKind::UInt16 => CanonicalValue::UInt16(0),
            CanonicalKind::UInt32 => CanonicalValue::UInt32(0),
            CanonicalKind::UInt64 => CanonicalValue::UInt64(0),
            CanonicalKind::Float32 => CanonicalValue::Float32(0.0),
            CanonicalKind::Float64 => CanonicalValue::Float64(0.0),
            CanonicalKind::Timestamp => {
                CanonicalValue::Timestamp(chrono::DateTime::from_timestamp_nanos(0))
            }
            CanonicalKind::Bytes => CanonicalValue::Bytes(Vec::new()),
            CanonicalKind::Optional(inner) => {
                CanonicalValue::Optional((**inner).clone(), None)
            }
        }
    }

    /// Returns true when this value is the zero value for its kind
    pub fn is_zero(&self) -> bool {
        *self == Self::zero(&self.kind())
    }

    /// Convenience constructor for present optional values
    pub fn some(value: CanonicalValue) -> CanonicalValue {
        let kind = value.kind();
        CanonicalValue::Optional(kind, Some(Box::new(value)))
    }

    /// Convenience constructor for absent optional values
    pub fn none(kind: CanonicalKind) -> CanonicalValue {
        CanonicalValue::Optional(kind, None)
    }

    /// Extracts a string slice, if this value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the byte payload, if this value is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CanonicalValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Extracts an unsigned 32-bit integer, if that is the kind
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            CanonicalValue::UInt32(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for CanonicalValue {
    fn from(s: &str) -> Self {
        CanonicalValue::String(s.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(s: String) -> Self {
        CanonicalValue::String(s)
    }
}

impl From<Vec<u8>> for CanonicalValue {
    fn from(b: Vec<u8>) -> Self {
        CanonicalValue::Bytes(b)
    }
}
