// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Canonical Serializer
//!
//! Deterministic, language-neutral binary encoding for the closed canonical
//! type set. The canonical form is the sole source of identity for both
//! encryption plaintexts and hash inputs: identical inputs must produce
//! identical bytes across processes and releases, so any change to this
//! layout is a breaking change to every hash at rest.
//!
//! ## Encoding Rules (little-endian throughout)
//!
//! | Kind | Layout |
//! |---|---|
//! | string, bytes | u32 LE length, then raw bytes |
//! | integer of width W | W/8 bytes little-endian, two's complement |
//! | f32 / f64 | IEEE-754 bit pattern, little-endian |
//! | bool | one byte, 0x00 or 0x01 |
//! | timestamp | i64 nanoseconds since the Unix epoch, little-endian |
//! | optional T | one tag byte: 0x00 absent (no payload), 0x01 present then T |
//!
//! A fixed byte array of length N encodes identically to a byte string of
//! length N, and a string-backed enumeration encodes identically to its
//! underlying string, so static-type distinctions that share an underlying
//! kind cannot produce distinct hashes.
//!
//! ## Contract
//!
//! - `serialize` is total on the supported set
//! - encoding is bijective on byte equality of canonical forms
//! - `deserialize` consumes the entire input; short inputs fail with a
//!   distinct "insufficient data" error and trailing bytes are rejected

use crate::error::CryptoError;
use crate::value_objects::{CanonicalKind, CanonicalValue};

/// Stable label identifying this encoding in metadata blobs
pub const SERIALIZER_ID: &str = "fieldcrypt-binary-v1";

/// Present/absent tag bytes for optional values
const TAG_ABSENT: u8 = 0x00;
const TAG_PRESENT: u8 = 0x01;

/// Encodes a canonical value to its unique byte form.
///
/// # Errors
///
/// Returns `CryptoError::Serialization` for payloads whose length exceeds
/// `u32::MAX` and for timestamps outside the representable nanosecond
/// range.
pub fn serialize(value: &CanonicalValue) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::new();
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &CanonicalValue, out: &mut Vec<u8>) -> Result<(), CryptoError> {
    match value {
        CanonicalValue::String(s) => write_len_prefixed(s.as_bytes(), out),
        CanonicalValue::Bytes(b) => write_len_prefixed(b, out),
        CanonicalValue::Bool(b) => {
            out.push(if *b { 0x01 } else { 0x00 });
            Ok(())
        }
        CanonicalValue::Int8(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Int16(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Int32(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Int64(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::UInt8(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::UInt16(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::UInt32(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::UInt64(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Float32(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Float64(v) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Timestamp(ts) => {
            let nanos = ts.timestamp_nanos_opt().ok_or_else(|| {
                CryptoError::Serialization(format!(
                    "timestamp {} outside the representable nanosecond range",
                    ts
                ))
            })?;
            out.extend_from_slice(&nanos.to_le_bytes());
            Ok(())
        }
        CanonicalValue::Optional(_, inner) => match inner {
            None => {
                out.push(TAG_ABSENT);
                Ok(())
            }
            Some(value) => {
                out.push(TAG_PRESENT);
                write_value(value, out)
            }
        },
    }
}

fn write_len_prefixed(bytes: &[u8], out: &mut Vec<u8>) -> Result<(), CryptoError> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        CryptoError::Serialization(format!(
            "payload of {} bytes exceeds the u32 length prefix",
            bytes.len()
        ))
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decodes a canonical value of the given kind, consuming the whole input.
///
/// # Errors
///
/// - `CryptoError::Serialization("insufficient data: ...")` when the input
///   is shorter than the kind requires
/// - `CryptoError::Serialization` for trailing bytes, invalid bool or
///   optional tag bytes, and non-UTF-8 string payloads
pub fn deserialize(kind: &CanonicalKind, bytes: &[u8]) -> Result<CanonicalValue, CryptoError> {
    let mut cursor = Cursor { bytes, pos: 0 };
    let value = read_value(kind, &mut cursor)?;
    if cursor.pos != bytes.len() {
        return Err(CryptoError::Serialization(format!(
            "{} trailing bytes after {}",
            bytes.len() - cursor.pos,
            kind
        )));
    }
    Ok(value)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], CryptoError> {
        let remaining = self.bytes.len() - self.pos;
        if remaining < n {
            return Err(CryptoError::insufficient_data(format!(
                "{} needs {} bytes, {} remaining",
                what, n, remaining
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u8(&mut self, what: &str) -> Result<u8, CryptoError> {
        Ok(self.take(1, what)?[0])
    }
}

fn read_value(kind: &CanonicalKind, cursor: &mut Cursor<'_>) -> Result<CanonicalValue, CryptoError> {
    match kind {
        CanonicalKind::String => {
            let payload = read_len_prefixed(cursor, "string")?;
            let s = std::str::from_utf8(payload).map_err(|e| {
                CryptoError::Serialization(format!("string payload is not UTF-8: {}", e))
            })?;
            Ok(CanonicalValue::String(s.to_string()))
        }
        CanonicalKind::Bytes => {
            let payload = read_len_prefixed(cursor, "bytes")?;
            Ok(CanonicalValue::Bytes(payload.to_vec()))
        }
        CanonicalKind::Bool => match cursor.take_u8("bool")? {
            0x00 => Ok(CanonicalValue::Bool(false)),
            0x01 => Ok(CanonicalValue::Bool(true)),
            other => Err(CryptoError::Serialization(format!(
                "invalid bool byte 0x{:02x}",
                other
            ))),
        },
        CanonicalKind::Int8 => Ok(CanonicalValue::Int8(i8::from_le_bytes(
            cursor.take(1, "i8")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Int16 => Ok(CanonicalValue::Int16(i16::from_le_bytes(
            cursor.take(2, "i16")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Int32 => Ok(CanonicalValue::Int32(i32::from_le_bytes(
            cursor.take(4, "i32")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Int64 => Ok(CanonicalValue::Int64(i64::from_le_bytes(
            cursor.take(8, "i64")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::UInt8 => Ok(CanonicalValue::UInt8(u8::from_le_bytes(
            cursor.take(1, "u8")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::UInt16 => Ok(CanonicalValue::UInt16(u16::from_le_bytes(
            cursor.take(2, "u16")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::UInt32 => Ok(CanonicalValue::UInt32(u32::from_le_bytes(
            cursor.take(4, "u32")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::UInt64 => Ok(CanonicalValue::UInt64(u64::from_le_bytes(
            cursor.take(8, "u64")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Float32 => Ok(CanonicalValue::Float32(f32::from_le_bytes(
            cursor.take(4, "f32")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Float64 => Ok(CanonicalValue::Float64(f64::from_le_bytes(
            cursor.take(8, "f64")?.try_into().expect("length checked"),
        ))),
        CanonicalKind::Timestamp => {
            let nanos = i64::from_le_bytes(
                cursor
                    .take(8, "timestamp")?
                    .try_into()
                    .expect("length checked"),
            );
            Ok(CanonicalValue::Timestamp(
                chrono::DateTime::from_timestamp_nanos(nanos),
            ))
        }
        CanonicalKind::Optional(inner) => match cursor.take_u8("optional tag")? {
            TAG_ABSENT => Ok(CanonicalValue::Optional((**inner).clone(), None)),
            TAG_PRESENT => {
                let value = read_value(inner, cursor)?;
                Ok(CanonicalValue::Optional(
                    (**inner).clone(),
                    Some(Box::new(value)),
                ))
            }
            other => Err(CryptoError::Serialization(format!(
                "invalid optional tag byte 0x{:02x}",
                other
            ))),
        },
    }
}

fn read_len_prefixed<'a>(cursor: &mut Cursor<'a>, what: &str) -> Result<&'a [u8], CryptoError> {
    let len_bytes = cursor.take(4, what)?;
    let len = u32::from_le_bytes(len_bytes.try_into().expect("length checked")) as usize;
    cursor.take(len, what)
}
