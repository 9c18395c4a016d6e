// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Framed Stream Encryption
//!
//! Chunked AEAD for values too large to buffer. The encryptor reads the
//! source in fixed-size blocks (4 KiB by default), seals each block
//! independently under the record DEK, and writes
//! `length u32 BE || sealed_block` records to the sink. The decryptor reads
//! a length header, validates it against the 10 MiB chunk cap before
//! allocating, reads exactly that many bytes, opens them, and repeats to
//! end of input.
//!
//! ## Framing Errors
//!
//! - a zero length header
//! - a length header above [`MAX_CHUNK`] (memory-exhaustion guard: nothing
//!   is allocated for an oversized header)
//! - a short read against a promised length
//!
//! All three are `DecryptionFailed`; a corrupted frame cannot be retried
//! into validity.
//!
//! Cancellation is observed between chunks on both paths.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use fieldcrypt_domain::value_objects::DataKey;
use fieldcrypt_domain::CryptoError;

use crate::infrastructure::runtime::CancellationToken;

use super::aes_gcm::{AesGcmCipher, NONCE_LENGTH};

/// Default plaintext block size (4 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

/// Maximum sealed chunk length the decryptor accepts (10 MiB)
pub const MAX_CHUNK: usize = 10 * 1024 * 1024;

/// GCM authentication tag length in bytes
const TAG_LENGTH: usize = 16;

/// Per-chunk sealing overhead: nonce plus tag
const CHUNK_OVERHEAD: usize = NONCE_LENGTH + TAG_LENGTH;

/// Encrypts a stream in fixed-size blocks, writing length-prefixed sealed
/// frames. Returns the number of plaintext bytes consumed.
///
/// # Errors
///
/// - `InvalidConfiguration` for a zero block size or one whose sealed form
///   would exceed the chunk cap
/// - `EncryptionFailed` for seal failures and sink write failures
/// - `Cancelled` when the token fires between chunks
pub async fn encrypt_stream<R, W>(
    cipher: &AesGcmCipher,
    key: &DataKey,
    token: &CancellationToken,
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64, CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if chunk_size == 0 {
        return Err(CryptoError::invalid_config("stream chunk size must be > 0"));
    }
    if chunk_size + CHUNK_OVERHEAD > MAX_CHUNK {
        return Err(CryptoError::invalid_config(format!(
            "stream chunk size {} would exceed the {} byte sealed-chunk cap",
            chunk_size, MAX_CHUNK
        )));
    }

    let mut buffer = vec![0u8; chunk_size];
    let mut total: u64 = 0;

    loop {
        token.error_if_cancelled("encrypt_stream")?;

        let filled = fill_block(reader, &mut buffer).await?;
        if filled == 0 {
            break;
        }
        total += filled as u64;

        let sealed = cipher.encrypt(&buffer[..filled], key)?;
        let frame_len = u32::try_from(sealed.len()).map_err(|_| {
            CryptoError::encryption_failed("sealed chunk exceeds the u32 frame header")
        })?;
        writer
            .write_all(&frame_len.to_be_bytes())
            .await
            .map_err(|e| CryptoError::encryption_failed(format!("stream write failed: {}", e)))?;
        writer
            .write_all(&sealed)
            .await
            .map_err(|e| CryptoError::encryption_failed(format!("stream write failed: {}", e)))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| CryptoError::encryption_failed(format!("stream flush failed: {}", e)))?;
    Ok(total)
}

/// Decrypts a framed stream, writing recovered plaintext to the sink.
/// Returns the number of plaintext bytes produced.
///
/// # Errors
///
/// - `DecryptionFailed` for framing violations (zero length, length above
///   [`MAX_CHUNK`], short reads) and authentication failures
/// - `Cancelled` when the token fires between chunks
pub async fn decrypt_stream<R, W>(
    cipher: &AesGcmCipher,
    key: &DataKey,
    token: &CancellationToken,
    reader: &mut R,
    writer: &mut W,
) -> Result<u64, CryptoError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut total: u64 = 0;

    loop {
        token.error_if_cancelled("decrypt_stream")?;

        let frame_len = match read_frame_header(reader).await? {
            None => break,
            Some(len) => len,
        };

        if frame_len == 0 {
            return Err(CryptoError::decryption_failed(
                "framing error: zero-length chunk header",
            ));
        }
        let frame_len = frame_len as usize;
        if frame_len > MAX_CHUNK {
            return Err(CryptoError::decryption_failed(format!(
                "framing error: chunk length {} exceeds maximum allowed size {}",
                frame_len, MAX_CHUNK
            )));
        }

        let mut sealed = vec![0u8; frame_len];
        reader.read_exact(&mut sealed).await.map_err(|e| {
            CryptoError::decryption_failed(format!(
                "framing error: short read against a {}-byte chunk header: {}",
                frame_len, e
            ))
        })?;

        let plaintext = cipher.decrypt(&sealed, key)?;
        total += plaintext.len() as u64;
        writer
            .write_all(&plaintext)
            .await
            .map_err(|e| CryptoError::decryption_failed(format!("stream write failed: {}", e)))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| CryptoError::decryption_failed(format!("stream flush failed: {}", e)))?;
    Ok(total)
}

/// Fills the block buffer from the reader, tolerating partial reads.
/// Returns the number of bytes filled; 0 means clean end of input.
async fn fill_block<R: AsyncRead + Unpin>(
    reader: &mut R,
    buffer: &mut [u8],
) -> Result<usize, CryptoError> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader
            .read(&mut buffer[filled..])
            .await
            .map_err(|e| CryptoError::encryption_failed(format!("stream read failed: {}", e)))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Reads a 4-byte big-endian frame header. `None` signals clean end of
/// input at a frame boundary; a partial header is a framing error.
async fn read_frame_header<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<u32>, CryptoError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader
            .read(&mut header[filled..])
            .await
            .map_err(|e| CryptoError::decryption_failed(format!("stream read failed: {}", e)))?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(CryptoError::decryption_failed(format!(
                "framing error: truncated chunk header ({} of 4 bytes)",
                filled
            )));
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(header)))
}
