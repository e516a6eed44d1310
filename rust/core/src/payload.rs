// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload decoding
//!
//! The provider ships depth maps as URL-safe base64 (`-`/`_` alphabet, padding
//! stripped) wrapping a DEFLATE stream. Decoding restores padding, maps the
//! alphabet back to standard base64 and inflates the result.

use crate::error::{Error, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Write;

/// Decode a provider payload string into the raw depth buffer.
///
/// Nothing is returned on failure; a truncated stream is an error, not a
/// short buffer.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>> {
    let compressed = decode_base64url(encoded)?;
    inflate(&compressed)
}

/// Undo the provider's base64 flavour: pad to a multiple of 4 with `=`,
/// then replace `-` with `+` and `_` with `/`.
pub fn decode_base64url(encoded: &str) -> Result<Vec<u8>> {
    let mut normalized = String::with_capacity(encoded.len() + 3);
    normalized.extend(encoded.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }));
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }

    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| Error::decode(format!("invalid base64 payload: {}", e)))
}

/// Inflate a DEFLATE stream.
///
/// Streams carrying a zlib header are accepted as well as raw DEFLATE; the
/// header is detected from the CMF/FLG check bits. The stream must reach its
/// end marker, a truncated stream is rejected.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut decompress = Decompress::new(has_zlib_header(compressed));
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(1024));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }

        let before_in = decompress.total_in();
        let before_out = decompress.total_out();
        let status = decompress
            .decompress_vec(&compressed[before_in as usize..], &mut out, FlushDecompress::None)
            .map_err(|e| Error::decode(format!("corrupt compressed stream: {}", e)))?;

        if status == Status::StreamEnd {
            return Ok(out);
        }

        // No progress with room to spare: the input ended mid-stream
        let stalled = decompress.total_in() == before_in && decompress.total_out() == before_out;
        if stalled && out.len() < out.capacity() {
            return Err(Error::decode(format!(
                "compressed stream truncated after {} bytes",
                decompress.total_in()
            )));
        }
    }
}

#[inline]
fn has_zlib_header(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => {
            cmf & 0x0F == 8 && (cmf >> 4) <= 7 && ((*cmf as u16) << 8 | *flg as u16) % 31 == 0
        }
        _ => false,
    }
}

/// Compress and encode a raw depth buffer the way the provider does.
///
/// Produces raw DEFLATE wrapped in unpadded URL-safe base64, i.e. the exact
/// inverse of [`decode_payload`].
pub fn encode_payload(raw: &[u8]) -> Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .and_then(|_| encoder.finish())
        .map(|compressed| URL_SAFE_NO_PAD.encode(compressed))
        .map_err(|e| Error::decode(format!("compression failed: {}", e)))
}
