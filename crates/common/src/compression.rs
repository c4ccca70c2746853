//! Gzip codec for report payloads
//!
//! Report downloads arrive gzip-compressed and are fetched with transport
//! decompression disabled, so decoding happens here exactly once. Bodies that
//! are not gzip (no magic header) pass through untouched; some storage
//! backends already serve the plain JSON.

use std::io::{Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

/// First two bytes of every gzip member (RFC 1952).
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors raised while encoding or decoding gzip payloads.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Gzip framing present but the stream is corrupt or truncated.
    #[error("gzip decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// The encoder could not write its output.
    #[error("gzip compression failed: {0}")]
    Compress(#[source] std::io::Error),
}

/// Returns true when `data` starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= GZIP_MAGIC.len() && data[..2] == GZIP_MAGIC
}

/// Decompress a gzip body, or return the bytes unchanged if they are not
/// gzip-framed.
///
/// # Errors
/// Returns [`CompressionError::Decompress`] when the body carries the gzip
/// magic but the stream is truncated or corrupt.
pub fn gunzip_if_compressed(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if !is_gzip(data) {
        return Ok(data.to_vec());
    }

    let mut decoder = MultiGzDecoder::new(data);
    let mut decompressed = Vec::with_capacity(data.len().saturating_mul(4));
    decoder.read_to_end(&mut decompressed).map_err(CompressionError::Decompress)?;
    Ok(decompressed)
}

/// Gzip-compress `data` at the default level.
///
/// # Errors
/// Returns [`CompressionError::Compress`] if the encoder fails to flush.
pub fn gzip(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(CompressionError::Compress)?;
    encoder.finish().map_err(CompressionError::Compress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_gzip_payload() {
        let body = br#"[{"impressions":10}]"#;
        let compressed = gzip(body).unwrap();

        assert!(is_gzip(&compressed));
        assert_eq!(gunzip_if_compressed(&compressed).unwrap(), body);
    }

    #[test]
    fn plain_body_passes_through() {
        let body = br#"[]"#;
        assert_eq!(gunzip_if_compressed(body).unwrap(), body);
    }

    #[test]
    fn truncated_gzip_is_an_error() {
        let compressed = gzip(br#"[{"clicks":1},{"clicks":2}]"#).unwrap();
        let truncated = &compressed[..compressed.len() / 2];

        assert!(matches!(
            gunzip_if_compressed(truncated),
            Err(CompressionError::Decompress(_))
        ));
    }
}
