//! Gzip envelope handling for `.vgz` input.
//!
//! Detection looks at the leading signature only. Decompression trusts the
//! size declared in the gzip trailer: the output buffer is allocated once at
//! that size and inflate must fill it exactly.
use std::io::{self, Read};

use flate2::read::GzDecoder;
use log::debug;

use crate::error::{Error, Result};

/// Gzip member signature: ID1, ID2 and CM = deflate.
pub const GZIP_SIGNATURE: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Smallest buffer treated as a gzip member.
pub const GZIP_MIN_LEN: usize = 10;

/// Largest compressed input accepted.
pub const MAX_COMPRESSED_SIZE: usize = 32 * 1024 * 1024;

/// Return true when `data` starts with the gzip signature and is long enough
/// to hold a gzip header.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= GZIP_MIN_LEN && data[..3] == GZIP_SIGNATURE
}

/// Uncompressed size stored in the last four bytes of a gzip member.
pub fn declared_size(data: &[u8]) -> Option<u32> {
    let tail = data.len().checked_sub(4).map(|start| &data[start..])?;
    let mut tmp = [0u8; 4];
    tmp.copy_from_slice(tail);
    Some(u32::from_le_bytes(tmp))
}

/// Decompress a buffer already classified by [`is_gzip`].
///
/// Size checks run before inflate is attempted; a mismatch between the
/// trailer and the actual inflated length is reported as an inflate error.
pub fn decompress(compressed: &[u8]) -> Result<Vec<u8>> {
    let size = compressed.len();
    let declared = declared_size(compressed).ok_or(Error::SizeSanity {
        size,
        reason: "missing gzip trailer",
    })? as usize;

    if size > MAX_COMPRESSED_SIZE {
        return Err(Error::SizeSanity {
            size,
            reason: "larger than the 32 MiB input ceiling",
        });
    }
    if size > declared {
        return Err(Error::SizeSanity {
            size,
            reason: "declared uncompressed size is smaller than the compressed data",
        });
    }

    debug!("inflating {} bytes into {} bytes", size, declared);
    let mut out = vec![0u8; declared];
    inflate(compressed, &mut out).map_err(|e| Error::Inflate(e.to_string()))?;
    Ok(out)
}

/// Raw inflate of one gzip member into `dst`.
///
/// Succeeds only when the member inflates to exactly `dst.len()` bytes and its
/// CRC and length trailer verify.
pub fn inflate(src: &[u8], dst: &mut [u8]) -> io::Result<()> {
    let mut decoder = GzDecoder::new(src);
    decoder.read_exact(dst)?;

    let mut probe = [0u8; 1];
    match decoder.read(&mut probe)? {
        0 => Ok(()),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("stream inflates past the declared {} bytes", dst.len()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn gz(payload: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(payload).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn detects_signature() {
        assert!(is_gzip(&gz(b"Vgm ")));
        assert!(!is_gzip(b"Vgm \x00\x00\x00\x00\x00\x00\x00"));
        // signature alone is not enough
        assert!(!is_gzip(&[0x1f, 0x8b, 0x08, 0, 0]));
        // deflate method byte must be 8
        let mut other = gz(b"abc");
        other[2] = 0x07;
        assert!(!is_gzip(&other));
    }

    #[test]
    fn declared_size_reads_trailer() {
        let data = gz(&[0x55; 1000]);
        assert_eq!(declared_size(&data), Some(1000));
        assert_eq!(declared_size(&[1, 2, 3]), None);
    }

    #[test]
    fn inflates_exact_length() {
        let payload: Vec<u8> = (0..4096u32).map(|v| (v * 7) as u8).collect();
        let out = decompress(&gz(&payload)).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn undersized_trailer_fails_before_inflate() {
        let mut data = gz(&[0x11; 64]);
        let len = data.len();
        data[len - 4..].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(decompress(&data), Err(Error::SizeSanity { .. })));
    }

    #[test]
    fn oversized_trailer_is_inflate_error() {
        let mut data = gz(&[0x11; 64]);
        let len = data.len();
        data[len - 4..].copy_from_slice(&4096u32.to_le_bytes());
        assert!(matches!(decompress(&data), Err(Error::Inflate(_))));
    }

    #[test]
    fn corrupt_payload_is_inflate_error() {
        let payload: Vec<u8> = (0..2048u32).map(|v| (v % 251) as u8).collect();
        let mut data = gz(&payload);
        for b in &mut data[10..20] {
            *b ^= 0xFF;
        }
        assert!(matches!(decompress(&data), Err(Error::Inflate(_))));
    }
}
