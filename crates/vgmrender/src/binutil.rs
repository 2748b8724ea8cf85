//! Byte readers shared by the VGM header and command decoders.
use std::fmt;

/// Error returned while decoding a VGM command log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The header is shorter than the fixed part every VGM version carries.
    HeaderTooShort(usize),

    /// The file does not start with the `"Vgm "` identifier.
    ///
    /// The contained array is the raw 4 bytes that were read.
    InvalidIdent([u8; 4]),

    /// A read reached past the end of the buffer.
    ///
    /// - `offset` is the index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the current buffer length.
    /// - `context` names the field or command being decoded, when known.
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<&'static str>,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::HeaderTooShort(len) => {
                write!(f, "header too short: {} bytes (need at least 0x40)", len)
            }
            ParseError::InvalidIdent(id) => write!(f, "invalid ident: {:02X?}", id),
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "offset out of range at {}: 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "offset out of range: 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
        }
    }
}

impl std::error::Error for ParseError {}

fn out_of_range(bytes: &[u8], off: usize, needed: usize) -> ParseError {
    ParseError::OffsetOutOfRange {
        offset: off,
        needed,
        available: bytes.len(),
        context: None,
    }
}

/// Borrow `len` bytes starting at `off`.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    off.checked_add(len)
        .and_then(|end| bytes.get(off..end))
        .ok_or_else(|| out_of_range(bytes, off, len))
}

/// Read a little-endian `u32` at `off`.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    let mut tmp = [0u8; 4];
    tmp.copy_from_slice(read_slice(bytes, off, 4)?);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a little-endian `u16` at `off`.
pub fn read_u16_le_at(bytes: &[u8], off: usize) -> Result<u16, ParseError> {
    let mut tmp = [0u8; 2];
    tmp.copy_from_slice(read_slice(bytes, off, 2)?);
    Ok(u16::from_le_bytes(tmp))
}

/// Read a single byte at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    bytes.get(off).copied().ok_or_else(|| out_of_range(bytes, off, 1))
}

/// Attach a context label to an out-of-range error.
pub(crate) fn with_context(err: ParseError, ctx: &'static str) -> ParseError {
    match err {
        ParseError::OffsetOutOfRange {
            offset,
            needed,
            available,
            ..
        } => ParseError::OffsetOutOfRange {
            offset,
            needed,
            available,
            context: Some(ctx),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_values() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0xAA];
        assert_eq!(read_u32_le_at(&bytes, 0).unwrap(), 0x1234_5678);
        assert_eq!(read_u16_le_at(&bytes, 2).unwrap(), 0x1234);
        assert_eq!(read_u8_at(&bytes, 4).unwrap(), 0xAA);
    }

    #[test]
    fn short_reads_report_offset() {
        let bytes = [0u8; 3];
        match read_u32_le_at(&bytes, 0) {
            Err(ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                ..
            }) => {
                assert_eq!((offset, needed, available), (0, 4, 3));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(read_slice(&bytes, usize::MAX, 2).is_err());
    }
}
