//! VGM header fields used for playback.
//!
//! Only the fields that drive rendering are decoded into [`VgmHeader`]. Clock
//! fields of chips without an emulation are exposed through
//! [`VgmHeader::unemulated_chips`] so callers can report them.
//!
//! Notes:
//! - Offsets stored in the header are relative to the field that holds them
//!   (`data_offset` to 0x34, `loop_offset` to 0x1C).
//! - For VGM 1.50+ a header field lying at or beyond the data start reads as
//!   zero. Before 1.50 the command stream always starts at 0x40.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at};

/// Offset where the command stream starts when `data_offset` is absent.
pub const LEGACY_DATA_START: usize = 0x40;

/// Sample rate all VGM wait commands are expressed in.
pub const VGM_SAMPLE_RATE: u32 = 44100;

const DUAL_CHIP_BIT: u32 = 0x4000_0000;
const CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// Clock fields of chips the bundled engine does not emulate, with the
/// version that introduced each field.
const UNEMULATED_CLOCKS: &[(&str, usize, u32)] = &[
    ("YM2413", 0x10, 0x100),
    ("YM2612", 0x2C, 0x110),
    ("YM2151", 0x30, 0x110),
    ("SegaPCM", 0x38, 0x151),
    ("RF5C68", 0x40, 0x151),
    ("YM2203", 0x44, 0x151),
    ("YM2608", 0x48, 0x151),
    ("YM2610", 0x4C, 0x151),
    ("YM3812", 0x50, 0x151),
    ("YM3526", 0x54, 0x151),
    ("Y8950", 0x58, 0x151),
    ("YMF262", 0x5C, 0x151),
    ("YMF278B", 0x60, 0x151),
    ("YMF271", 0x64, 0x151),
    ("YMZ280B", 0x68, 0x151),
    ("RF5C164", 0x6C, 0x151),
    ("PWM", 0x70, 0x151),
    ("GameBoy DMG", 0x80, 0x161),
    ("NES APU", 0x84, 0x161),
    ("MultiPCM", 0x88, 0x161),
    ("uPD7759", 0x8C, 0x161),
    ("OKIM6258", 0x90, 0x161),
    ("OKIM6295", 0x98, 0x161),
    ("K051649", 0x9C, 0x161),
    ("K054539", 0xA0, 0x161),
    ("HuC6280", 0xA4, 0x161),
    ("C140", 0xA8, 0x161),
    ("K053260", 0xAC, 0x161),
    ("Pokey", 0xB0, 0x161),
    ("QSound", 0xB4, 0x161),
    ("SCSP", 0xB8, 0x171),
    ("WonderSwan", 0xC0, 0x171),
    ("VSU", 0xC4, 0x171),
    ("SAA1099", 0xC8, 0x171),
    ("ES5503", 0xCC, 0x171),
    ("ES5506", 0xD0, 0x171),
    ("X1-010", 0xD8, 0x171),
    ("C352", 0xDC, 0x171),
    ("GA20", 0xE0, 0x171),
    ("Mikey", 0xE4, 0x172),
];

/// Master clock of one chip family as declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChipClock(pub u32);

impl ChipClock {
    /// Clock in Hz with the flag bits removed.
    pub fn hz(self) -> u32 {
        self.0 & CLOCK_MASK
    }

    /// Number of chip instances this field declares (0, 1 or 2).
    pub fn instances(self) -> usize {
        match (self.hz(), self.0 & DUAL_CHIP_BIT != 0) {
            (0, _) => 0,
            (_, false) => 1,
            (_, true) => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VgmHeader {
    pub eof_offset: u32,
    pub version: u32,
    pub sn76489_clock: ChipClock,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub rate: u32,
    pub sn_feedback: u16,
    pub sn_shift_width: u8,
    pub sn_flags: u8,
    pub ay8910_clock: ChipClock,
    pub ay8910_type: u8,
    /// Absolute offset of the first command.
    pub data_start: usize,
    /// Absolute offset of the loop point, when the log declares one.
    pub loop_start: Option<usize>,
    unemulated: Vec<&'static str>,
}

impl VgmHeader {
    /// Parse the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < LEGACY_DATA_START {
            return Err(ParseError::HeaderTooShort(bytes.len()));
        }
        let ident = read_slice(bytes, 0x00, 4)?;
        if ident != b"Vgm " {
            let mut id = [0u8; 4];
            id.copy_from_slice(ident);
            return Err(ParseError::InvalidIdent(id));
        }

        let version = read_u32_le_at(bytes, 0x08)?;
        let data_offset = if version >= 0x150 {
            read_u32_le_at(bytes, 0x34)?
        } else {
            0
        };
        let data_start = if data_offset == 0 {
            LEGACY_DATA_START
        } else {
            0x34usize.saturating_add(data_offset as usize)
        };
        if data_start > bytes.len() {
            return Err(ParseError::OffsetOutOfRange {
                offset: data_start,
                needed: 1,
                available: bytes.len(),
                context: Some("data_offset"),
            });
        }

        // Fields overlapping the command stream read as zero.
        let field_end = data_start.min(bytes.len());
        let u32_field = |off: usize, min_version: u32| -> Result<u32, ParseError> {
            if version >= min_version && off + 4 <= field_end {
                read_u32_le_at(bytes, off)
            } else {
                Ok(0)
            }
        };

        let loop_offset = read_u32_le_at(bytes, 0x1C)?;
        let loop_start = (loop_offset != 0)
            .then(|| 0x1Cusize.saturating_add(loop_offset as usize))
            .filter(|&start| start >= data_start && start < bytes.len());

        let (sn_feedback, sn_shift_width, sn_flags) = if version >= 0x110 {
            (
                read_u16_le_at(bytes, 0x28)?,
                read_u8_at(bytes, 0x2A)?,
                if version >= 0x151 { read_u8_at(bytes, 0x2B)? } else { 0 },
            )
        } else {
            (0, 0, 0)
        };

        let ay8910_type = if version >= 0x151 && 0x79 <= field_end {
            read_u8_at(bytes, 0x78)?
        } else {
            0
        };

        let mut unemulated = Vec::new();
        for &(name, off, min_version) in UNEMULATED_CLOCKS {
            if ChipClock(u32_field(off, min_version)?).hz() != 0 {
                unemulated.push(name);
            }
        }

        Ok(VgmHeader {
            eof_offset: read_u32_le_at(bytes, 0x04)?,
            version,
            sn76489_clock: ChipClock(read_u32_le_at(bytes, 0x0C)?),
            gd3_offset: read_u32_le_at(bytes, 0x14)?,
            total_samples: read_u32_le_at(bytes, 0x18)?,
            loop_offset,
            loop_samples: read_u32_le_at(bytes, 0x20)?,
            rate: if version >= 0x101 {
                read_u32_le_at(bytes, 0x24)?
            } else {
                0
            },
            sn_feedback,
            sn_shift_width,
            sn_flags,
            ay8910_clock: ChipClock(u32_field(0x74, 0x151)?),
            ay8910_type,
            data_start,
            loop_start,
            unemulated,
        })
    }

    /// Absolute offset where the command stream ends.
    ///
    /// Uses the EOF offset when it is set and inside the buffer, otherwise the
    /// buffer length.
    pub fn data_end(&self, len: usize) -> usize {
        let eof = 0x04usize.saturating_add(self.eof_offset as usize);
        if self.eof_offset != 0 && eof > self.data_start && eof <= len {
            eof
        } else {
            len
        }
    }

    /// Names of chips declared in the header that have no emulation.
    pub fn unemulated_chips(&self) -> &[&'static str] {
        &self.unemulated
    }
}
