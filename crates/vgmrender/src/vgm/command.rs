//! VGM command decoding.
//!
//! [`parse_command`] decodes one command and reports how many bytes it
//! occupies. Commands for chips without an emulation are not rejected: they
//! decode to [`VgmCommand::Skipped`] with the length the VGM format assigns to
//! their opcode range, so playback keeps its timing.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_at, read_u32_le_at, with_context};

/// Which of the two chips of a family a write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instance {
    Primary = 0x0,
    Secondary = 0x1,
}

impl From<Instance> for usize {
    fn from(instance: Instance) -> usize {
        instance as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VgmCommand {
    /// `0x50 dd` / `0x30 dd`
    Sn76489Write(Instance, u8),
    /// `0x4F dd` / `0x3F dd`
    GameGearStereo(Instance, u8),
    /// `0xA0 aa dd`, bit 7 of `aa` selects the second chip
    Ay8910Write {
        instance: Instance,
        register: u8,
        value: u8,
    },
    /// Wait in 44100 Hz samples (`0x61`, `0x62`, `0x63`, `0x7n`, `0x8n`).
    Wait(u32),
    /// `0x66`
    EndOfData,
    /// `0x67 0x66 tt ssssssss`, payload not retained
    DataBlock { data_type: u8, size: u32 },
    /// Any command without an emulated target.
    Skipped { opcode: u8 },
}

/// Operand byte count of an opcode the decoder does not interpret.
fn operand_len(opcode: u8) -> usize {
    match opcode {
        0x30..=0x3F => 1,
        0x40..=0x5F => 2,
        0x68 => 11,
        0x90 | 0x91 | 0x95 => 4,
        0x92 => 5,
        0x93 => 10,
        0x94 => 1,
        0xA0..=0xBF => 2,
        0xC0..=0xDF => 3,
        0xE0..=0xFF => 4,
        _ => 0,
    }
}

/// Decode the command at `off`.
///
/// Returns the command and the number of bytes consumed, opcode included.
pub fn parse_command(bytes: &[u8], off: usize) -> Result<(VgmCommand, usize), ParseError> {
    let opcode = read_u8_at(bytes, off)?;
    let cur = off + 1;
    let ctx = |e| with_context(e, "command operands");

    let parsed = match opcode {
        0x30 => (
            VgmCommand::Sn76489Write(Instance::Secondary, read_u8_at(bytes, cur).map_err(ctx)?),
            2,
        ),
        0x3F => (
            VgmCommand::GameGearStereo(Instance::Secondary, read_u8_at(bytes, cur).map_err(ctx)?),
            2,
        ),
        0x4F => (
            VgmCommand::GameGearStereo(Instance::Primary, read_u8_at(bytes, cur).map_err(ctx)?),
            2,
        ),
        0x50 => (
            VgmCommand::Sn76489Write(Instance::Primary, read_u8_at(bytes, cur).map_err(ctx)?),
            2,
        ),
        0xA0 => {
            let reg = read_u8_at(bytes, cur).map_err(ctx)?;
            let value = read_u8_at(bytes, cur + 1).map_err(ctx)?;
            let instance = if reg & 0x80 != 0 {
                Instance::Secondary
            } else {
                Instance::Primary
            };
            (
                VgmCommand::Ay8910Write {
                    instance,
                    register: reg & 0x7F,
                    value,
                },
                3,
            )
        }
        0x61 => (
            VgmCommand::Wait(read_u16_le_at(bytes, cur).map_err(ctx)? as u32),
            3,
        ),
        0x62 => (VgmCommand::Wait(735), 1),
        0x63 => (VgmCommand::Wait(882), 1),
        0x66 => (VgmCommand::EndOfData, 1),
        0x67 => {
            // 0x66 compatibility byte, type, 32-bit size
            let data_type = read_u8_at(bytes, cur + 1).map_err(ctx)?;
            let size = read_u32_le_at(bytes, cur + 2).map_err(ctx)? & 0x7FFF_FFFF;
            read_slice(bytes, cur + 6, size as usize)
                .map_err(|e| with_context(e, "data block"))?;
            (VgmCommand::DataBlock { data_type, size }, 7 + size as usize)
        }
        0x70..=0x7F => (VgmCommand::Wait((opcode & 0x0F) as u32 + 1), 1),
        // YM2612 DAC write from the data bank; only the wait part matters here.
        0x80..=0x8F => (VgmCommand::Wait((opcode & 0x0F) as u32), 1),
        other => {
            let len = operand_len(other);
            read_slice(bytes, cur, len).map_err(ctx)?;
            (VgmCommand::Skipped { opcode: other }, 1 + len)
        }
    };
    Ok(parsed)
}
