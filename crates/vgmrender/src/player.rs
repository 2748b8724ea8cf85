//! Chip-player engine.
//!
//! [`ChipPlayer`] is the command interface the playback driver consumes.
//! [`VgmPlayer`] implements it for VGM command logs: it resolves the chips a
//! log addresses from its header, executes commands one at a time, and turns
//! VGM waits (44100 Hz samples) into delay ticks at the output rate.
use log::{debug, info, warn};

use crate::binutil::ParseError;
use crate::chip::{Ay8910, Sn76489, SoundChip};
use crate::vgm::{Instance, VGM_SAMPLE_RATE, VgmCommand, VgmHeader, parse_command};

/// Command interface of a chip-player engine.
///
/// Operations are invoked strictly in the order the driver issues them.
/// Each [`ChipPlayer::synthesize_frame`] call advances chip state by one
/// output sample period.
pub trait ChipPlayer {
    /// Number of compatible chip instances recognized at initialization.
    fn chip_count(&self) -> usize;

    /// Prepare playback at `sample_rate` frames per second.
    fn start(&mut self, sample_rate: u32);

    /// False once the log is finished and no delay remains.
    fn is_active(&self) -> bool;

    /// Delay ticks left before the next command may run.
    fn pending_delay(&self) -> u64;

    /// Execute the next command of the log.
    fn execute_next_command(&mut self);

    /// Synthesize one stereo frame from current chip state.
    fn synthesize_frame(&mut self) -> (i32, i32);

    /// Consume one delay tick.
    fn consume_delay_tick(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Sn76489,
    Ay8910,
}

struct ChipSlot {
    family: Family,
    instance: Instance,
    chip: Box<dyn SoundChip>,
}

/// [`ChipPlayer`] for VGM command logs.
pub struct VgmPlayer {
    data: Vec<u8>,
    header: VgmHeader,
    chips: Vec<ChipSlot>,
    pos: usize,
    end: usize,
    sample_rate: u32,
    /// Position in the log, in 44100 Hz samples.
    vgm_samples: u64,
    /// Frames synthesized so far.
    emitted: u64,
    loops_remaining: u32,
    finished: bool,
}

impl VgmPlayer {
    /// Parse the header of `data` and create one chip per declared instance
    /// of every emulated family.
    pub fn new(data: Vec<u8>) -> Result<Self, ParseError> {
        let header = VgmHeader::parse(&data)?;
        debug!(
            "VGM version {:X}.{:02X}, data at 0x{:X}, {} samples",
            header.version >> 8,
            header.version & 0xFF,
            header.data_start,
            header.total_samples
        );

        let mut chips = Vec::new();
        for instance in instances(header.sn76489_clock.instances()) {
            chips.push(ChipSlot {
                family: Family::Sn76489,
                instance,
                chip: Box::new(Sn76489::new(
                    header.sn76489_clock.hz(),
                    header.sn_feedback,
                    header.sn_shift_width,
                )),
            });
        }
        for instance in instances(header.ay8910_clock.instances()) {
            chips.push(ChipSlot {
                family: Family::Ay8910,
                instance,
                chip: Box::new(Ay8910::new(header.ay8910_clock.hz())),
            });
        }
        for name in header.unemulated_chips() {
            warn!("{} is declared in the header but not emulated; its writes are skipped", name);
        }

        Ok(VgmPlayer {
            pos: header.data_start,
            end: header.data_end(data.len()),
            data,
            header,
            chips,
            sample_rate: 0,
            vgm_samples: 0,
            emitted: 0,
            loops_remaining: 0,
            finished: false,
        })
    }

    /// Replay the loop section `count` extra times after the first pass.
    ///
    /// Has no effect on logs without a loop offset.
    pub fn set_loop_count(&mut self, count: u32) {
        self.loops_remaining = count;
    }

    pub fn header(&self) -> &VgmHeader {
        &self.header
    }

    /// Names of the instantiated chips, in creation order.
    pub fn chip_names(&self) -> Vec<&'static str> {
        self.chips.iter().map(|slot| slot.chip.name()).collect()
    }

    fn chip_mut(&mut self, family: Family, instance: Instance) -> Option<&mut Box<dyn SoundChip>> {
        self.chips
            .iter_mut()
            .find(|slot| slot.family == family && slot.instance == instance)
            .map(|slot| &mut slot.chip)
    }

    fn end_of_data(&mut self) {
        match self.header.loop_start {
            Some(start) if self.loops_remaining > 0 => {
                self.loops_remaining -= 1;
                debug!("looping to 0x{:X}, {} loops left", start, self.loops_remaining);
                self.pos = start;
            }
            _ => self.finished = true,
        }
    }

    fn apply(&mut self, cmd: VgmCommand) {
        match cmd {
            VgmCommand::Wait(samples) => self.vgm_samples += samples as u64,
            VgmCommand::EndOfData => self.end_of_data(),
            VgmCommand::Sn76489Write(instance, value) => {
                if let Some(chip) = self.chip_mut(Family::Sn76489, instance) {
                    chip.write(0, value);
                }
            }
            VgmCommand::GameGearStereo(instance, mask) => {
                if let Some(chip) = self.chip_mut(Family::Sn76489, instance) {
                    chip.set_stereo(mask);
                }
            }
            VgmCommand::Ay8910Write {
                instance,
                register,
                value,
            } => {
                if let Some(chip) = self.chip_mut(Family::Ay8910, instance) {
                    chip.write(register, value);
                }
            }
            VgmCommand::DataBlock { data_type, size } => {
                debug!("skipping data block type 0x{:02X} ({} bytes)", data_type, size);
            }
            VgmCommand::Skipped { .. } => {}
        }
    }
}

fn instances(count: usize) -> impl Iterator<Item = Instance> {
    [Instance::Primary, Instance::Secondary].into_iter().take(count)
}

impl ChipPlayer for VgmPlayer {
    fn chip_count(&self) -> usize {
        self.chips.len()
    }

    fn start(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        for slot in &mut self.chips {
            slot.chip.start(sample_rate);
        }
        info!(
            "playing {} at {} Hz",
            self.chip_names().join(", "),
            sample_rate
        );
    }

    fn is_active(&self) -> bool {
        !self.finished || self.pending_delay() > 0
    }

    fn pending_delay(&self) -> u64 {
        let target = self.vgm_samples * self.sample_rate as u64 / VGM_SAMPLE_RATE as u64;
        target.saturating_sub(self.emitted)
    }

    fn execute_next_command(&mut self) {
        if self.finished {
            return;
        }
        if self.pos >= self.end {
            debug!("command stream ended without an end marker");
            self.end_of_data();
            return;
        }
        match parse_command(&self.data[..self.end], self.pos) {
            Ok((cmd, len)) => {
                self.pos += len;
                self.apply(cmd);
            }
            Err(e) => {
                warn!("stopping playback at 0x{:X}: {}", self.pos, e);
                self.finished = true;
            }
        }
    }

    fn synthesize_frame(&mut self) -> (i32, i32) {
        self.chips.iter_mut().fold((0, 0), |(l, r), slot| {
            let (cl, cr) = slot.chip.render();
            (l + cl, r + cr)
        })
    }

    fn consume_delay_tick(&mut self) {
        self.emitted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vgm(sn_clock: u32, ay_clock: u32, commands: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 0x100];
        data[0..4].copy_from_slice(b"Vgm ");
        data[0x08..0x0C].copy_from_slice(&0x171u32.to_le_bytes());
        data[0x0C..0x10].copy_from_slice(&sn_clock.to_le_bytes());
        data[0x34..0x38].copy_from_slice(&0xCCu32.to_le_bytes());
        data[0x74..0x78].copy_from_slice(&ay_clock.to_le_bytes());
        data.extend_from_slice(commands);
        data
    }

    #[test]
    fn resolves_chips_from_header() {
        let p = VgmPlayer::new(vgm(3_579_545, 0, &[0x66])).unwrap();
        assert_eq!(p.chip_names(), vec!["SN76489"]);

        let p = VgmPlayer::new(vgm(3_579_545 | 0x4000_0000, 1_789_772, &[0x66])).unwrap();
        assert_eq!(p.chip_names(), vec!["SN76489", "SN76489", "AY8910"]);

        let p = VgmPlayer::new(vgm(0, 0, &[0x66])).unwrap();
        assert_eq!(p.chip_count(), 0);
    }

    #[test]
    fn waits_convert_to_output_frames() {
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &[0x61, 0x44, 0xAC, 0x66])).unwrap();
        p.start(8000);
        assert_eq!(p.pending_delay(), 0);
        p.execute_next_command();
        assert_eq!(p.pending_delay(), 8000);
        p.consume_delay_tick();
        assert_eq!(p.pending_delay(), 7999);
    }

    #[test]
    fn fractional_waits_accumulate() {
        // 735 samples at 44100 Hz is 1/60 s; at 48000 Hz that is 800 frames
        let commands = [0x62, 0x62, 0x62, 0x66];
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &commands)).unwrap();
        p.start(48000);
        let mut total = 0;
        while p.is_active() {
            if p.pending_delay() == 0 {
                p.execute_next_command();
            } else {
                p.consume_delay_tick();
                total += 1;
            }
        }
        assert_eq!(total, 2400);
    }

    #[test]
    fn end_marker_deactivates() {
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &[0x66])).unwrap();
        p.start(44100);
        assert!(p.is_active());
        p.execute_next_command();
        assert!(!p.is_active());
    }

    #[test]
    fn running_off_the_data_deactivates() {
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &[0x70])).unwrap();
        p.start(44100);
        p.execute_next_command();
        assert_eq!(p.pending_delay(), 1);
        p.consume_delay_tick();
        p.execute_next_command();
        assert!(!p.is_active());
    }

    #[test]
    fn truncated_command_stops_playback() {
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &[0x61, 0x10])).unwrap();
        p.start(44100);
        p.execute_next_command();
        assert!(!p.is_active());
    }

    #[test]
    fn loop_section_replays() {
        let mut data = vgm(3_579_545, 0, &[0x7F, 0x7F, 0x66]);
        // loop to the second wait (absolute 0x101)
        data[0x1C..0x20].copy_from_slice(&(0x101u32 - 0x1C).to_le_bytes());
        let mut p = VgmPlayer::new(data).unwrap();
        p.set_loop_count(2);
        p.start(44100);
        let mut frames = 0;
        while p.is_active() {
            if p.pending_delay() == 0 {
                p.execute_next_command();
            } else {
                p.consume_delay_tick();
                frames += 1;
            }
        }
        assert_eq!(frames, 16 * 4);
    }

    #[test]
    fn writes_reach_the_addressed_chip() {
        // channel 0 period 1 (held high) at full volume on the first SN76489
        let commands = [0x50, 0x81, 0x50, 0x00, 0x50, 0x90, 0x70, 0x66];
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &commands)).unwrap();
        p.start(44100);
        while p.pending_delay() == 0 {
            p.execute_next_command();
        }
        let (l, r) = p.synthesize_frame();
        assert!(l > 0);
        assert_eq!(l, r);
    }

    #[test]
    fn writes_to_missing_instance_are_ignored() {
        let commands = [0x30, 0x90, 0xA0, 0x08, 0x0F, 0x70, 0x66];
        let mut p = VgmPlayer::new(vgm(3_579_545, 0, &commands)).unwrap();
        p.start(44100);
        while p.pending_delay() == 0 {
            p.execute_next_command();
        }
        assert_eq!(p.synthesize_frame(), (0, 0));
    }
}
