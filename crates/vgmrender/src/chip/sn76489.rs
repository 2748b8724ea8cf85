//! SN76489 (PSG) emulation.
//!
//! Found in the Sega Master System, Game Gear, Mega Drive and BBC Micro.

use super::{SoundChip, TickStepper};

/// 3 tone channels + 1 noise channel
const CHANNELS: usize = 4;

const NOISE_CHANNEL: usize = 3;

/// Output level per attenuation step (2 dB each, 15 = off).
const VOLUME_TABLE: [i32; 16] = [
    8191, 6506, 5168, 4105, 3261, 2590, 2057, 1634, 1298, 1031, 819, 651, 517, 411, 326, 0,
];

/// Sega VDP PSG noise taps, used when the header leaves them unset.
const DEFAULT_FEEDBACK: u16 = 0x0009;
const DEFAULT_SHIFT_WIDTH: u8 = 16;

/// SN76489 emulator.
///
/// # Register Layout
///
/// SN76489 uses a latch-based register interface:
/// - Latch byte (bit 7 = 1): selects channel and register type
///   - Bits 6-5: Channel (0-2 = tone, 3 = noise)
///   - Bit 4: Type (0 = frequency, 1 = attenuation)
///   - Bits 3-0: low data bits
/// - Data byte (bit 7 = 0): provides the upper 6 frequency bits, or a new
///   attenuation / noise control value for the latched register
///
/// Tone periods are 10-bit. The internal counters run at clock / 16.
#[derive(Debug, Clone)]
pub struct Sn76489 {
    clock_hz: u32,
    feedback: u16,
    shift_width: u8,
    /// Tone periods for channels 0-2; index 3 holds the noise control bits.
    registers: [u16; CHANNELS],
    attenuation: [u8; CHANNELS],
    latched: (usize, bool),
    counters: [u32; CHANNELS],
    outputs: [bool; CHANNELS],
    lfsr: u16,
    /// Game Gear stereo mask: bits 4-7 left, bits 0-3 right.
    stereo: u8,
    stepper: TickStepper,
}

impl Sn76489 {
    /// Create a chip with the header's noise feedback pattern and shift
    /// register width. Zero values select the Sega defaults.
    pub fn new(clock_hz: u32, feedback: u16, shift_width: u8) -> Self {
        let feedback = if feedback == 0 { DEFAULT_FEEDBACK } else { feedback };
        let shift_width = if shift_width == 0 || shift_width > 16 {
            DEFAULT_SHIFT_WIDTH
        } else {
            shift_width
        };
        Self {
            clock_hz,
            feedback,
            shift_width,
            registers: [0; CHANNELS],
            attenuation: [0x0F; CHANNELS],
            latched: (0, false),
            counters: [0; CHANNELS],
            outputs: [true; CHANNELS],
            lfsr: 1 << (shift_width - 1),
            stereo: 0xFF,
            stepper: TickStepper::default(),
        }
    }

    fn reset_noise(&mut self) {
        self.lfsr = 1 << (self.shift_width - 1);
    }

    fn noise_period(&self) -> u32 {
        match self.registers[NOISE_CHANNEL] & 0x03 {
            0 => 0x10,
            1 => 0x20,
            2 => 0x40,
            _ => self.registers[2].max(1) as u32,
        }
    }

    fn shift_noise(&mut self) {
        let white = self.registers[NOISE_CHANNEL] & 0x04 != 0;
        let bit = if white {
            (self.lfsr & self.feedback).count_ones() as u16 & 1
        } else {
            self.lfsr & 1
        };
        self.lfsr = (self.lfsr >> 1) | (bit << (self.shift_width - 1));
    }

    fn tick(&mut self) {
        for ch in 0..NOISE_CHANNEL {
            let period = self.registers[ch] as u32;
            // periods 0 and 1 hold the output high (used for sample playback)
            if period <= 1 {
                self.outputs[ch] = true;
                continue;
            }
            self.counters[ch] = self.counters[ch].saturating_sub(1);
            if self.counters[ch] == 0 {
                self.counters[ch] = period;
                self.outputs[ch] = !self.outputs[ch];
            }
        }

        self.counters[NOISE_CHANNEL] = self.counters[NOISE_CHANNEL].saturating_sub(1);
        if self.counters[NOISE_CHANNEL] == 0 {
            self.counters[NOISE_CHANNEL] = self.noise_period();
            self.outputs[NOISE_CHANNEL] = !self.outputs[NOISE_CHANNEL];
            if self.outputs[NOISE_CHANNEL] {
                self.shift_noise();
            }
        }
    }

    fn level(&self, ch: usize) -> i32 {
        let volume = VOLUME_TABLE[self.attenuation[ch] as usize];
        let high = if ch == NOISE_CHANNEL {
            self.lfsr & 1 != 0
        } else {
            self.outputs[ch]
        };
        if high { volume } else { -volume }
    }

    fn mix(&self) -> (i32, i32) {
        let mut left = 0;
        let mut right = 0;
        for ch in 0..CHANNELS {
            let level = self.level(ch);
            if self.stereo & (0x10 << ch) != 0 {
                left += level;
            }
            if self.stereo & (0x01 << ch) != 0 {
                right += level;
            }
        }
        (left, right)
    }
}

impl SoundChip for Sn76489 {
    fn name(&self) -> &'static str {
        "SN76489"
    }

    fn start(&mut self, sample_rate: u32) {
        self.stepper = TickStepper::new(self.clock_hz / 16, sample_rate);
        self.counters = [1; CHANNELS];
        self.reset_noise();
    }

    fn write(&mut self, _register: u8, value: u8) {
        if value & 0x80 != 0 {
            let ch = ((value >> 5) & 0x03) as usize;
            let is_volume = value & 0x10 != 0;
            self.latched = (ch, is_volume);
            let data = (value & 0x0F) as u16;
            if is_volume {
                self.attenuation[ch] = data as u8;
            } else if ch == NOISE_CHANNEL {
                self.registers[ch] = data & 0x07;
                self.reset_noise();
            } else {
                self.registers[ch] = (self.registers[ch] & 0x3F0) | data;
            }
        } else {
            let (ch, is_volume) = self.latched;
            if is_volume {
                self.attenuation[ch] = value & 0x0F;
            } else if ch == NOISE_CHANNEL {
                self.registers[ch] = (value & 0x07) as u16;
                self.reset_noise();
            } else {
                self.registers[ch] = (self.registers[ch] & 0x00F) | (((value & 0x3F) as u16) << 4);
            }
        }
    }

    fn set_stereo(&mut self, mask: u8) {
        self.stereo = mask;
    }

    fn render(&mut self) -> (i32, i32) {
        let ticks = self.stepper.next_frame();
        if ticks == 0 {
            return self.mix();
        }
        let (mut left, mut right) = (0i64, 0i64);
        for _ in 0..ticks {
            self.tick();
            let (l, r) = self.mix();
            left += l as i64;
            right += r as i64;
        }
        ((left / ticks as i64) as i32, (right / ticks as i64) as i32)
    }
}
