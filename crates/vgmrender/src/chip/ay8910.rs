//! AY-3-8910 (PSG) emulation.

use super::{SoundChip, TickStepper};

const CHANNELS: usize = 3;

/// Output level per 4-bit amplitude (about 3 dB steps, 0 = off).
const VOLUME_TABLE: [i32; 16] = [
    0, 64, 90, 128, 181, 256, 362, 512, 724, 1024, 1448, 2048, 2896, 4095, 5792, 8191,
];

/// AY-3-8910 emulator.
///
/// # Register Layout
///
/// - 0x00-0x05: tone period, 12 bits per channel (fine, coarse)
/// - 0x06: noise period (5 bits)
/// - 0x07: mixer, bits 0-2 disable tone, bits 3-5 disable noise
/// - 0x08-0x0A: amplitude (4 bits), bit 4 selects the envelope
/// - 0x0B-0x0C: envelope period (16 bits)
/// - 0x0D: envelope shape, writing restarts the envelope
///
/// The internal counters run at clock / 8. Output is mono on both sides.
#[derive(Debug, Clone)]
pub struct Ay8910 {
    clock_hz: u32,
    registers: [u8; 16],
    tone_counters: [u32; CHANNELS],
    tone_outputs: [bool; CHANNELS],
    noise_counter: u32,
    lfsr: u32,
    envelope_counter: u32,
    envelope: Envelope,
    stepper: TickStepper,
}

#[derive(Debug, Clone, Default)]
struct Envelope {
    step: i8,
    attack: u8,
    hold: bool,
    alternate: bool,
    holding: bool,
}

impl Envelope {
    fn restart(&mut self, shape: u8) {
        self.attack = if shape & 0x04 != 0 { 0x0F } else { 0x00 };
        if shape & 0x08 == 0 {
            // non-continuing shapes run once then hold at zero
            self.hold = true;
            self.alternate = self.attack != 0;
        } else {
            self.hold = shape & 0x01 != 0;
            self.alternate = shape & 0x02 != 0;
        }
        self.step = 0x0F;
        self.holding = false;
    }

    fn advance(&mut self) {
        if self.holding {
            return;
        }
        self.step -= 1;
        if self.step < 0 {
            if self.hold {
                if self.alternate {
                    self.attack ^= 0x0F;
                }
                self.holding = true;
                self.step = 0;
            } else {
                if self.alternate {
                    self.attack ^= 0x0F;
                }
                self.step &= 0x0F;
            }
        }
    }

    fn volume(&self) -> usize {
        (self.step as u8 ^ self.attack) as usize & 0x0F
    }
}

impl Ay8910 {
    pub fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            registers: [0; 16],
            tone_counters: [0; CHANNELS],
            tone_outputs: [false; CHANNELS],
            noise_counter: 0,
            lfsr: 1,
            envelope_counter: 0,
            envelope: Envelope {
                holding: true,
                ..Envelope::default()
            },
            stepper: TickStepper::default(),
        }
    }

    fn tone_period(&self, ch: usize) -> u32 {
        let fine = self.registers[ch * 2] as u32;
        let coarse = (self.registers[ch * 2 + 1] & 0x0F) as u32;
        ((coarse << 8) | fine).max(1)
    }

    fn noise_period(&self) -> u32 {
        ((self.registers[0x06] & 0x1F) as u32).max(1)
    }

    fn envelope_period(&self) -> u32 {
        (self.registers[0x0B] as u32 | (self.registers[0x0C] as u32) << 8).max(1)
    }

    fn tick(&mut self) {
        for ch in 0..CHANNELS {
            self.tone_counters[ch] += 1;
            if self.tone_counters[ch] >= self.tone_period(ch) {
                self.tone_counters[ch] = 0;
                self.tone_outputs[ch] = !self.tone_outputs[ch];
            }
        }

        // the noise generator runs at half the tone rate
        self.noise_counter += 1;
        if self.noise_counter >= self.noise_period() * 2 {
            self.noise_counter = 0;
            let bit = (self.lfsr ^ (self.lfsr >> 3)) & 1;
            self.lfsr = (self.lfsr >> 1) | (bit << 16);
        }

        // 16 envelope steps per 256 * period master clocks
        self.envelope_counter += 1;
        if self.envelope_counter >= self.envelope_period() * 2 {
            self.envelope_counter = 0;
            self.envelope.advance();
        }
    }

    fn mix(&self) -> i32 {
        let mixer = self.registers[0x07];
        let noise = self.lfsr & 1 != 0;
        let mut out = 0;
        for ch in 0..CHANNELS {
            let tone_on = self.tone_outputs[ch] || mixer & (0x01 << ch) != 0;
            let noise_on = noise || mixer & (0x08 << ch) != 0;
            if !(tone_on && noise_on) {
                continue;
            }
            let amplitude = self.registers[0x08 + ch];
            let level = if amplitude & 0x10 != 0 {
                self.envelope.volume()
            } else {
                (amplitude & 0x0F) as usize
            };
            out += VOLUME_TABLE[level];
        }
        out
    }
}

impl SoundChip for Ay8910 {
    fn name(&self) -> &'static str {
        "AY8910"
    }

    fn start(&mut self, sample_rate: u32) {
        self.stepper = TickStepper::new(self.clock_hz / 8, sample_rate);
        self.tone_counters = [0; CHANNELS];
        self.noise_counter = 0;
        self.envelope_counter = 0;
        self.lfsr = 1;
    }

    fn write(&mut self, register: u8, value: u8) {
        let reg = (register & 0x0F) as usize;
        self.registers[reg] = value;
        if reg == 0x0D {
            self.envelope.restart(value & 0x0F);
            self.envelope_counter = 0;
        }
    }

    fn render(&mut self) -> (i32, i32) {
        let ticks = self.stepper.next_frame();
        let out = if ticks == 0 {
            self.mix()
        } else {
            let mut sum = 0i64;
            for _ in 0..ticks {
                self.tick();
                sum += self.mix() as i64;
            }
            (sum / ticks as i64) as i32
        };
        (out, out)
    }
}
