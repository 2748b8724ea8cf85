//! Sound chip emulation.
//!
//! # Architecture
//!
//! Every emulated family implements [`SoundChip`]. The player owns its chips
//! as `Box<dyn SoundChip>`, one per instance declared in the VGM header, and
//! forwards register writes to them. Rendering one output frame asks every
//! chip for a stereo sample and sums them.
//!
//! Chips run their internal counters at their own tick rate (derived from
//! the master clock) and average all ticks that fall into one output frame.
//!
//! # Implemented Chips
//!
//! - **SN76489**: 3 tone + 1 noise channels (Sega Master System, Game Gear)
//! - **AY-3-8910**: 3 tone channels, noise and envelope generator (MSX, ZX Spectrum)
pub mod ay8910;
pub mod sn76489;

pub use ay8910::Ay8910;
pub use sn76489::Sn76489;

/// One emulated sound chip instance.
pub trait SoundChip {
    /// Short chip name for diagnostics.
    fn name(&self) -> &'static str;

    /// Reset internal counters and set the output sample rate.
    fn start(&mut self, sample_rate: u32);

    /// Apply a register write.
    ///
    /// Single-port chips such as the SN76489 ignore `register`.
    fn write(&mut self, register: u8, value: u8);

    /// Apply a stereo routing mask (Game Gear PSG). Mono chips ignore it.
    fn set_stereo(&mut self, _mask: u8) {}

    /// Advance by one output sample period and return `(left, right)`.
    fn render(&mut self) -> (i32, i32);
}

/// Fixed-point (16.16) converter from output frames to chip ticks.
#[derive(Debug, Clone, Default)]
pub(crate) struct TickStepper {
    step: u64,
    frac: u64,
}

impl TickStepper {
    pub(crate) fn new(tick_rate: u32, sample_rate: u32) -> Self {
        Self {
            step: ((tick_rate as u64) << 16) / sample_rate.max(1) as u64,
            frac: 0,
        }
    }

    /// Number of chip ticks in the next output frame.
    pub(crate) fn next_frame(&mut self) -> u32 {
        self.frac += self.step;
        let ticks = self.frac >> 16;
        self.frac &= 0xFFFF;
        ticks as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepper_distributes_ticks_evenly() {
        // 223_721 ticks/s into 44_100 frames/s
        let mut stepper = TickStepper::new(3_579_545 / 16, 44100);
        let total: u64 = (0..44100).map(|_| stepper.next_frame() as u64).sum();
        assert!((223_700..=223_722).contains(&total), "total {}", total);
    }

    #[test]
    fn stepper_handles_slow_chips() {
        let mut stepper = TickStepper::new(1000, 44100);
        let ticks: Vec<u32> = (0..100).map(|_| stepper.next_frame()).collect();
        assert!(ticks.iter().all(|&t| t <= 1));
        assert!(ticks.contains(&0));
    }
}
