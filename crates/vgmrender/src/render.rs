//! Playback driver: paces command execution against sample generation.
//!
//! The driver alternates between two states. While no delay is pending it
//! decodes exactly one command; once the engine reports a pending delay it
//! renders that many frames, consuming one tick per frame, and returns to
//! decoding. The only exit is the engine reporting that it is inactive.
//!
//! There is no frame ceiling: a log whose engine never goes inactive keeps
//! rendering until memory runs out.
use log::debug;

use crate::error::{Error, Result};
use crate::player::ChipPlayer;

/// Interleaved stereo samples in emission order.
///
/// Frames can only be appended as complete `(left, right)` pairs, so the
/// sample count is always even.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i32>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, left: i32, right: i32) {
        self.samples.push(left);
        self.samples.push(right);
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved samples, left first.
    pub fn as_slice(&self) -> &[i32] {
        &self.samples
    }

    pub fn into_inner(self) -> Vec<i32> {
        self.samples
    }
}

impl FromIterator<(i32, i32)> for SampleBuffer {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        let mut buffer = SampleBuffer::new();
        for (left, right) in iter {
            buffer.push_frame(left, right);
        }
        buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No delay pending: execute one command.
    Decode,
    /// Delay pending: synthesize frames until it is consumed.
    Render,
}

/// Owns a started engine and the samples it has produced.
pub struct PlaybackDriver<P: ChipPlayer> {
    player: P,
    samples: SampleBuffer,
    state: DriverState,
}

impl<P: ChipPlayer> PlaybackDriver<P> {
    /// Start `player` at `sample_rate`.
    ///
    /// Fails with [`Error::NoCompatibleChips`] without starting the player
    /// when it recognized no chip.
    pub fn new(mut player: P, sample_rate: u32) -> Result<Self> {
        if player.chip_count() == 0 {
            return Err(Error::NoCompatibleChips);
        }
        player.start(sample_rate);
        Ok(PlaybackDriver {
            player,
            samples: SampleBuffer::new(),
            state: DriverState::Decode,
        })
    }

    /// State entered by the most recent [`step`](Self::step).
    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Run one state of the loop. Returns false once the player is inactive.
    pub fn step(&mut self) -> bool {
        if !self.player.is_active() {
            return false;
        }
        self.state = if self.player.pending_delay() == 0 {
            DriverState::Decode
        } else {
            DriverState::Render
        };
        match self.state {
            DriverState::Decode => self.player.execute_next_command(),
            DriverState::Render => {
                while self.player.pending_delay() > 0 {
                    let (left, right) = self.player.synthesize_frame();
                    self.samples.push_frame(left, right);
                    self.player.consume_delay_tick();
                }
            }
        }
        true
    }

    pub fn finish(self) -> SampleBuffer {
        self.samples
    }
}

/// Render a whole command log through `player`.
pub fn render<P: ChipPlayer>(player: P, sample_rate: u32) -> Result<SampleBuffer> {
    let mut driver = PlaybackDriver::new(player, sample_rate)?;
    while driver.step() {}
    let samples = driver.finish();
    debug!("rendered {} frames", samples.frames());
    Ok(samples)
}
