//! vgmrender: render VGM chip-music command logs to WAV
//!
//! `vgmrender` replays a VGM (or gzip-wrapped VGZ) command log against
//! emulated sound chips and writes the result as a 16-bit stereo WAV file.
//!
//! The pipeline has four stages, each usable on its own:
//!
//! - [`gzip`]: detect the gzip envelope by its signature and inflate it to
//!   exactly the size declared in its trailer.
//! - [`player`]: the [`ChipPlayer`] command interface and [`VgmPlayer`], which
//!   resolves the chips a log addresses from its header.
//! - [`render`]: the playback driver. It decodes commands while no delay is
//!   pending and synthesizes one frame per delay tick otherwise, collecting a
//!   [`SampleBuffer`].
//! - [`wav`]: peak-normalizes the samples to 26000 and serializes the RIFF
//!   container.
//!
//! Every failure is an [`Error`] whose [`Error::exit_code`] identifies its
//! class.
//!
//! Example: convert a file
//!
//! ```no_run
//! use std::path::Path;
//! use vgmrender::{RenderOptions, render_file};
//!
//! let options = RenderOptions {
//!     sample_rate: 48000,
//!     ..Default::default()
//! };
//! match render_file(Path::new("song.vgz"), Path::new("song.wav"), &options) {
//!     Ok(summary) => println!("{} frames", summary.frames),
//!     Err(e) => {
//!         eprintln!("{}", e);
//!         std::process::exit(e.exit_code());
//!     }
//! }
//! ```
//!
//! Example: drive the stages by hand
//!
//! ```no_run
//! use vgmrender::{VgmPlayer, gzip, render, wav};
//!
//! # fn main() -> vgmrender::Result<()> {
//! let raw = std::fs::read("song.vgz").unwrap();
//! let log = if gzip::is_gzip(&raw) { gzip::decompress(&raw)? } else { raw };
//! let player = VgmPlayer::new(log)?;
//! let samples = render::render(player, 44100)?;
//! let mut out = Vec::new();
//! wav::write_wav_to(&mut out, 44100, &wav::normalize(samples.as_slice()))?;
//! # Ok(())
//! # }
//! ```
mod binutil;
pub mod chip;
pub mod error;
pub mod gzip;
pub mod pipeline;
pub mod player;
pub mod render;
pub mod vgm;
pub mod wav;

pub use binutil::ParseError;
pub use error::{EXIT_USAGE, Error, Result};
pub use pipeline::{RenderOptions, RenderSummary, render_file};
pub use player::{ChipPlayer, VgmPlayer};
pub use render::{DriverState, PlaybackDriver, SampleBuffer};
