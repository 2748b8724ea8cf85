//! End-to-end conversion: load, unwrap gzip, play, encode.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::gzip;
use crate::player::VgmPlayer;
use crate::render::{self, SampleBuffer};
use crate::wav;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Extra passes over the loop section.
    pub loops: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            sample_rate: DEFAULT_SAMPLE_RATE,
            loops: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub frames: usize,
    pub peak: i64,
}

/// Read the whole input file, failing if fewer bytes arrive than its size.
pub fn load_input(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|source| Error::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let read_error = |detail: String| Error::InputRead {
        path: path.to_path_buf(),
        detail,
    };

    let size = file
        .metadata()
        .map_err(|e| read_error(e.to_string()))?
        .len();
    let mut buffer = Vec::with_capacity(size as usize);
    file.read_to_end(&mut buffer)
        .map_err(|e| read_error(e.to_string()))?;
    if buffer.len() as u64 != size {
        return Err(read_error(format!(
            "read {} bytes, expected {}",
            buffer.len(),
            size
        )));
    }
    Ok(buffer)
}

/// Turn the raw input into a command log, inflating it when gzip-wrapped.
pub fn unwrap_input(raw: Vec<u8>) -> Result<Vec<u8>> {
    if gzip::is_gzip(&raw) {
        debug!("input is gzip-compressed ({} bytes)", raw.len());
        gzip::decompress(&raw)
    } else {
        Ok(raw)
    }
}

/// Play a command log and collect its samples.
pub fn render_log(log: Vec<u8>, options: &RenderOptions) -> Result<SampleBuffer> {
    let mut player = VgmPlayer::new(log)?;
    player.set_loop_count(options.loops);
    render::render(player, options.sample_rate)
}

/// Convert the VGM/VGZ file at `input` into a WAV file at `output`.
///
/// Nothing is written to `output` unless rendering succeeds.
pub fn render_file(input: &Path, output: &Path, options: &RenderOptions) -> Result<RenderSummary> {
    let raw = load_input(input)?;
    let log = unwrap_input(raw)?;
    let samples = render_log(log, options)?;

    let summary = RenderSummary {
        frames: samples.frames(),
        peak: wav::peak(samples.as_slice()),
    };
    wav::write_wav(output, options.sample_rate, samples)?;
    info!(
        "{} -> {}: {} frames ({:.2} s)",
        input.display(),
        output.display(),
        summary.frames,
        summary.frames as f64 / options.sample_rate.max(1) as f64
    );
    Ok(summary)
}
