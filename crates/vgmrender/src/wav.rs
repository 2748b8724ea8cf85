//! PCM encoder: peak normalization and RIFF/WAVE serialization.
//!
//! The output is always 16-bit stereo PCM. All header integers are written
//! little-endian regardless of the host.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::render::SampleBuffer;

/// Amplitude the loudest sample is scaled to.
pub const TARGET_PEAK: i64 = 26000;

pub const CHANNELS: u16 = 2;
pub const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// Highest sample rate whose byte rate still fits the 32-bit `fmt` field.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / BLOCK_ALIGN as u32;

/// Size of the RIFF, fmt and data headers in front of the samples.
pub const HEADER_LEN: usize = 44;

/// Largest absolute sample value, 0 for silence or no samples.
pub fn peak(samples: &[i32]) -> i64 {
    samples
        .iter()
        .map(|&s| (s as i64).abs())
        .max()
        .unwrap_or(0)
}

/// Scale `samples` so the peak maps to [`TARGET_PEAK`] and narrow to 16 bits.
///
/// Uses truncating integer division. Pure silence is logged as a warning and
/// encodes as all zeros.
pub fn normalize(samples: &[i32]) -> Vec<i16> {
    let mut max_scale = peak(samples);
    if max_scale == 0 {
        warn!("the WAV file data will only contain silence");
        max_scale = 1;
    }
    samples
        .iter()
        .map(|&s| (s as i64 * TARGET_PEAK / max_scale) as i16)
        .collect()
}

/// Write one header or data stage and push it through any buffering, so a
/// failure is attributed to the stage that produced the bytes.
fn write_stage<W: Write>(out: &mut W, stage: &'static str, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|source| Error::OutputWrite { stage, source })
}

/// Serialize a WAV container holding `pcm` (interleaved stereo) to `out`.
pub fn write_wav_to<W: Write>(out: &mut W, sample_rate: u32, pcm: &[i16]) -> Result<()> {
    let data_len = pcm
        .len()
        .checked_mul(2)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| Error::OutputWrite {
            stage: "riff header",
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "sample data exceeds the 4 GiB RIFF limit",
            ),
        })?;
    let byte_rate = sample_rate
        .checked_mul(BLOCK_ALIGN as u32)
        .ok_or_else(|| Error::OutputWrite {
            stage: "fmt chunk",
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("byte rate of {} Hz overflows the fmt chunk", sample_rate),
            ),
        })?;

    let mut riff = Vec::with_capacity(12);
    riff.extend_from_slice(b"RIFF");
    riff.extend_from_slice(&(data_len + 36).to_le_bytes());
    riff.extend_from_slice(b"WAVE");
    write_stage(out, "riff header", &riff)?;

    let mut fmt = Vec::with_capacity(24);
    fmt.extend_from_slice(b"fmt ");
    fmt.extend_from_slice(&16u32.to_le_bytes());
    fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
    fmt.extend_from_slice(&CHANNELS.to_le_bytes());
    fmt.extend_from_slice(&sample_rate.to_le_bytes());
    fmt.extend_from_slice(&byte_rate.to_le_bytes());
    fmt.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    fmt.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    write_stage(out, "fmt chunk", &fmt)?;

    let mut data = Vec::with_capacity(8);
    data.extend_from_slice(b"data");
    data.extend_from_slice(&data_len.to_le_bytes());
    write_stage(out, "data header", &data)?;

    let body: Vec<u8> = pcm.iter().flat_map(|s| s.to_le_bytes()).collect();
    write_stage(out, "sample data", &body)
}

/// Normalize `samples` and write them as a WAV file at `path`.
///
/// The file is only created once the samples are ready, so a failure before
/// this point leaves no output behind.
pub fn write_wav(path: &Path, sample_rate: u32, samples: SampleBuffer) -> Result<()> {
    let pcm = normalize(samples.as_slice());
    drop(samples);

    let file = File::create(path).map_err(|source| Error::OutputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    write_wav_to(&mut out, sample_rate, &pcm)?;
    debug!(
        "wrote {} ({} bytes)",
        path.display(),
        HEADER_LEN + pcm.len() * 2
    );
    Ok(())
}
