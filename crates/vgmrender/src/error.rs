//! Failure classes of a render run.
//!
//! Every variant is terminal for the run. `Error::exit_code` gives each class
//! its own process exit code so scripted callers can tell them apart without
//! parsing the message.
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::binutil::ParseError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exit code reserved for command-line syntax errors.
///
/// Argument parsing lives in the binary; the code is defined here so the
/// whole table sits in one place.
pub const EXIT_USAGE: i32 = 1;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error opening file '{}': {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading file contents of '{}': {detail}", path.display())]
    InputRead { path: PathBuf, detail: String },

    #[error("input appears to be a compressed file but has unexpected size of {size}: {reason}")]
    SizeSanity { size: usize, reason: &'static str },

    #[error("error decompressing data from file: {0}")]
    Inflate(String),

    #[error("invalid VGM data: {0}")]
    InvalidLog(#[from] ParseError),

    #[error("no compatible chips found, exiting")]
    NoCompatibleChips,

    #[error("error creating output file '{}': {source}", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error writing {stage} to output file: {source}")]
    OutputWrite {
        stage: &'static str,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InputOpen { .. } => 2,
            Error::InputRead { .. } => 3,
            Error::SizeSanity { .. } => 4,
            Error::NoCompatibleChips => 5,
            Error::OutputOpen { .. } => 6,
            Error::OutputWrite { .. } => 7,
            Error::Inflate(_) => 8,
            Error::InvalidLog(_) => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let errors = [
            Error::InputOpen {
                path: "in.vgm".into(),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
            Error::InputRead {
                path: "in.vgm".into(),
                detail: "short read".into(),
            },
            Error::SizeSanity {
                size: 1,
                reason: "x",
            },
            Error::Inflate("bad".into()),
            Error::InvalidLog(ParseError::HeaderTooShort(0)),
            Error::NoCompatibleChips,
            Error::OutputOpen {
                path: "out.wav".into(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
            Error::OutputWrite {
                stage: "sample data",
                source: io::Error::from(io::ErrorKind::WriteZero),
            },
        ];
        let mut codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
        codes.push(EXIT_USAGE);
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len() + 1);
        assert!(!codes.contains(&0));
    }

    #[test]
    fn write_error_names_stage() {
        let e = Error::OutputWrite {
            stage: "fmt chunk",
            source: io::Error::from(io::ErrorKind::WriteZero),
        };
        assert!(e.to_string().contains("fmt chunk"));
    }
}
