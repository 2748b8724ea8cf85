//! VGM header and command decoding used by the bundled player.
pub mod command;
pub mod header;

pub use command::{Instance, VgmCommand, parse_command};
pub use header::{ChipClock, VGM_SAMPLE_RATE, VgmHeader};
