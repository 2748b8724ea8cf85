use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn vgmrender(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vgmrender"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run vgmrender")
}

fn vgm_file(dir: &TempDir, name: &str, sn_clock: u32, commands: &[u8]) -> PathBuf {
    let mut data = vec![0u8; 0x100];
    data[0..4].copy_from_slice(b"Vgm ");
    data[0x08..0x0C].copy_from_slice(&0x171u32.to_le_bytes());
    data[0x0C..0x10].copy_from_slice(&sn_clock.to_le_bytes());
    data[0x34..0x38].copy_from_slice(&0xCCu32.to_le_bytes());
    data.extend_from_slice(commands);
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn missing_output_is_usage_error() {
    let out = vgmrender(&["song.vgm"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
}

#[test]
fn unknown_flag_is_usage_error() {
    let out = vgmrender(&["song.vgm", "-o", "out.wav", "--bogus"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn sample_rate_outside_wav_range_is_usage_error() {
    let out = vgmrender(&["song.vgm", "-o", "out.wav", "-r", "1073741824"]);
    assert_eq!(out.status.code(), Some(1));
    let out = vgmrender(&["song.vgm", "-o", "out.wav", "-r", "0"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_exits_cleanly() {
    let out = vgmrender(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn renders_with_requested_rate() {
    let dir = TempDir::new().unwrap();
    let input = vgm_file(&dir, "silence.vgm", 3_579_545, &[0x61, 0x44, 0xAC, 0x66]);
    let output = dir.path().join("silence.wav");

    let out = vgmrender(&[arg(&input), "-o", arg(&output), "-r", "8000"]);
    assert_eq!(out.status.code(), Some(0));
    // silence is reported, not fatal
    assert!(String::from_utf8_lossy(&out.stderr).contains("silence"));

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(bytes.len(), 44 + 8000 * 4);
    assert_eq!(&bytes[24..28], &8000u32.to_le_bytes());
    assert_eq!(&bytes[28..32], &32000u32.to_le_bytes());
}

#[test]
fn no_compatible_chips_exit_code() {
    let dir = TempDir::new().unwrap();
    let input = vgm_file(&dir, "empty.vgm", 0, &[0x62, 0x66]);
    let output = dir.path().join("empty.wav");

    let out = vgmrender(&[arg(&input), "--output", arg(&output)]);
    assert_eq!(out.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no compatible chips"));
    assert!(!output.exists());
}

#[test]
fn missing_input_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.wav");
    let out = vgmrender(&[arg(&dir.path().join("nope.vgm")), "-o", arg(&output)]);
    assert_eq!(out.status.code(), Some(2));
}
