use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::debug;
use vgmrender::pipeline::DEFAULT_SAMPLE_RATE;
use vgmrender::wav::MAX_SAMPLE_RATE;
use vgmrender::{EXIT_USAGE, RenderOptions, render_file};

/// Render a VGM/VGZ file to a 16-bit stereo WAV file
#[derive(Parser, Debug)]
#[command(
    name = "vgmrender",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Input file (.vgm or gzip-compressed .vgz)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: PathBuf,

    /// Output sample rate in Hz
    #[arg(
        short = 'r',
        long = "samplerate",
        value_name = "HZ",
        default_value_t = DEFAULT_SAMPLE_RATE,
        value_parser = clap::value_parser!(u32).range(1..=MAX_SAMPLE_RATE as i64)
    )]
    sample_rate: u32,

    /// Extra passes over the loop section, if the file has one
    #[arg(short = 'l', long = "loops", value_name = "N", default_value_t = 0)]
    loops: u32,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();
    debug!("{:?}", cli);

    let options = RenderOptions {
        sample_rate: cli.sample_rate,
        loops: cli.loops,
    };
    if let Err(e) = render_file(&cli.input, &cli.output, &options) {
        eprintln!("{}", e);
        process::exit(e.exit_code());
    }
}
