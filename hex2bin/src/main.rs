use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hex_image::{Converter, OverflowPolicy};

/*
Usage:
  hex2bin words.hex words.bin

  NOTE: Both arguments are required. Each input line holds one hex word; the output
  receives each word as 4 big-endian bytes.

 */

const USAGE: &str = "usage: hex2bin <input_file_name> <output_file_name>";

#[derive(Parser)]
#[command(author, version, about = "Convert hex word lines into a big-endian binary image", long_about = None)]
struct Args {
    /// Text file with one hex value per line
    input: PathBuf,

    /// Binary file to create or overwrite
    output: PathBuf,

    /// Keep the low 32 bits of wider values instead of failing
    #[arg(long)]
    truncate: bool,

    /// Log conversion details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            println!("{USAGE}");
            process::exit(1);
        }
    };

    init_logging(args.verbose);

    if let Err(e) = try_main(args) {
        eprintln!("ERROR: {e:#}");
        process::exit(1);
    }
}

fn try_main(args: Args) -> anyhow::Result<()> {
    let overflow = if args.truncate {
        OverflowPolicy::Truncate
    } else {
        OverflowPolicy::Reject
    };

    let summary = Converter::new()
        .overflow_policy(overflow)
        .convert_file(&args.input, &args.output)
        .with_context(|| format!("converting {}", args.input.display()))?;

    info!(words = summary.words, blank_lines = summary.blank_lines, "done");
    println!("Success");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
