use anyhow::Context;
use clap::Parser;

use hex_image::{
    build_extended_linear_address_frame, compute_checksum, hex_string_to_value, value_to_hex_string,
};

/*
Usage:
  calculate_checksum :020000041234B4
    Prints B4, the checksum the frame should end with.

  calculate_checksum --build-ela 12 34
    Prints :020000041234B4

 */

#[derive(Parser)]
#[command(author, version, about = "Intel HEX checksum helper", long_about = None)]
struct Args {
    /// Complete record frame, checksum group included
    #[arg(required_unless_present = "build_ela")]
    frame: Option<String>,

    /// Build an Extended Linear Address frame from two address bytes given in hex
    #[arg(long, num_args = 2, value_names = ["HIGH", "LOW"], conflicts_with = "frame")]
    build_ela: Option<Vec<String>>,
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(addr_bytes) = args.build_ela {
        let high = parse_byte(&addr_bytes[0])?;
        let low = parse_byte(&addr_bytes[1])?;
        print!("{}", build_extended_linear_address_frame(high, low));
        return Ok(());
    }

    let frame = args.frame.context("no frame given")?;
    let checksum = compute_checksum(&frame).with_context(|| format!("bad frame {frame:?}"))?;
    println!("{}", value_to_hex_string(checksum as u32));
    Ok(())
}

fn parse_byte(digits: &str) -> anyhow::Result<u8> {
    let value = hex_string_to_value(digits).with_context(|| format!("{digits:?} is not hex"))?;
    u8::try_from(value).with_context(|| format!("{digits:?} does not fit in a byte"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_bytes() {
        assert_eq!(parse_byte("0").unwrap(), 0x00);
        assert_eq!(parse_byte("12").unwrap(), 0x12);
        assert_eq!(parse_byte("ff").unwrap(), 0xff);
        assert_eq!(parse_byte("00FF").unwrap(), 0xff);
    }

    #[test]
    fn rejects_what_hex2bin_rejects() {
        assert!(parse_byte("+12").is_err());
        assert!(parse_byte("").is_err());
        assert!(parse_byte("0x12").is_err());
        assert!(parse_byte("1G").is_err());
    }

    #[test]
    fn rejects_values_wider_than_a_byte() {
        assert!(parse_byte("100").is_err());
    }
}
