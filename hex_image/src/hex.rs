use thiserror::Error;

const DIGITS_PER_BYTE: usize = 2;
const MAX_VALUE_DIGITS: usize = 16;

/// Parses an unsigned base-16 token of any width up to 64 bits.
/// Both upper and lower case digits are accepted; no prefix or whitespace is allowed.
pub fn hex_string_to_value(hex_string: &str) -> Result<u64> {
    if hex_string.is_empty() {
        return Err(InvalidHexString::Empty);
    }

    let mut value: u64 = 0;
    let mut significant_digits = 0;
    for (offset, &digit) in hex_string.as_bytes().iter().enumerate() {
        let nibble = decode_hex_digit(digit).map_err(|_| InvalidHexString::InvalidDigit {
            digit: digit as char,
            offset,
        })?;
        if significant_digits == 0 && nibble == 0 {
            continue;
        }
        significant_digits += 1;
        if significant_digits > MAX_VALUE_DIGITS {
            return Err(InvalidHexString::TooWide);
        }
        value = value << 4 | nibble as u64;
    }
    Ok(value)
}

// Values above 0xFF are rendered in full rather than truncated.
pub fn value_to_hex_string(value: u32) -> String {
    format!("{value:02X}")
}

pub fn hex_string_to_bytes(hex_string: &[u8]) -> Result<Vec<u8>> {
    if hex_string.len() % DIGITS_PER_BYTE != 0 {
        return Err(InvalidHexString::OddLength(hex_string.len()));
    }
    let mut bytes = Vec::with_capacity(hex_string.len() / DIGITS_PER_BYTE);
    for (pair_idx, hex_digit_pair) in hex_string.chunks(DIGITS_PER_BYTE).enumerate() {
        let offset = pair_idx * DIGITS_PER_BYTE;
        let high_nibble = decode_hex_digit(hex_digit_pair[0]).map_err(|d| InvalidHexString::InvalidDigit {
            digit: d.0 as char,
            offset,
        })?;
        let low_nibble = decode_hex_digit(hex_digit_pair[1]).map_err(|d| InvalidHexString::InvalidDigit {
            digit: d.0 as char,
            offset: offset + 1,
        })?;
        bytes.push(high_nibble << 4 | low_nibble);
    }
    Ok(bytes)
}

fn decode_hex_digit(digit: u8) -> std::result::Result<u8, InvalidHexDigit> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(10 + (digit - b'a')),
        b'A'..=b'F' => Ok(10 + (digit - b'A')),
        d => Err(InvalidHexDigit(d)),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct InvalidHexDigit(u8);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidHexString {
    #[error("empty hex string")]
    Empty,
    #[error("invalid hex digit '{digit}' at offset {offset}")]
    InvalidDigit { digit: char, offset: usize },
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),
    #[error("more than 16 significant hex digits")]
    TooWide,
}

pub type Result<T> = std::result::Result<T, InvalidHexString>;
