//! Converts text files holding one hexadecimal word per line into raw big-endian binary
//! images, plus the small amount of Intel HEX record handling needed around them:
//! checksums and Extended Linear Address frames.

pub mod common;
pub mod convert;
pub mod hex;
pub mod record;

pub use common::{decode_words, encode_word, WORD_SIZE};
pub use convert::{convert, convert_file, ConvertError, Converter, LineError, OverflowPolicy, Summary};
pub use hex::{hex_string_to_value, value_to_hex_string, InvalidHexString};
pub use record::{
    build_extended_linear_address_frame, calculate_checksum, compute_checksum, verify_checksum,
    FrameError, Record, RecordKind,
};
