use std::fmt;

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::hex::{self, InvalidHexString};

const START_CODE_CHAR: char = ':';
const EXTENDED_LINEAR_ADDRESS_BYTE_COUNT: u8 = 2;
const MAX_DATA_LEN: usize = u8::MAX as usize;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    ExtendedLinearAddress,
}

impl RecordKind {
    pub fn from_int(kind: u8) -> Option<Self> {
        use RecordKind::*;
        match kind {
            0x00 => Some(Data),
            0x04 => Some(ExtendedLinearAddress),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        use RecordKind::*;
        match self {
            Data => 0x00,
            ExtendedLinearAddress => 0x04,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RecordKind::*;
        match self {
            Data => write!(f, "Data"),
            ExtendedLinearAddress => write!(f, "ExtendedLinearAddress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    addr: u16,
    kind: RecordKind,
    data: Vec<u8>,
}

impl Record {
    pub fn data(addr: u16, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() || data.len() > MAX_DATA_LEN {
            return Err(FrameError::InvalidDataLength(data.len()));
        }
        Ok(Record {
            addr,
            kind: RecordKind::Data,
            data,
        })
    }

    pub fn extended_linear_address(upper_addr: u16) -> Self {
        Record {
            addr: 0,
            kind: RecordKind::ExtendedLinearAddress,
            data: upper_addr.to_be_bytes().to_vec(),
        }
    }

    /// Parses a single frame, e.g. `:020000041234B4`. A trailing line ending is ignored.
    pub fn parse(frame: &str) -> Result<Self> {
        let body = strip_line_ending(frame)
            .strip_prefix(START_CODE_CHAR)
            .ok_or(FrameError::MissingStartCode)?;
        FrameParser::new(body.as_bytes()).parse()
    }

    pub fn addr(&self) -> u16 {
        self.addr
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    pub fn upper_addr(&self) -> Option<u16> {
        match (self.kind, self.data.as_slice()) {
            (RecordKind::ExtendedLinearAddress, &[high, low]) => Some(u16::from_be_bytes([high, low])),
            _ => None,
        }
    }

    pub fn to_frame(&self) -> String {
        let mut to_checksum = Vec::with_capacity(4 + self.data.len());
        to_checksum.put_u8(self.data.len() as u8);
        to_checksum.put_u16(self.addr);
        to_checksum.put_u8(self.kind.code());
        to_checksum.put_slice(&self.data);

        let checksum = calculate_checksum(&to_checksum);

        let mut frame = String::with_capacity(2 * to_checksum.len() + 4);
        frame.push(START_CODE_CHAR);
        for &byte in to_checksum.iter().chain(std::iter::once(&checksum)) {
            frame.push_str(&hex::value_to_hex_string(byte as u32));
        }
        frame.push('\n');
        frame
    }
}

/// Builds `:02 0000 04 HH LL CC` followed by a newline.
pub fn build_extended_linear_address_frame(addr_high: u8, addr_low: u8) -> String {
    Record::extended_linear_address(u16::from_be_bytes([addr_high, addr_low])).to_frame()
}

pub fn calculate_checksum(to_checksum: &[u8]) -> u8 {
    let mut calculated: u16 = 0;
    for &value in to_checksum {
        calculated = (calculated + value as u16) & 0xff;
    }
    // Two's complement: flip each bit then add 1.
    calculated = (calculated ^ 0xff) + 1;
    (calculated & 0xff) as u8
}

// The last 2-digit group is the frame's own checksum and is left out of the sum.
pub fn compute_checksum(frame: &str) -> Result<u8> {
    let bytes = frame_bytes(frame)?;
    Ok(calculate_checksum(&bytes[..bytes.len() - 1]))
}

pub fn verify_checksum(frame: &str) -> Result<bool> {
    let bytes = frame_bytes(frame)?;
    let sum = bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
    Ok(sum == 0)
}

fn frame_bytes(frame: &str) -> Result<Vec<u8>> {
    const MIN_GROUPS: usize = 3;
    let body = strip_line_ending(frame)
        .strip_prefix(START_CODE_CHAR)
        .ok_or(FrameError::MissingStartCode)?;
    let bytes = hex::hex_string_to_bytes(body.as_bytes()).map_err(FrameError::InvalidHex)?;
    if bytes.len() < MIN_GROUPS {
        return Err(FrameError::TooShort { groups: bytes.len() });
    }
    Ok(bytes)
}

fn strip_line_ending(frame: &str) -> &str {
    let frame = frame.strip_suffix('\n').unwrap_or(frame);
    frame.strip_suffix('\r').unwrap_or(frame)
}

struct FrameParser<'a> {
    cursor: &'a [u8],
}

impl<'a> FrameParser<'a> {
    fn new(body: &'a [u8]) -> Self {
        FrameParser { cursor: body }
    }

    fn parse(&mut self) -> Result<Record> {
        let mut to_checksum = Vec::new();

        let byte_count = self.parse_byte_count(&mut to_checksum)?;
        let addr = self.parse_address(&mut to_checksum)?;
        let kind_val = self.parse_type(&mut to_checksum)?;
        let kind = RecordKind::from_int(kind_val).ok_or(FrameError::UnsupportedType(kind_val))?;

        match kind {
            RecordKind::ExtendedLinearAddress if byte_count != EXTENDED_LINEAR_ADDRESS_BYTE_COUNT => {
                return Err(FrameError::InvalidByteCount {
                    kind,
                    expected: EXTENDED_LINEAR_ADDRESS_BYTE_COUNT,
                    found: byte_count,
                });
            }
            RecordKind::Data if byte_count == 0 => return Err(FrameError::EmptyDataRecord),
            _ => {}
        }

        let data = self.parse_data(byte_count, &mut to_checksum)?;

        let checksum = self.parse_checksum()?;
        let calculated_checksum = calculate_checksum(&to_checksum);
        if checksum != calculated_checksum {
            return Err(FrameError::ChecksumMismatch {
                expected: calculated_checksum,
                found: checksum,
            });
        }

        if !self.cursor.is_empty() {
            return Err(FrameError::TrailingCharacters(self.cursor.len()));
        }

        Ok(Record { addr, kind, data })
    }

    fn parse_byte_count(&mut self, to_checksum: &mut Vec<u8>) -> Result<u8> {
        let field_bytes = self.parse_field(Field::ByteCount, 2)?;
        to_checksum.extend_from_slice(&field_bytes);
        Ok(field_bytes.as_slice().get_u8())
    }

    fn parse_address(&mut self, to_checksum: &mut Vec<u8>) -> Result<u16> {
        let field_bytes = self.parse_field(Field::Address, 4)?;
        to_checksum.extend_from_slice(&field_bytes);
        Ok(field_bytes.as_slice().get_u16())
    }

    fn parse_type(&mut self, to_checksum: &mut Vec<u8>) -> Result<u8> {
        let field_bytes = self.parse_field(Field::Type, 2)?;
        to_checksum.extend_from_slice(&field_bytes);
        Ok(field_bytes.as_slice().get_u8())
    }

    fn parse_data(&mut self, byte_count: u8, to_checksum: &mut Vec<u8>) -> Result<Vec<u8>> {
        let field_bytes = self.parse_field(Field::Data, byte_count as usize * 2)?;
        to_checksum.extend_from_slice(&field_bytes);
        Ok(field_bytes)
    }

    fn parse_checksum(&mut self) -> Result<u8> {
        let field_bytes = self.parse_field(Field::Checksum, 2)?;
        Ok(field_bytes.as_slice().get_u8())
    }

    fn parse_field(&mut self, field: Field, field_size: usize) -> Result<Vec<u8>> {
        if self.cursor.is_empty() {
            return Err(field_error(field, ParseFieldError::Missing));
        }
        if self.cursor.len() < field_size {
            return Err(field_error(field, ParseFieldError::Incomplete));
        }
        let (hex_string, remaining) = self.cursor.split_at(field_size);
        self.cursor = remaining;
        hex::hex_string_to_bytes(hex_string)
            .map_err(|e| field_error(field, ParseFieldError::InvalidHex(e)))
    }
}

fn field_error(field: Field, kind: ParseFieldError) -> FrameError {
    FrameError::ParseField { field, kind }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ByteCount,
    Address,
    Type,
    Data,
    Checksum,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Field::*;
        match self {
            ByteCount => write!(f, "ByteCount"),
            Address => write!(f, "Address"),
            Type => write!(f, "Type"),
            Data => write!(f, "Data"),
            Checksum => write!(f, "Checksum"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFieldError {
    #[error("field missing")]
    Missing,
    #[error("field incomplete")]
    Incomplete,
    #[error(transparent)]
    InvalidHex(InvalidHexString),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame does not start with ':'")]
    MissingStartCode,
    #[error("frame has {groups} byte groups, at least 3 are needed")]
    TooShort { groups: usize },
    #[error("frame is not valid hex: {0}")]
    InvalidHex(#[source] InvalidHexString),
    #[error("failed to parse {field} field: {kind}")]
    ParseField { field: Field, kind: ParseFieldError },
    #[error("unsupported record type: {0:02X}")]
    UnsupportedType(u8),
    #[error("byte count must be {expected} for {kind} records, found {found}")]
    InvalidByteCount { kind: RecordKind, expected: u8, found: u8 },
    #[error("data record is empty")]
    EmptyDataRecord,
    #[error("data record payload must be 1 to 255 bytes, found {0}")]
    InvalidDataLength(usize),
    #[error("checksum mismatch, expected {expected:02X}, found {found:02X}")]
    ChecksumMismatch { expected: u8, found: u8 },
    #[error("{0} unexpected characters after the checksum")]
    TrailingCharacters(usize),
}

pub type Result<T> = std::result::Result<T, FrameError>;
