use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::BufMut;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::common::encode_word;
use crate::hex::{self, InvalidHexString};

pub fn convert<I, S>(lines: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Converter::default().convert(lines)
}

pub fn convert_file<P, Q>(input: P, output: Q) -> Result<Summary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Converter::default().convert_file(input, output)
}

/// What to do with a value that does not fit in 32 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    #[default]
    Reject,
    /// Opt-in: keep the low 32 bits and log a warning.
    Truncate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub words: usize,
    pub blank_lines: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    overflow: OverflowPolicy,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overflow_policy(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn convert<I, S>(&self, lines: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut image = Vec::new();
        for (line_idx, line) in lines.into_iter().enumerate() {
            if let Some(word) = self.convert_line(line_idx + 1, line.as_ref())? {
                image.put_u32(word);
            }
        }
        Ok(image)
    }

    // Each word is written only once its whole line has converted.
    pub fn convert_reader<R, W>(&self, reader: R, writer: &mut W) -> Result<Summary>
    where
        R: BufRead,
        W: Write,
    {
        let mut summary = Summary::default();
        for (line_idx, line) in reader.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = line.map_err(|source| ConvertError::ReadLine { line_no, source })?;
            match self.convert_line(line_no, &line)? {
                Some(word) => {
                    writer
                        .write_all(&encode_word(word))
                        .map_err(ConvertError::Write)?;
                    summary.words += 1;
                }
                None => summary.blank_lines += 1,
            }
        }
        writer.flush().map_err(ConvertError::Write)?;
        Ok(summary)
    }

    pub fn convert_file<P, Q>(&self, input: P, output: Q) -> Result<Summary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input = input.as_ref();
        let output = output.as_ref();

        let reader = File::open(input)
            .map(BufReader::new)
            .map_err(|source| ConvertError::OpenInput {
                path: input.to_path_buf(),
                source,
            })?;
        let mut writer = File::create(output)
            .map(BufWriter::new)
            .map_err(|source| ConvertError::CreateOutput {
                path: output.to_path_buf(),
                source,
            })?;

        let summary = self.convert_reader(reader, &mut writer)?;
        debug!(
            input = %input.display(),
            output = %output.display(),
            words = summary.words,
            blank_lines = summary.blank_lines,
            "converted file"
        );
        Ok(summary)
    }

    fn convert_line(&self, line_no: usize, line: &str) -> Result<Option<u32>> {
        let token = line.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let value = hex::hex_string_to_value(token).map_err(|error| {
            line_error(
                line_no,
                LineError::Format {
                    token: token.to_string(),
                    error,
                },
            )
        })?;

        let word = match u32::try_from(value) {
            Ok(word) => word,
            Err(_) => match self.overflow {
                OverflowPolicy::Reject => {
                    return Err(line_error(line_no, LineError::OutOfRange { value }))
                }
                OverflowPolicy::Truncate => {
                    warn!(line_no, value, "value truncated to 32 bits");
                    value as u32
                }
            },
        };
        trace!(line_no, word, "converted line");
        Ok(Some(word))
    }
}

fn line_error(line_no: usize, kind: LineError) -> ConvertError {
    ConvertError::Line { line_no, kind }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to open input file {}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create output file {}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line_no}")]
    ReadLine {
        line_no: usize,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output")]
    Write(#[source] io::Error),
    #[error("line {line_no}: {kind}")]
    Line { line_no: usize, kind: LineError },
}

impl ConvertError {
    pub fn line_no(&self) -> Option<usize> {
        match self {
            ConvertError::ReadLine { line_no, .. } | ConvertError::Line { line_no, .. } => {
                Some(*line_no)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("invalid hex value {token:?}: {error}")]
    Format {
        token: String,
        error: InvalidHexString,
    },
    #[error("value {value:#X} does not fit in a 32-bit word")]
    OutOfRange { value: u64 },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
