use hex_image::*;

use std::fs;
use std::path::PathBuf;
use std::process;

fn test_file_path(name: &str) -> PathBuf {
    let output = process::Command::new(env!("CARGO"))
        .arg("locate-project")
        .arg("--workspace")
        .arg("--message-format=plain")
        .output()
        .unwrap()
        .stdout;
    let cargo_toml_path = String::from_utf8(output).unwrap();

    let mut path = PathBuf::from(cargo_toml_path.trim());
    path.pop();
    path.push("test_files");
    path.push(name);
    path
}

#[test]
fn convert_words_file() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("words.bin");
    let summary = convert_file(test_file_path("words.txt"), &output).expect("convert failed");
    assert_eq!(summary.words, 3);
    let image = fs::read(&output).expect("read failed");
    assert_eq!(image, vec![0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x01, 0x00]);
    assert_eq!(decode_words(&image), Some(vec![0x1, 0xff, 0x100]));
}

#[test]
fn convert_empty_file() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("empty.bin");
    let summary = convert_file(test_file_path("empty.txt"), &output).expect("convert failed");
    assert_eq!(summary, Summary::default());
    assert!(output.exists());
    assert!(fs::read(&output).expect("read failed").is_empty());
}

#[test]
fn convert_truncates_existing_output() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("stale.bin");
    fs::write(&output, vec![0xAA; 64]).expect("write failed");
    convert_file(test_file_path("words.txt"), &output).expect("convert failed");
    assert_eq!(fs::read(&output).expect("read failed").len(), 3 * WORD_SIZE);
}

#[test]
fn convert_crlf_file_with_blank_lines() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("crlf.bin");
    let summary =
        convert_file(test_file_path("crlf_blank_lines.txt"), &output).expect("convert failed");
    assert_eq!(summary, Summary { words: 3, blank_lines: 1 });
    let image = fs::read(&output).expect("read failed");
    assert_eq!(decode_words(&image), Some(vec![0x1, 0xff, 0xdead_beef]));
}

#[test]
fn convert_stops_at_invalid_digit() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("invalid.bin");
    let result = convert_file(test_file_path("invalid_digit.txt"), &output);
    assert!(matches!(
        result,
        Err(ConvertError::Line {
            line_no: 2,
            kind: LineError::Format { .. }
        })
    ));
    // Only the line before the bad one was committed.
    assert_eq!(fs::read(&output).expect("read failed"), vec![0, 0, 0, 1]);
}

#[test]
fn convert_wide_value() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("wide.bin");

    let result = convert_file(test_file_path("wide_value.txt"), &output);
    assert!(matches!(
        result,
        Err(ConvertError::Line {
            line_no: 2,
            kind: LineError::OutOfRange { value: 0x1_0000_0000 }
        })
    ));

    Converter::new()
        .overflow_policy(OverflowPolicy::Truncate)
        .convert_file(test_file_path("wide_value.txt"), &output)
        .expect("convert failed");
    assert_eq!(fs::read(&output).expect("read failed"), vec![0, 0, 0, 1, 0, 0, 0, 0]);
}

#[test]
fn convert_to_unwritable_output() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let output = dir.path().join("missing_dir").join("out.bin");
    let result = convert_file(test_file_path("words.txt"), &output);
    assert!(matches!(result, Err(ConvertError::CreateOutput { .. })));
}

#[test]
fn ela_frame_file_matches_builder() {
    let frame = fs::read_to_string(test_file_path("ela_frame.hex")).expect("read failed");
    assert_eq!(build_extended_linear_address_frame(0x12, 0x34), frame);
    assert_eq!(compute_checksum(&frame), Ok(0xB4));
    assert_eq!(verify_checksum(&frame), Ok(true));

    let record = Record::parse(&frame).expect("parse failed");
    assert_eq!(record.upper_addr(), Some(0x1234));
    assert_eq!(record.to_frame(), frame);
}
