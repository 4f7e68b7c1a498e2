//! Even-offset alignment tests
//!
//! Every header must start at an even offset, and a pad byte follows a
//! payload exactly when its size is odd.

use ar_rs::{ArchiveReader, ArchiveWriter, MemberOptions, HEADER_SIZE};
use std::fs;
use tempfile::NamedTempFile;

fn build(sizes: &[usize]) -> NamedTempFile {
    let temp_file = NamedTempFile::new().unwrap();
    let mut writer = ArchiveWriter::create(temp_file.path(), true)
        .unwrap()
        .with_defaults(MemberOptions::deterministic());
    for (i, &size) in sizes.iter().enumerate() {
        writer
            .add_file(&format!("m{}", i), &vec![b'a'; size])
            .unwrap();
    }
    writer.finish().unwrap();
    temp_file
}

#[test]
fn test_headers_start_at_even_offsets() {
    let sizes = [0, 1, 2, 3, 7, 8, 99, 100, 1023];
    let temp_file = build(&sizes);
    let bytes = fs::read(temp_file.path()).unwrap();

    let mut reader = ArchiveReader::open(temp_file.path()).unwrap();
    let directory = reader.list().unwrap();
    assert_eq!(directory.len(), sizes.len());

    for (entry, &size) in directory.iter().zip(sizes.iter()) {
        assert_eq!(entry.header_offset() % 2, 0, "{} misaligned", entry.name());
        assert_eq!(entry.size(), size as u64);

        let end = (entry.offset + entry.size()) as usize;
        if size % 2 == 1 {
            assert_eq!(bytes[end], b'\n', "{} missing pad", entry.name());
        }
    }
}

#[test]
fn test_odd_payload_gap() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = ArchiveWriter::create(temp_file.path(), true).unwrap();
        writer.add("abc", b"abc", 644, Some(0), 0, 0).unwrap();
        writer.add("next", b"", 644, Some(0), 0, 0).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = ArchiveReader::open(temp_file.path()).unwrap();
    let entries = reader.list().unwrap().entries().to_vec();
    let gap = entries[1].header_offset() - entries[0].header_offset();
    assert_eq!(gap, (HEADER_SIZE + 3 + 1) as u64);

    let bytes = fs::read(temp_file.path()).unwrap();
    assert_eq!(&bytes[68..72], b"abc\n");
}

#[test]
fn test_file_length_matches_layout() {
    let sizes = [5, 6, 0, 11];
    let temp_file = build(&sizes);

    let expected: u64 = 8 + sizes
        .iter()
        .map(|&s| (HEADER_SIZE + s + s % 2) as u64)
        .sum::<u64>();
    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), expected);
}
