//! Generate seed corpus for fuzzing

use ar_rs::{ArchiveWriter, MemberOptions};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    let seeds: Vec<(&str, Vec<(&str, Vec<u8>)>)> = vec![
        // Empty archive (magic only)
        ("seed_empty.a", vec![]),
        // Single small member
        ("seed_single_small.a", vec![("test.txt", b"Hello, World!".to_vec())]),
        // Multiple members with odd and even sizes
        (
            "seed_multi.a",
            vec![
                ("file1.txt", b"First file".to_vec()),
                ("file2.txt", b"Second".to_vec()),
                ("file3.txt", b"odd".to_vec()),
            ],
        ),
        // Binary data
        ("seed_binary.a", vec![("binary.bin", (0..=255).collect())]),
        // Empty member
        ("seed_zero_length.a", vec![("empty.txt", Vec::new())]),
        // Duplicate names
        (
            "seed_duplicates.a",
            vec![("dup", b"one".to_vec()), ("dup", b"two!".to_vec())],
        ),
        // Debian package layout
        (
            "seed_deb.a",
            vec![
                ("debian-binary", b"2.0\n".to_vec()),
                ("control.tar.gz", vec![0x1f, 0x8b, 0x08]),
                ("data.tar.xz", vec![0xfd, b'7', b'z', b'X', b'Z', 0x00]),
            ],
        ),
    ];

    for (file_name, members) in seeds {
        let path = format!("{}/{}", corpus_dir, file_name);
        let mut writer = ArchiveWriter::create(&path, true)?
            .with_defaults(MemberOptions::deterministic());
        for (name, data) in &members {
            writer.add_file(name, data)?;
        }
        writer.finish()?;
        println!("✓ Generated: {}", path);
    }

    println!("\nSeed corpus generated in: {}", corpus_dir);
    Ok(())
}
