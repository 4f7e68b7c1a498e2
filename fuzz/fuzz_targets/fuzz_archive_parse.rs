#![no_main]

use ar_rs::archive::decode_header;
use ar_rs::{Archive, HEADER_SIZE};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Header decoding alone must never panic
    if let Some(header) = data.get(..HEADER_SIZE) {
        if let Ok(header) = <[u8; HEADER_SIZE]>::try_from(header) {
            let _ = decode_header(&header);
        }
    }

    // Try to open archive - should never panic
    let mut archive = match Archive::from_read_stream(Cursor::new(data.to_vec())) {
        Ok(a) => a,
        Err(_) => return, // Expected for invalid data
    };

    // Try to scan - should never panic
    let entries = match archive.list() {
        Ok(directory) => directory.entries().to_vec(),
        Err(_) => return, // Expected for corrupted data
    };

    // Try to read each member - should never panic
    for entry in &entries {
        let _ = archive.get(entry.name());
    }

    // Lookups with odd names - should never panic
    let _ = archive.get("");
    let _ = archive.get("/");
    let _ = archive.get("../../../etc/passwd");

    archive.close();
    archive.close();
});
