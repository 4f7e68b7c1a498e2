//! ar-rs: reader and writer for Unix `ar` archives
//!
//! The classic `ar` container holds an ordered list of members, each a
//! fixed 60-byte ASCII header followed by its payload, padded to an even
//! offset. It is the format of static libraries (`.a`) and Debian packages
//! (`.deb`). This crate provides:
//! - Header encoding and decoding with strict field widths
//! - A lazily scanned, cached member directory
//! - Random-access member reads and extraction
//! - An append-only writer
//! - A single-mode [`Archive`] handle over files or in-memory streams
//!
//! Long-name tables, symbol tables and BSD name extensions are not
//! interpreted; such members show up under their raw header names.
//!
//! # Example
//!
//! ```no_run
//! use ar_rs::Archive;
//!
//! // Create an archive
//! let mut archive = Archive::create("example.a", false)?;
//! archive.add("hello.txt", b"hi", 644, None, 0, 0)?;
//! archive.close();
//!
//! // Read from archive
//! let mut archive = Archive::open("example.a")?;
//! for entry in archive.list()? {
//!     println!("{} ({} bytes)", entry.name(), entry.size());
//! }
//! let data = archive.get("hello.txt")?;
//! # Ok::<(), ar_rs::error::ArError>(())
//! ```

// Core modules
pub mod archive;
pub mod error;
pub mod local;

// Re-export commonly used types
pub use archive::{
    Archive, ArchiveReader, ArchiveStream, ArchiveWriter, Directory, DirectoryEntry, MemberMeta,
    MemberOptions, Mode, DEFAULT_MODE, END_MAGIC, GLOBAL_MAGIC, HEADER_SIZE, MAX_NAME_LENGTH,
};
pub use error::{ArError, Result};
pub use local::LocalFile;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure core types are accessible
        let _mode = Mode::Read;
        let _options = MemberOptions::default();
        assert_eq!(HEADER_SIZE, 60);
        assert_eq!(&GLOBAL_MAGIC, b"!<arch>\n");
    }
}
