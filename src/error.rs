use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ar archive operations
pub type Result<T> = std::result::Result<T, ArError>;

/// Unified error type for all archive operations
#[derive(Debug, Error)]
pub enum ArError {
    // Opening and creating
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not an ar archive: {0}")]
    NotAnArchive(String),

    #[error("Path already exists and overwrite not allowed: {}", .0.display())]
    AlreadyExists(PathBuf),

    // Directory and members
    #[error("Malformed member header: {0}")]
    MalformedHeader(String),

    #[error("Member not found in archive: {0}")]
    MemberNotFound(String),

    #[error("Unsafe member name for extraction: {0:?}")]
    UnsafeMemberName(String),

    // Header encoding
    #[error("Field `{field}` too wide: {len} bytes (max {width})")]
    FieldTooWide {
        field: &'static str,
        len: usize,
        width: usize,
    },

    #[error("Invalid member name: {0:?}")]
    InvalidName(String),

    // Handle state
    #[error("Archive is not open for writing")]
    NotWritable,

    #[error("Archive is not open for reading")]
    NotReadable,

    #[error("Archive handle is closed")]
    NoOpenHandle,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArError {
    /// Prefix a header error with the archive offset it was found at
    pub(crate) fn at_offset(self, offset: u64) -> Self {
        match self {
            ArError::MalformedHeader(reason) => {
                ArError::MalformedHeader(format!("at offset {}: {}", offset, reason))
            }
            other => other,
        }
    }
}
