//! Local filesystem adapter: turns a file on disk into member name, payload
//! and metadata ready to be appended to an archive.

use crate::archive::MemberOptions;
use crate::error::{ArError, Result};
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

/// A local file read into memory with its stat metadata
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// Base name of the file, used as the member name
    pub name: String,
    pub data: Vec<u8>,
    pub options: MemberOptions,
}

impl LocalFile {
    /// Read `path` and its metadata
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArError::NotFound(path.to_path_buf()),
            _ => ArError::Io(e),
        })?;

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ArError::InvalidName(path.display().to_string()))?
            .to_string();

        let data = fs::read(path)?;
        tracing::trace!("read local file {} ({} bytes)", path.display(), data.len());

        Ok(Self {
            name,
            data,
            options: options_from_metadata(&metadata),
        })
    }
}

#[cfg(unix)]
fn options_from_metadata(metadata: &Metadata) -> MemberOptions {
    use std::os::unix::fs::MetadataExt;

    MemberOptions {
        mode: metadata.mode(),
        mtime: Some(u64::try_from(metadata.mtime()).unwrap_or(0)),
        uid: metadata.uid(),
        gid: metadata.gid(),
    }
}

#[cfg(not(unix))]
fn options_from_metadata(metadata: &Metadata) -> MemberOptions {
    use crate::archive::DEFAULT_MODE;
    use std::time::UNIX_EPOCH;

    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    MemberOptions {
        mode: DEFAULT_MODE,
        mtime: Some(mtime),
        uid: 0,
        gid: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"some notes").unwrap();

        let local = LocalFile::read(&path).unwrap();
        assert_eq!(local.name, "notes.txt");
        assert_eq!(local.data, b"some notes");
        assert!(local.options.mtime.unwrap() > 0);

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let metadata = fs::metadata(&path).unwrap();
            assert_eq!(local.options.mode, metadata.mode());
            assert_eq!(local.options.uid, metadata.uid());
        }
    }

    #[test]
    fn test_missing_local_file() {
        let dir = tempdir().unwrap();
        let result = LocalFile::read(dir.path().join("missing"));
        assert!(matches!(result, Err(ArError::NotFound(_))));
    }
}
