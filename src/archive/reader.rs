use crate::archive::directory::{Directory, DirectoryEntry};
use crate::archive::format::{GLOBAL_MAGIC, GLOBAL_MAGIC_SIZE};
use crate::archive::stream::ArchiveStream;
use crate::error::{ArError, Result};
use std::fs::{self, File};
use std::io::{self, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

/// Archive reader with lazy directory scan and lookup by name
pub struct ArchiveReader<S = File> {
    stream: S,
    directory: Option<Directory>,
}

impl ArchiveReader<File> {
    /// Open an archive file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArError::NotFound(path.to_path_buf()),
            _ => ArError::Io(e),
        })?;

        tracing::debug!("opened {} for reading", path.display());
        Self::new(file).map_err(|e| match e {
            ArError::NotAnArchive(_) => ArError::NotAnArchive(path.display().to_string()),
            other => other,
        })
    }
}

impl<S: ArchiveStream> ArchiveReader<S> {
    /// Wrap a stream, checking the global magic at its start.
    ///
    /// The directory is not scanned until it is first needed.
    pub fn new(mut stream: S) -> Result<Self> {
        stream.seek_to(SeekFrom::Start(0))?;
        let magic = stream.read_bytes(GLOBAL_MAGIC_SIZE as u64)?;
        if magic != GLOBAL_MAGIC {
            return Err(ArError::NotAnArchive(format!(
                "bad global magic {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }

        Ok(Self {
            stream,
            directory: None,
        })
    }

    /// The member directory, scanning the archive on first use
    pub fn list(&mut self) -> Result<&Directory> {
        let directory = match self.directory.take() {
            Some(directory) => directory,
            None => Directory::scan(&mut self.stream)?,
        };
        let directory: &Directory = self.directory.insert(directory);
        Ok(directory)
    }

    /// The cached directory, if a scan already happened
    pub fn directory(&self) -> Option<&Directory> {
        self.directory.as_ref()
    }

    /// Drop the cached directory and scan again
    pub fn rescan(&mut self) -> Result<&Directory> {
        self.directory = None;
        self.list()
    }

    /// Number of members in the archive
    pub fn entry_count(&mut self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    /// Check if a member exists in the archive
    pub fn contains(&mut self, name: &str) -> Result<bool> {
        Ok(self.list()?.contains(name))
    }

    /// Get a member's directory entry without reading its payload
    pub fn get_entry(&mut self, name: &str) -> Result<&DirectoryEntry> {
        self.list()?
            .get(name)
            .ok_or_else(|| ArError::MemberNotFound(name.to_string()))
    }

    /// Read a member's payload by name
    pub fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        let (offset, size) = self.locate(name)?;
        self.read_at(offset, size)
    }

    /// Read the payload of a specific entry, e.g. one shadowed by a later
    /// member with the same name
    pub fn read_entry(&mut self, entry: &DirectoryEntry) -> Result<Vec<u8>> {
        self.read_at(entry.offset, entry.size())
    }

    /// Stream a member's payload into `writer` without buffering it
    pub fn copy_to<W: Write>(&mut self, name: &str, mut writer: W) -> Result<u64> {
        let (offset, size) = self.locate(name)?;
        self.stream.seek_to(SeekFrom::Start(offset))?;
        let copied = self.stream.copy_bytes(size, &mut writer)?;
        if copied != size {
            return Err(short_read(name, copied, size));
        }
        Ok(copied)
    }

    /// Write a member's payload to `dir/<name>`, returning the path written.
    ///
    /// Names that could escape `dir` are refused.
    pub fn extract<P: AsRef<Path>>(&mut self, name: &str, dir: P) -> Result<PathBuf> {
        let dest = dir.as_ref().join(safe_member_path(name)?);
        let file = File::create(&dest)?;
        let mut writer = io::BufWriter::new(file);
        let written = self.copy_to(name, &mut writer)?;
        writer.flush()?;

        tracing::debug!("extracted {:?} to {} ({} bytes)", name, dest.display(), written);
        Ok(dest)
    }

    /// Extract every member into `dir` in archive order, returning the paths written.
    ///
    /// A later member overwrites an earlier one with the same name.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let entries = self.list()?.entries().to_vec();
        let mut written = Vec::with_capacity(entries.len());
        for entry in &entries {
            let dest = dir.join(safe_member_path(entry.name())?);
            let data = self.read_entry(entry)?;
            fs::write(&dest, data)?;
            written.push(dest);
        }
        Ok(written)
    }

    /// Consume the reader and return the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn locate(&mut self, name: &str) -> Result<(u64, u64)> {
        let entry = self.get_entry(name)?;
        Ok((entry.offset, entry.size()))
    }

    fn read_at(&mut self, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.stream.seek_to(SeekFrom::Start(offset))?;
        let data = self.stream.read_bytes(size)?;
        if data.len() as u64 != size {
            return Err(short_read("member", data.len() as u64, size));
        }
        Ok(data)
    }
}

fn short_read(name: &str, got: u64, expected: u64) -> ArError {
    ArError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("{}: read {} of {} bytes", name, got, expected),
    ))
}

/// Map a member name to a single relative path component
fn safe_member_path(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let mut components = path.components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !single_normal || name.contains(['/', '\\', ':']) {
        return Err(ArError::UnsafeMemberName(name.to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::MemberMeta;
    use std::io::Cursor;

    fn sample() -> Cursor<Vec<u8>> {
        let mut bytes = GLOBAL_MAGIC.to_vec();
        for (name, data) in [("one", &b"1"[..]), ("two", &b"22"[..])] {
            let meta = MemberMeta {
                name: name.to_string(),
                mtime: 0,
                uid: 0,
                gid: 0,
                mode: 644,
                size: data.len() as u64,
            };
            bytes.extend_from_slice(&meta.encode().unwrap());
            bytes.extend_from_slice(data);
            if data.len() % 2 == 1 {
                bytes.push(b'\n');
            }
        }
        Cursor::new(bytes)
    }

    #[test]
    fn test_lazy_scan() {
        let mut reader = ArchiveReader::new(sample()).unwrap();
        assert!(reader.directory().is_none());

        assert_eq!(reader.get("two").unwrap(), b"22");
        assert!(reader.directory().is_some());
        assert_eq!(reader.get("one").unwrap(), b"1");
        assert_eq!(reader.entry_count().unwrap(), 2);
    }

    #[test]
    fn test_bad_magic() {
        let result = ArchiveReader::new(Cursor::new(b"!<thin>\nrest".to_vec()));
        assert!(matches!(result, Err(ArError::NotAnArchive(_))));

        let result = ArchiveReader::new(Cursor::new(b"!<ar".to_vec()));
        assert!(matches!(result, Err(ArError::NotAnArchive(_))));
    }

    #[test]
    fn test_member_not_found() {
        let mut reader = ArchiveReader::new(sample()).unwrap();
        match reader.get("three") {
            Err(ArError::MemberNotFound(name)) => assert_eq!(name, "three"),
            other => panic!("Expected MemberNotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_copy_to() {
        let mut reader = ArchiveReader::new(sample()).unwrap();
        let mut out = Vec::new();
        assert_eq!(reader.copy_to("two", &mut out).unwrap(), 2);
        assert_eq!(out, b"22");
    }

    #[test]
    fn test_safe_member_path() {
        assert!(safe_member_path("libfoo.o").is_ok());
        assert!(safe_member_path("debian-binary").is_ok());

        for name in ["..", ".", "../evil", "a/b", "/etc/passwd", "C:evil", "a\\b", "gnu.o/"] {
            assert!(
                matches!(safe_member_path(name), Err(ArError::UnsafeMemberName(_))),
                "{:?} should be refused",
                name
            );
        }
    }
}
