use crate::archive::format::{needs_padding, MemberOptions, GLOBAL_MAGIC, HEADER_SIZE, PAD_BYTE};
use crate::error::{ArError, Result};
use crate::local::LocalFile;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Archive writer appending members to a fresh archive.
///
/// Only ever writes forward, so any [`Write`] will do. Files are wrapped in a
/// [`BufWriter`]; call [`finish`](Self::finish) to flush.
pub struct ArchiveWriter<W = BufWriter<File>> {
    stream: W,
    defaults: MemberOptions,
    names: HashSet<String>,
    member_count: usize,
    current_offset: u64,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Create a new archive file.
    ///
    /// Fails with [`ArError::AlreadyExists`] if `path` exists and `overwrite`
    /// is false; otherwise the file is truncated and the global magic written
    /// straight away.
    pub fn create<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let file = options.open(path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ArError::AlreadyExists(path.to_path_buf()),
            _ => ArError::Io(e),
        })?;

        tracing::debug!("created {} (overwrite: {})", path.display(), overwrite);
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> ArchiveWriter<W> {
    /// Start an archive at the stream's current position by writing the global magic
    pub fn new(mut stream: W) -> Result<Self> {
        // Flushed at once so a fresh archive is a valid empty one on disk
        stream.write_all(&GLOBAL_MAGIC)?;
        stream.flush()?;
        Ok(Self {
            stream,
            defaults: MemberOptions::default(),
            names: HashSet::new(),
            member_count: 0,
            current_offset: GLOBAL_MAGIC.len() as u64,
        })
    }

    /// Set the options used by [`add_file`](Self::add_file)
    pub fn with_defaults(mut self, defaults: MemberOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &MemberOptions {
        &self.defaults
    }

    /// Append a member. `mtime` of `None` stamps the current time.
    pub fn add(
        &mut self,
        name: &str,
        data: &[u8],
        mode: u32,
        mtime: Option<u64>,
        uid: u32,
        gid: u32,
    ) -> Result<&mut Self> {
        let options = MemberOptions {
            mode,
            mtime,
            uid,
            gid,
        };
        self.add_with(name, data, &options)
    }

    /// Append a member with the writer's default options
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<&mut Self> {
        let defaults = self.defaults;
        self.add_with(name, data, &defaults)
    }

    /// Append a local file under its base name, with its own metadata
    pub fn add_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let local = LocalFile::read(path)?;
        self.add_with(&local.name, &local.data, &local.options)
    }

    /// Append a member with explicit options.
    ///
    /// If a write fails the member is not counted and the stream should be
    /// discarded, since part of it may already be written.
    pub fn add_with(
        &mut self,
        name: &str,
        data: &[u8],
        options: &MemberOptions,
    ) -> Result<&mut Self> {
        // Encode first so a rejected header leaves the archive untouched
        let meta = options.to_meta(name, data.len() as u64);
        let header = meta.encode()?;

        self.stream.write_all(&header)?;
        self.stream.write_all(data)?;
        if needs_padding(meta.size) {
            self.stream.write_all(&[PAD_BYTE])?;
        }

        if !self.names.insert(name.to_string()) {
            tracing::warn!(
                "duplicate member name {:?}: lookups will resolve to the newer member",
                name
            );
        }

        tracing::trace!(
            "wrote member {:?} at {} ({} bytes)",
            name,
            self.current_offset,
            meta.size
        );

        self.current_offset += HEADER_SIZE as u64 + meta.padded_size();
        self.member_count += 1;
        Ok(self)
    }

    /// Number of members written so far
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// Bytes written so far, global magic included
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Flush the stream to its destination
    pub fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    /// Flush and return the underlying stream
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        tracing::debug!(
            "finished archive with {} members ({} bytes)",
            self.member_count,
            self.current_offset
        );
        Ok(self.stream)
    }
}
