//! Single-mode archive handle.
//!
//! An [`Archive`] is opened either for reading or for writing and stays in
//! that mode until it is closed. Closing releases the stream, never fails, and
//! may be repeated; dropping the handle closes it.

use crate::archive::directory::Directory;
use crate::archive::format::MemberOptions;
use crate::archive::reader::ArchiveReader;
use crate::archive::stream::ArchiveStream;
use crate::archive::writer::ArchiveWriter;
use crate::error::{ArError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Access mode of an [`Archive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Inner<S: ArchiveStream> {
    Reader(ArchiveReader<S>),
    Writer(ArchiveWriter<BufWriter<S>>),
}

/// Archive handle bound to one mode for its lifetime
pub struct Archive<S: ArchiveStream = File> {
    mode: Mode,
    inner: Option<Inner<S>>,
}

impl Archive<File> {
    /// Open an existing archive for reading, verifying its global magic
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            mode: Mode::Read,
            inner: Some(Inner::Reader(ArchiveReader::open(path)?)),
        })
    }

    /// Create an archive for writing. See [`ArchiveWriter::create`].
    pub fn create<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<Self> {
        Ok(Self {
            mode: Mode::Write,
            inner: Some(Inner::Writer(ArchiveWriter::create(path, overwrite)?)),
        })
    }
}

impl<S: ArchiveStream> Archive<S> {
    /// Read an archive from any stream
    pub fn from_read_stream(stream: S) -> Result<Self> {
        Ok(Self {
            mode: Mode::Read,
            inner: Some(Inner::Reader(ArchiveReader::new(stream)?)),
        })
    }

    /// Write a new archive into any stream. Writes are buffered until close.
    pub fn from_write_stream(stream: S) -> Result<Self> {
        Ok(Self {
            mode: Mode::Write,
            inner: Some(Inner::Writer(ArchiveWriter::new(BufWriter::new(stream))?)),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// The member directory, scanned on first use and cached until close
    pub fn list(&mut self) -> Result<&Directory> {
        self.reader()?.list()
    }

    /// Read a member's payload by name
    pub fn get(&mut self, name: &str) -> Result<Vec<u8>> {
        self.reader()?.get(name)
    }

    /// Extract a member into `dir`. See [`ArchiveReader::extract`].
    pub fn extract<P: AsRef<Path>>(&mut self, name: &str, dir: P) -> Result<PathBuf> {
        self.reader()?.extract(name, dir)
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
        self.writer()?.add(name, data, mode, mtime, uid, gid)?;
        Ok(self)
    }

    /// Append a member with explicit options
    pub fn add_with(
        &mut self,
        name: &str,
        data: &[u8],
        options: &MemberOptions,
    ) -> Result<&mut Self> {
        self.writer()?.add_with(name, data, options)?;
        Ok(self)
    }

    /// Append a local file under its base name
    pub fn add_path<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        self.writer()?.add_path(path)?;
        Ok(self)
    }

    /// Release the stream. Safe to call any number of times.
    pub fn close(&mut self) {
        match self.inner.take() {
            Some(Inner::Writer(writer)) => {
                if let Err(e) = writer.finish() {
                    tracing::warn!("failed to flush archive on close: {}", e);
                }
                tracing::debug!("closed archive opened for writing");
            }
            Some(Inner::Reader(_)) => tracing::debug!("closed archive opened for reading"),
            None => {}
        }
    }

    /// Close the handle and hand back its stream (`None` if already closed)
    pub fn into_inner(mut self) -> Result<Option<S>> {
        match self.inner.take() {
            Some(Inner::Reader(reader)) => Ok(Some(reader.into_inner())),
            Some(Inner::Writer(writer)) => {
                let buffered = writer.finish()?;
                let stream = buffered
                    .into_inner()
                    .map_err(|e| ArError::Io(e.into_error()))?;
                Ok(Some(stream))
            }
            None => Ok(None),
        }
    }

    fn reader(&mut self) -> Result<&mut ArchiveReader<S>> {
        match self.inner.as_mut() {
            Some(Inner::Reader(reader)) => Ok(reader),
            Some(Inner::Writer(_)) => Err(ArError::NotReadable),
            None => Err(ArError::NoOpenHandle),
        }
    }

    fn writer(&mut self) -> Result<&mut ArchiveWriter<BufWriter<S>>> {
        match self.inner.as_mut() {
            Some(Inner::Writer(writer)) => Ok(writer),
            Some(Inner::Reader(_)) => Err(ArError::NotWritable),
            None => Err(ArError::NoOpenHandle),
        }
    }
}

impl<S: ArchiveStream> Drop for Archive<S> {
    fn drop(&mut self) {
        self.close();
    }
}
