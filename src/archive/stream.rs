//! Byte-stream capability the archive core is written against.
//!
//! Anything that is `Read + Write + Seek` qualifies, so the same code runs
//! over a [`std::fs::File`] and over an in-memory `Cursor<Vec<u8>>`.

use std::io::{self, Read, Seek, SeekFrom, Write};

pub trait ArchiveStream: Read + Write + Seek {
    /// Read up to `len` bytes. Fewer are returned only at end of stream.
    fn read_bytes(&mut self, len: u64) -> io::Result<Vec<u8>>;

    /// Copy up to `len` bytes into `dest`, returning how many were copied
    fn copy_bytes(&mut self, len: u64, dest: &mut dyn Write) -> io::Result<u64>;

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Current cursor position from the start of the stream
    fn offset(&mut self) -> io::Result<u64>;

    fn flush_bytes(&mut self) -> io::Result<()>;
}

impl<T: Read + Write + Seek> ArchiveStream for T {
    fn read_bytes(&mut self, len: u64) -> io::Result<Vec<u8>> {
        // Grow as data arrives; a corrupt size field must not trigger a huge allocation
        let mut buf = Vec::new();
        Read::take(&mut *self, len).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn copy_bytes(&mut self, len: u64, dest: &mut dyn Write) -> io::Result<u64> {
        io::copy(&mut Read::take(&mut *self, len), dest)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn seek_to(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek(pos)
    }

    fn offset(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn flush_bytes(&mut self) -> io::Result<()> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cursor_is_a_stream() {
        let mut stream = Cursor::new(Vec::new());
        stream.write_bytes(b"hello world").unwrap();
        assert_eq!(ArchiveStream::offset(&mut stream).unwrap(), 11);

        stream.seek_to(SeekFrom::Start(6)).unwrap();
        assert_eq!(stream.read_bytes(5).unwrap(), b"world");
    }

    #[test]
    fn test_short_read_at_end() {
        let mut stream = Cursor::new(b"abc".to_vec());
        assert_eq!(stream.read_bytes(10).unwrap(), b"abc");
        assert!(stream.read_bytes(10).unwrap().is_empty());
    }

    #[test]
    fn test_copy_bytes() {
        let mut stream = Cursor::new(b"0123456789".to_vec());
        stream.seek_to(SeekFrom::Start(2)).unwrap();

        let mut out = Vec::new();
        let copied = stream.copy_bytes(4, &mut out).unwrap();
        assert_eq!(copied, 4);
        assert_eq!(out, b"2345");
    }
}
