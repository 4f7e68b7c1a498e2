use crate::error::{ArError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

/// Global magic: every archive starts with these 8 bytes
pub const GLOBAL_MAGIC: [u8; 8] = *b"!<arch>\n";

/// Size of the global magic in bytes
pub const GLOBAL_MAGIC_SIZE: usize = GLOBAL_MAGIC.len();

/// Terminator of every member header
pub const END_MAGIC: [u8; 2] = *b"`\n";

/// Member header size in bytes
pub const HEADER_SIZE: usize = 60;

/// Filler written after odd-sized payloads
pub const PAD_BYTE: u8 = b'\n';

/// Maximum member name length in bytes
pub const MAX_NAME_LENGTH: usize = 16;

/// Mode used when none is given.
///
/// The mode field is written in decimal, so this is the decimal number 100644,
/// not the octal permission bits it resembles.
pub const DEFAULT_MODE: u32 = 100644;

/// Byte ranges of the header fields
mod field {
    use super::MAX_NAME_LENGTH;
    use std::ops::Range;

    pub const NAME: Range<usize> = 0..MAX_NAME_LENGTH;
    pub const MTIME: Range<usize> = 16..28;
    pub const UID: Range<usize> = 28..34;
    pub const GID: Range<usize> = 34..40;
    pub const MODE: Range<usize> = 40..48;
    pub const SIZE: Range<usize> = 48..58;
    pub const END: Range<usize> = 58..60;
}

/// Decoded member header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMeta {
    pub name: String,
    pub mtime: u64,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub size: u64,
}

impl MemberMeta {
    /// Encode into the fixed 60-byte header.
    ///
    /// Nothing is truncated: a name or number that does not fit its field
    /// is rejected with [`ArError::FieldTooWide`].
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut header = [b' '; HEADER_SIZE];
        put_field(&mut header, field::NAME, "name", self.name.as_bytes())?;
        validate_name(&self.name)?;
        put_field(&mut header, field::MTIME, "mtime", self.mtime.to_string().as_bytes())?;
        put_field(&mut header, field::UID, "uid", self.uid.to_string().as_bytes())?;
        put_field(&mut header, field::GID, "gid", self.gid.to_string().as_bytes())?;
        put_field(&mut header, field::MODE, "mode", self.mode.to_string().as_bytes())?;
        put_field(&mut header, field::SIZE, "size", self.size.to_string().as_bytes())?;
        header[field::END].copy_from_slice(&END_MAGIC);

        Ok(header)
    }

    /// Decode a 60-byte header.
    ///
    /// Name bytes that are not UTF-8 are replaced rather than rejected, so a
    /// foreign encoding never hides the rest of the archive.
    pub fn decode(header: &[u8; HEADER_SIZE]) -> Result<Self> {
        if header[field::END] != END_MAGIC {
            return Err(ArError::MalformedHeader(format!(
                "bad end magic {:?}",
                String::from_utf8_lossy(&header[field::END])
            )));
        }

        let name = String::from_utf8_lossy(&header[field::NAME])
            .trim()
            .to_string();

        Ok(Self {
            name,
            mtime: parse_decimal(&header[field::MTIME], "mtime")?,
            uid: parse_decimal_u32(&header[field::UID], "uid")?,
            gid: parse_decimal_u32(&header[field::GID], "gid")?,
            mode: parse_decimal_u32(&header[field::MODE], "mode")?,
            size: parse_decimal(&header[field::SIZE], "size")?,
        })
    }

    /// Write the encoded header to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let header = self.encode()?;
        writer.write_all(&header)?;
        Ok(())
    }

    /// Read and decode a header from a reader
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        Self::decode(&header)
    }

    /// Payload length plus the pad byte, if any
    pub fn padded_size(&self) -> u64 {
        padded_size(self.size)
    }
}

/// Encode a member header. See [`MemberMeta::encode`].
pub fn encode_header(meta: &MemberMeta) -> Result<[u8; HEADER_SIZE]> {
    meta.encode()
}

/// Decode a member header. See [`MemberMeta::decode`].
pub fn decode_header(header: &[u8; HEADER_SIZE]) -> Result<MemberMeta> {
    MemberMeta::decode(header)
}

/// Whether a payload of `size` bytes is followed by a pad byte
pub fn needs_padding(size: u64) -> bool {
    size % 2 == 1
}

/// Bytes a payload of `size` occupies on disk, pad included
pub fn padded_size(size: u64) -> u64 {
    size + (size % 2)
}

/// Per-member attributes supplied when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberOptions {
    /// Mode, written in decimal
    pub mode: u32,
    /// Modification time in seconds since the epoch; `None` means now
    pub mtime: Option<u64>,
    pub uid: u32,
    pub gid: u32,
}

impl MemberOptions {
    /// Options with a fixed zero timestamp and owner, for reproducible archives
    pub fn deterministic() -> Self {
        Self {
            mode: DEFAULT_MODE,
            mtime: Some(0),
            uid: 0,
            gid: 0,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = Some(mtime);
        self
    }

    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.uid = uid;
        self.gid = gid;
        self
    }

    /// Build the header for a payload of `size` bytes named `name`
    pub fn to_meta(&self, name: &str, size: u64) -> MemberMeta {
        MemberMeta {
            name: name.to_string(),
            mtime: self.mtime.unwrap_or_else(now),
            uid: self.uid,
            gid: self.gid,
            mode: self.mode,
            size,
        }
    }
}

impl Default for MemberOptions {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE,
            mtime: None,
            uid: 0,
            gid: 0,
        }
    }
}

/// Current time in seconds since the epoch (0 if the clock is before it)
fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Names must survive the whitespace trim applied when parsing.
/// The empty name is stored as 16 spaces and reads back empty.
fn validate_name(name: &str) -> Result<()> {
    if name.trim() != name
        || !name.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
    {
        return Err(ArError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn put_field(
    header: &mut [u8; HEADER_SIZE],
    range: Range<usize>,
    name: &'static str,
    value: &[u8],
) -> Result<()> {
    let width = range.len();
    if value.len() > width {
        return Err(ArError::FieldTooWide {
            field: name,
            len: value.len(),
            width,
        });
    }
    header[range.start..range.start + value.len()].copy_from_slice(value);
    Ok(())
}

// Surrounding spaces are allowed; anything else must be decimal digits.
fn parse_decimal(bytes: &[u8], name: &str) -> Result<u64> {
    let digits = bytes.trim_ascii();
    let malformed = || {
        ArError::MalformedHeader(format!(
            "{} field {:?} is not a decimal number",
            name,
            String::from_utf8_lossy(bytes)
        ))
    };

    if digits.is_empty() {
        return Err(malformed());
    }

    let mut value: u64 = 0;
    for &c in digits {
        if !c.is_ascii_digit() {
            return Err(malformed());
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(c - b'0')))
            .ok_or_else(malformed)?;
    }
    Ok(value)
}

fn parse_decimal_u32(bytes: &[u8], name: &str) -> Result<u32> {
    let value = parse_decimal(bytes, name)?;
    u32::try_from(value)
        .map_err(|_| ArError::MalformedHeader(format!("{} field {} out of range", name, value)))
}
