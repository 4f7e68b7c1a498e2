use crate::archive::format::{MemberMeta, GLOBAL_MAGIC_SIZE, HEADER_SIZE};
use crate::archive::stream::ArchiveStream;
use crate::error::{ArError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::SeekFrom;

/// One scanned member: its header plus where its payload starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub meta: MemberMeta,
    /// Absolute offset of the first payload byte
    pub offset: u64,
}

impl DirectoryEntry {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn size(&self) -> u64 {
        self.meta.size
    }

    /// Absolute offset of this member's header (0 for a hand-built entry
    /// whose payload offset leaves no room for one)
    pub fn header_offset(&self) -> u64 {
        self.offset.saturating_sub(HEADER_SIZE as u64)
    }
}

/// Members of an archive in on-disk order.
///
/// Duplicate names are all kept in order; lookups by name resolve to the
/// last member carrying that name. The directory reflects the archive at
/// scan time and is not refreshed if the file changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
    by_name: HashMap<String, usize>,
}

impl Directory {
    /// Walk every member header after the global magic.
    ///
    /// Running out of bytes exactly at a header boundary ends the scan;
    /// running out inside a header, a bad header, or a payload that runs past
    /// the end of the stream fails the whole scan.
    pub fn scan<S: ArchiveStream + ?Sized>(stream: &mut S) -> Result<Self> {
        let stream_len = stream.seek_to(SeekFrom::End(0))?;
        let mut header_offset = stream.seek_to(SeekFrom::Start(GLOBAL_MAGIC_SIZE as u64))?;
        let mut directory = Directory::default();

        loop {
            let bytes = stream.read_bytes(HEADER_SIZE as u64)?;
            if bytes.is_empty() {
                break;
            }

            let header: [u8; HEADER_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                ArError::MalformedHeader(format!(
                    "at offset {}: truncated header ({} of {} bytes)",
                    header_offset,
                    bytes.len(),
                    HEADER_SIZE
                ))
            })?;
            let meta = MemberMeta::decode(&header).map_err(|e| e.at_offset(header_offset))?;

            let offset = header_offset + HEADER_SIZE as u64;
            let data_end = offset.checked_add(meta.size).filter(|end| *end <= stream_len);
            let data_end = data_end.ok_or_else(|| {
                ArError::MalformedHeader(format!(
                    "at offset {}: member {:?} of {} bytes runs past end of archive ({} bytes)",
                    header_offset, meta.name, meta.size, stream_len
                ))
            })?;

            tracing::trace!(
                "scanned member {:?} at {} ({} bytes)",
                meta.name,
                header_offset,
                meta.size
            );

            directory.push(DirectoryEntry { meta, offset });

            // A missing pad after the final member is tolerated
            header_offset = stream.seek_to(SeekFrom::Start(data_end + data_end % 2))?;
        }

        tracing::debug!("scanned {} archive members", directory.len());
        Ok(directory)
    }

    fn push(&mut self, entry: DirectoryEntry) {
        self.by_name
            .insert(entry.meta.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Number of members, duplicates included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All members in on-disk order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectoryEntry> {
        self.entries.iter()
    }

    /// Look up a member by name (last one wins for duplicates)
    pub fn get(&self, name: &str) -> Option<&DirectoryEntry> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Member names in on-disk order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(DirectoryEntry::name)
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a DirectoryEntry;
    type IntoIter = std::slice::Iter<'a, DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::GLOBAL_MAGIC;
    use std::io::Cursor;

    fn member(name: &str, data: &[u8]) -> Vec<u8> {
        let meta = MemberMeta {
            name: name.to_string(),
            mtime: 0,
            uid: 0,
            gid: 0,
            mode: 644,
            size: data.len() as u64,
        };
        let mut bytes = meta.encode().unwrap().to_vec();
        bytes.extend_from_slice(data);
        if data.len() % 2 == 1 {
            bytes.push(b'\n');
        }
        bytes
    }

    fn archive(members: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut bytes = GLOBAL_MAGIC.to_vec();
        for (name, data) in members {
            bytes.extend(member(name, data));
        }
        Cursor::new(bytes)
    }

    #[test]
    fn test_scan_empty_archive() {
        let mut stream = archive(&[]);
        let directory = Directory::scan(&mut stream).unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn test_scan_offsets() {
        let mut stream = archive(&[("abc", b"abc"), ("even", b"even"), ("z", b"z")]);
        let directory = Directory::scan(&mut stream).unwrap();

        let offsets: Vec<u64> = directory.iter().map(|e| e.offset).collect();
        // 8 + 60 = 68; 68 + 3 + 1 + 60 = 132; 132 + 4 + 60 = 196
        assert_eq!(offsets, vec![68, 132, 196]);
        assert_eq!(directory.entries()[1].header_offset(), 72);
        assert_eq!(
            directory.names().collect::<Vec<_>>(),
            vec!["abc", "even", "z"]
        );
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let mut stream = archive(&[("dup", b"first"), ("other", b"x"), ("dup", b"second")]);
        let directory = Directory::scan(&mut stream).unwrap();

        assert_eq!(directory.len(), 3);
        assert_eq!(directory.get("dup").unwrap().size(), 6);
        assert_eq!(directory.entries()[0].size(), 5);
    }

    #[test]
    fn test_missing_final_pad_is_tolerated() {
        let mut stream = archive(&[("odd", b"odd")]);
        let mut bytes = stream.into_inner();
        bytes.pop();
        stream = Cursor::new(bytes);

        let directory = Directory::scan(&mut stream).unwrap();
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_truncated_mid_header() {
        let stream = archive(&[("a", b"ab"), ("b", b"cd")]);
        let mut bytes = stream.into_inner();
        bytes.truncate(bytes.len() - 2 - 30);

        let result = Directory::scan(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ArError::MalformedHeader(_))));
    }

    #[test]
    fn test_payload_past_end() {
        let stream = archive(&[("a", b"abcdef")]);
        let mut bytes = stream.into_inner();
        bytes.truncate(bytes.len() - 3);

        let result = Directory::scan(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(ArError::MalformedHeader(_))));
    }

    #[test]
    fn test_error_mentions_offset() {
        let stream = archive(&[("a", b"ab"), ("b", b"cd")]);
        let mut bytes = stream.into_inner();
        // Second header starts at 8 + 60 + 2 = 70; break its end magic
        bytes[70 + 58] = b'!';

        let err = Directory::scan(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("at offset 70"), "{}", err);
    }

    #[test]
    fn test_foreign_name_bytes_do_not_stop_scan() {
        let stream = archive(&[("cafe", b"1"), ("next", b"22")]);
        let mut bytes = stream.into_inner();
        bytes[8 + 3] = 0xE9;

        let directory = Directory::scan(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(
            directory.names().collect::<Vec<_>>(),
            vec!["caf\u{fffd}", "next"]
        );
        assert_eq!(directory.get("next").unwrap().size(), 2);
    }

    #[test]
    fn test_header_offset_of_hand_built_entry() {
        let entry = DirectoryEntry {
            meta: MemberMeta {
                name: "x".to_string(),
                mtime: 0,
                uid: 0,
                gid: 0,
                mode: 644,
                size: 1,
            },
            offset: 10,
        };
        assert_eq!(entry.header_offset(), 0);
    }
}
