mod directory;
mod format;
mod handle;
mod reader;
mod stream;
mod writer;

pub use directory::{Directory, DirectoryEntry};
pub use format::{
    decode_header, encode_header, needs_padding, padded_size, MemberMeta, MemberOptions,
    DEFAULT_MODE, END_MAGIC, GLOBAL_MAGIC, GLOBAL_MAGIC_SIZE, HEADER_SIZE, MAX_NAME_LENGTH,
    PAD_BYTE,
};
pub use handle::{Archive, Mode};
pub use reader::ArchiveReader;
pub use stream::ArchiveStream;
pub use writer::ArchiveWriter;
