use std::cmp::Ordering;

use crate::stream::{Readable, Writeable};
use crate::Tag;

/// A table record from the font directory.
///
/// Offset and checksum are only known for tables that were read from a
/// font or are about to be written. A header made for a fresh builder
/// carries just the tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Header {
    tag: Tag,
    offset: Option<u32>,
    length: u32,
    checksum: Option<u32>,
}

impl Header {
    /// The size of a table record in bytes.
    pub const SIZE: usize = 16;

    /// A header for a table that has not been laid out yet.
    pub fn new(tag: Tag) -> Self {
        Self { tag, offset: None, length: 0, checksum: None }
    }

    /// A header with a known length but no position.
    pub fn with_length(tag: Tag, length: u32) -> Self {
        Self { tag, offset: None, length, checksum: None }
    }

    /// A fully known table record.
    pub fn from_record(tag: Tag, checksum: u32, offset: u32, length: u32) -> Self {
        Self { tag, offset: Some(offset), length, checksum: Some(checksum) }
    }

    #[allow(missing_docs)]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The offset from the start of the font, if known.
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// The unpadded length of the table.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// The checksum recorded in the directory, if known.
    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    pub(crate) fn set_length(&mut self, length: u32) {
        self.length = length;
    }

    /// Orders headers by their position in the file. Headers without an
    /// offset sort first.
    pub fn cmp_by_offset(&self, other: &Header) -> Ordering {
        self.offset.cmp(&other.offset).then(self.tag.cmp(&other.tag))
    }
}

impl Readable for Header {
    const SIZE: usize = 16;

    fn read(bytes: &[u8]) -> Self {
        Header::from_record(
            Tag::read(&bytes[0..4]),
            u32::read(&bytes[4..8]),
            u32::read(&bytes[8..12]),
            u32::read(&bytes[12..16]),
        )
    }
}

impl Writeable for Header {
    const SIZE: usize = 16;

    fn write(&self, out: &mut [u8]) {
        self.tag.write(&mut out[0..4]);
        self.checksum.unwrap_or(0).write(&mut out[4..8]);
        self.offset.unwrap_or(0).write(&mut out[8..12]);
        self.length.write(&mut out[12..16]);
    }
}
