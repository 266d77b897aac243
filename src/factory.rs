//! The entry point for loading and writing fonts.

use std::io::{Cursor, Read, Write};
use std::rc::Rc;

use crate::data::{MemoryStorage, ReadableFontData, StorageFactory};
use crate::font::{Font, FontBuilder};
use crate::stream::FontInputStream;
use crate::{Error, Result, Tag};

/// The tag at the start of a font collection.
pub const TTC_TAG: Tag = Tag(*b"ttcf");

/// Loads single fonts and collections, and writes fonts in a configured
/// table order.
pub struct FontFactory {
    storage: Rc<dyn StorageFactory>,
    table_ordering: Vec<Tag>,
}

impl FontFactory {
    /// A factory that keeps everything in memory and writes tables in the
    /// recommended order.
    pub fn new() -> Self {
        Self::with_storage(Rc::new(MemoryStorage))
    }

    /// A factory that allocates table data through `storage`.
    pub fn with_storage(storage: Rc<dyn StorageFactory>) -> Self {
        Self { storage, table_ordering: vec![] }
    }

    /// The order in which [`serialize_font`](Self::serialize_font) writes
    /// table data. Tags the font lacks are ignored, tables not listed follow
    /// in tag order. An empty list selects the recommended order.
    pub fn set_serialization_table_ordering(&mut self, ordering: Vec<Tag>) {
        self.table_ordering = ordering;
    }

    #[allow(missing_docs)]
    pub fn serialization_table_ordering(&self) -> &[Tag] {
        &self.table_ordering
    }

    /// Whether `data` starts like a font collection.
    pub fn is_collection(data: &[u8]) -> bool {
        data.get(..4) == Some(&TTC_TAG.0[..])
    }

    /// Read every font from a stream and build it.
    pub fn load_fonts<R: Read>(&self, r: R) -> Result<Vec<Font>> {
        self.load_font_builders(r)?.iter_mut().map(FontBuilder::build).collect()
    }

    /// Read every font from a byte buffer and build it.
    pub fn load_fonts_from_bytes(&self, data: &[u8]) -> Result<Vec<Font>> {
        self.load_font_builders_from_bytes(data)?
            .iter_mut()
            .map(FontBuilder::build)
            .collect()
    }

    /// Read every font from a stream for editing.
    ///
    /// A single font is read table by table. A collection shares tables
    /// between its fonts at arbitrary offsets, so it is read into memory
    /// first.
    pub fn load_font_builders<R: Read>(&self, mut r: R) -> Result<Vec<FontBuilder>> {
        let mut tag = Vec::with_capacity(4);
        (&mut r).take(4).read_to_end(&mut tag)?;
        if tag.len() < 4 {
            log::warn!("font data ends after {} bytes", tag.len());
            return Err(Error::UnknownKind);
        }

        let is_collection = Self::is_collection(&tag);
        let mut chained = Cursor::new(tag).chain(r);
        if is_collection {
            let mut data = vec![];
            chained.read_to_end(&mut data)?;
            return self.load_font_builders_from_bytes(&data);
        }

        let mut is = FontInputStream::new(chained);
        Ok(vec![FontBuilder::load(self.storage.clone(), &mut is)?])
    }

    /// Read every font from a byte buffer for editing. Tables are views
    /// into one shared copy of the buffer.
    pub fn load_font_builders_from_bytes(&self, data: &[u8]) -> Result<Vec<FontBuilder>> {
        if data.len() < 4 {
            return Err(Error::UnknownKind);
        }

        let data: ReadableFontData = self.storage.wrap_bytes(data)?.into();
        if data.read_tag(0)? != TTC_TAG {
            return Ok(vec![FontBuilder::load_from_data(self.storage.clone(), &data, 0)?]);
        }

        let version = data.read_ulong(4)?;
        let num_fonts = data.read_ulong(8)? as usize;
        log::debug!("loading collection version {version:#010x} with {num_fonts} fonts");

        (0..num_fonts)
            .map(|i| {
                let offset = data.read_ulong(12 + 4 * i)? as usize;
                FontBuilder::load_from_data(self.storage.clone(), &data, offset)
            })
            .collect()
    }

    /// An empty font builder that allocates through this factory.
    pub fn new_font_builder(&self) -> FontBuilder {
        FontBuilder::new(self.storage.clone())
    }

    /// Write a font in the configured table order.
    pub fn serialize_font(&self, font: &Font, w: &mut dyn Write) -> Result<()> {
        font.serialize(w, &self.table_ordering)
    }
}

impl Default for FontFactory {
    fn default() -> Self {
        Self::new()
    }
}
