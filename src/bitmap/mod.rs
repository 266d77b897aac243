//! Embedded bitmaps. `EBLC` says where each glyph bitmap is, `EBDT` holds
//! the bitmaps. Apple's `bloc` and `bdat` share the layout.
//!
//! Both tables are read only. Their builders copy the bytes through.

mod index;

pub use self::index::{BitmapGlyphInfo, IndexSubTable};

use crate::data::ReadableFontData;
use crate::table::{impl_font_data_table, BuilderCore, Header, TableModel};
use crate::{Error, Result};

const EBLC_HEADER_SIZE: usize = 8;
const BITMAP_SIZE_RECORD_SIZE: usize = 48;
const INDEX_SUBTABLE_ARRAY_ENTRY_SIZE: usize = 8;

/// The strike record for one pixel size.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitmapSize {
    /// Offset of the index subtable array from the start of `EBLC`.
    pub index_subtable_array_offset: u32,
    #[allow(missing_docs)]
    pub index_tables_size: u32,
    #[allow(missing_docs)]
    pub number_of_index_subtables: u32,
    #[allow(missing_docs)]
    pub color_ref: u32,
    #[allow(missing_docs)]
    pub start_glyph_index: u16,
    #[allow(missing_docs)]
    pub end_glyph_index: u16,
    #[allow(missing_docs)]
    pub ppem_x: u8,
    #[allow(missing_docs)]
    pub ppem_y: u8,
    #[allow(missing_docs)]
    pub bit_depth: u8,
    #[allow(missing_docs)]
    pub flags: i8,
}

/// The embedded bitmap location table.
#[derive(Debug)]
pub struct EblcTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(EblcTable);

impl EblcTable {
    #[allow(missing_docs)]
    pub fn version(&self) -> Result<u32> {
        self.data.read_ulong(0)
    }

    /// The number of strikes.
    pub fn num_sizes(&self) -> Result<usize> {
        Ok(self.data.read_ulong(4)? as usize)
    }

    /// The strike record at `index`.
    pub fn bitmap_size(&self, index: usize) -> Result<BitmapSize> {
        if index >= self.num_sizes()? {
            return Err(Error::OutOfBounds);
        }

        let d = &self.data;
        let offset = EBLC_HEADER_SIZE + index * BITMAP_SIZE_RECORD_SIZE;
        Ok(BitmapSize {
            index_subtable_array_offset: d.read_ulong(offset)?,
            index_tables_size: d.read_ulong(offset + 4)?,
            number_of_index_subtables: d.read_ulong(offset + 8)?,
            color_ref: d.read_ulong(offset + 12)?,
            // The two line metrics take 24 bytes.
            start_glyph_index: d.read_ushort(offset + 40)?,
            end_glyph_index: d.read_ushort(offset + 42)?,
            ppem_x: d.read_ubyte(offset + 44)?,
            ppem_y: d.read_ubyte(offset + 45)?,
            bit_depth: d.read_ubyte(offset + 46)?,
            flags: d.read_byte(offset + 47)?,
        })
    }

    /// The index subtables of a strike. Subtables of unknown formats are
    /// skipped.
    pub fn index_subtables(&self, size_index: usize) -> Result<Vec<IndexSubTable>> {
        let size = self.bitmap_size(size_index)?;
        let array = size.index_subtable_array_offset as usize;

        let mut subtables = vec![];
        for i in 0..size.number_of_index_subtables as usize {
            let entry = array + i * INDEX_SUBTABLE_ARRAY_ENTRY_SIZE;
            let first = self.data.read_ushort(entry)?;
            let last = self.data.read_ushort(entry + 2)?;
            let additional = self.data.read_ulong(entry + 4)? as usize;
            let data = self
                .data
                .slice_from(array + additional)
                .ok_or(Error::OutOfBounds)?;

            match IndexSubTable::parse(first, last, data) {
                Ok(subtable) => subtables.push(subtable),
                Err(Error::UnsupportedFormat { format, .. }) => {
                    log::warn!("skipping EBLC index subtable with format {format}");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(subtables)
    }

    /// The location of `glyph` in the strike at `size_index`.
    pub fn glyph_location(&self, size_index: usize, glyph: u16) -> Result<Option<BitmapGlyphInfo>> {
        let size = self.bitmap_size(size_index)?;
        if glyph < size.start_glyph_index || glyph > size.end_glyph_index {
            return Ok(None);
        }

        for subtable in self.index_subtables(size_index)? {
            if let Some(info) = subtable.glyph_location(glyph)? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }
}

/// Copies `EBLC` through unchanged.
pub struct EblcBuilder {
    core: BuilderCore,
}

impl EblcBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for EblcBuilder {
    type Table = EblcTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<EblcTable> {
        Ok(EblcTable { header: self.core.table_header(&data), data })
    }
}

/// The embedded bitmap data table.
#[derive(Debug)]
pub struct EbdtTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(EbdtTable);

impl EbdtTable {
    #[allow(missing_docs)]
    pub fn version(&self) -> Result<u32> {
        self.data.read_ulong(0)
    }

    /// The raw bitmap record at a location from `EBLC`.
    pub fn glyph_data(&self, info: &BitmapGlyphInfo) -> Result<ReadableFontData> {
        self.data
            .slice(info.offset as usize, info.length as usize)
            .ok_or(Error::OutOfBounds)
    }
}

/// Copies `EBDT` through unchanged.
pub struct EbdtBuilder {
    core: BuilderCore,
}

impl EbdtBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for EbdtBuilder {
    type Table = EbdtTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<EbdtTable> {
        Ok(EbdtTable { header: self.core.table_header(&data), data })
    }
}
