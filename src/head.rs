//! The `head` table holds global font information. Its `indexToLocFormat`
//! decides how `loca` is stored, and its `checkSumAdjustment` is
//! recalculated whenever a font is serialized. That field is excluded from
//! the table checksum so that rewriting it never invalidates the directory.

use crate::data::ReadableFontData;
use crate::loca::IndexToLocFormat;
use crate::stream::Fixed;
use crate::table::{impl_font_data_table, table_fields, BuilderCore, Header, TableModel};
use crate::Result;

/// The value every `head` table stores at [`HeadTable::MAGIC_NUMBER_OFFSET`].
pub const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// What `checkSumAdjustment` is computed from.
pub const CHECKSUM_ADJUSTMENT_BASE: u32 = 0xB1B0AFBA;

/// Checksum ranges skipping the adjustment field.
const CHECKSUM_RANGES: [usize; 3] = [0, 8, 12];

/// The global font header.
#[derive(Debug)]
pub struct HeadTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(HeadTable);

impl HeadTable {
    /// The size of a `head` table in bytes.
    pub const SIZE: usize = 54;
    /// The offset of `checkSumAdjustment`.
    pub const CHECKSUM_ADJUSTMENT_OFFSET: usize = 8;
    /// The offset of `magicNumber`.
    pub const MAGIC_NUMBER_OFFSET: usize = 12;

    fn new(header: Header, mut data: ReadableFontData) -> Self {
        data.set_checksum_ranges(&CHECKSUM_RANGES);
        Self { header, data }
    }

    /// The format of the `loca` table.
    pub fn index_to_loc_format(&self) -> Result<IndexToLocFormat> {
        IndexToLocFormat::from_i16(self.index_to_loc_format_raw()?)
    }
}

table_fields! { HeadTable, HeadBuilder;
    /// Version of the table, 1.0.
    table_version, set_table_version: Fixed = 0;
    /// Revision set by the font manufacturer.
    font_revision, set_font_revision: Fixed = 4;
    /// Makes the whole font sum up to `0xB1B0AFBA`.
    checksum_adjustment, set_checksum_adjustment: u32 = 8;
    /// Always `0x5F0F3CF5`.
    magic_number, set_magic_number: u32 = 12;
    /// Font flags.
    flags, set_flags: u16 = 16;
    /// Design units per em square.
    units_per_em, set_units_per_em: u16 = 18;
    /// Creation time, seconds since 1904.
    created, set_created: i64 = 20;
    /// Modification time, seconds since 1904.
    modified, set_modified: i64 = 28;
    /// Minimum x of all glyph bounding boxes.
    x_min, set_x_min: i16 = 36;
    /// Minimum y of all glyph bounding boxes.
    y_min, set_y_min: i16 = 38;
    /// Maximum x of all glyph bounding boxes.
    x_max, set_x_max: i16 = 40;
    /// Maximum y of all glyph bounding boxes.
    y_max, set_y_max: i16 = 42;
    /// Bold, italic and friends.
    mac_style, set_mac_style: u16 = 44;
    /// Smallest readable size in pixels.
    lowest_rec_ppem, set_lowest_rec_ppem: u16 = 46;
    /// Deprecated, should be 2.
    font_direction_hint, set_font_direction_hint: i16 = 48;
    /// 0 for short `loca` offsets, 1 for long ones.
    index_to_loc_format_raw, set_index_to_loc_format_raw: i16 = 50;
    /// 0 for the current glyph format.
    glyph_data_format, set_glyph_data_format: i16 = 52;
}

/// Edits the `head` table in place.
pub struct HeadBuilder {
    core: BuilderCore,
}

impl HeadBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }

    /// The format of the `loca` table.
    pub fn index_to_loc_format(&self) -> Result<IndexToLocFormat> {
        IndexToLocFormat::from_i16(self.index_to_loc_format_raw()?)
    }

    /// Switch the `loca` format.
    pub fn set_index_to_loc_format(&mut self, format: IndexToLocFormat) -> Result<()> {
        self.set_index_to_loc_format_raw(format as i16)
    }
}

impl TableModel for HeadBuilder {
    type Table = HeadTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<HeadTable> {
        Ok(HeadTable::new(self.core.table_header(&data), data))
    }
}
