//! The `OS/2` table: metrics and classification used by Windows.
//!
//! The table grew over several versions. Fields up to the code page ranges
//! exist from version 1 on, the `sxHeight` group from version 2.

use crate::data::ReadableFontData;
use crate::table::{impl_font_data_table, table_fields, BuilderCore, Header, TableModel};
use crate::stream::Readable;
use crate::{Error, Result, Tag};

const PANOSE_OFFSET: usize = 32;
const PANOSE_LENGTH: usize = 10;

/// The OS/2 and Windows metrics table.
#[derive(Debug)]
pub struct Os2Table {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(Os2Table);

impl Os2Table {
    /// The ten Panose classification bytes.
    pub fn panose(&self) -> Result<[u8; PANOSE_LENGTH]> {
        read_panose(&self.data)
    }

    /// Both code page range fields as one value. Range 2 supplies the upper
    /// 32 bits.
    pub fn ul_code_page_range(&self) -> Result<u64> {
        Ok(code_page_range(self.ul_code_page_range1()?, self.ul_code_page_range2()?))
    }

    /// All four Unicode range fields, lowest bits first.
    pub fn ul_unicode_range(&self) -> Result<u128> {
        Ok(unicode_range([
            self.ul_unicode_range1()?,
            self.ul_unicode_range2()?,
            self.ul_unicode_range3()?,
            self.ul_unicode_range4()?,
        ]))
    }

    /// Height of lower case letters. Only in version 2 and later.
    pub fn sx_height(&self) -> Result<Option<i16>> {
        self.since_v2(86)
    }

    /// Height of capital letters. Only in version 2 and later.
    pub fn s_cap_height(&self) -> Result<Option<i16>> {
        self.since_v2(88)
    }

    /// Substitute for missing characters. Only in version 2 and later.
    pub fn us_default_char(&self) -> Result<Option<u16>> {
        self.since_v2(90)
    }

    /// The word break character. Only in version 2 and later.
    pub fn us_break_char(&self) -> Result<Option<u16>> {
        self.since_v2(92)
    }

    /// Longest lookup context. Only in version 2 and later.
    pub fn us_max_context(&self) -> Result<Option<u16>> {
        self.since_v2(94)
    }

    fn since_v2<T: Readable>(&self, offset: usize) -> Result<Option<T>> {
        if self.table_version()? < 2 {
            return Ok(None);
        }
        self.data.read::<T>(offset).map(Some)
    }
}

fn read_panose(data: &ReadableFontData) -> Result<[u8; PANOSE_LENGTH]> {
    let mut panose = [0; PANOSE_LENGTH];
    for (i, byte) in panose.iter_mut().enumerate() {
        *byte = data.read_ubyte(PANOSE_OFFSET + i)?;
    }
    Ok(panose)
}

fn code_page_range(range1: u32, range2: u32) -> u64 {
    (u64::from(range2) << 32) | u64::from(range1)
}

fn unicode_range(ranges: [u32; 4]) -> u128 {
    ranges
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &range)| acc | (u128::from(range) << (32 * i)))
}

table_fields! { Os2Table, Os2Builder;
    /// Version of the table.
    table_version, set_table_version: u16 = 0;
    /// Average advance width of all glyphs.
    x_avg_char_width, set_x_avg_char_width: i16 = 2;
    /// Visual weight, 100 to 900.
    us_weight_class, set_us_weight_class: u16 = 4;
    /// Relative width, 1 to 9.
    us_width_class, set_us_width_class: u16 = 6;
    /// Embedding licensing flags.
    fs_type, set_fs_type: u16 = 8;
    /// Horizontal size of subscripts.
    y_subscript_x_size, set_y_subscript_x_size: i16 = 10;
    /// Vertical size of subscripts.
    y_subscript_y_size, set_y_subscript_y_size: i16 = 12;
    /// Horizontal offset of subscripts.
    y_subscript_x_offset, set_y_subscript_x_offset: i16 = 14;
    /// Vertical offset of subscripts.
    y_subscript_y_offset, set_y_subscript_y_offset: i16 = 16;
    /// Horizontal size of superscripts.
    y_superscript_x_size, set_y_superscript_x_size: i16 = 18;
    /// Vertical size of superscripts.
    y_superscript_y_size, set_y_superscript_y_size: i16 = 20;
    /// Horizontal offset of superscripts.
    y_superscript_x_offset, set_y_superscript_x_offset: i16 = 22;
    /// Vertical offset of superscripts.
    y_superscript_y_offset, set_y_superscript_y_offset: i16 = 24;
    /// Thickness of the strikeout stroke.
    y_strikeout_size, set_y_strikeout_size: i16 = 26;
    /// Position of the strikeout stroke above the baseline.
    y_strikeout_position, set_y_strikeout_position: i16 = 28;
    /// IBM font class and subclass.
    s_family_class, set_s_family_class: i16 = 30;
    /// Unicode blocks 0 to 31.
    ul_unicode_range1, set_ul_unicode_range1: u32 = 42;
    /// Unicode blocks 32 to 63.
    ul_unicode_range2, set_ul_unicode_range2: u32 = 46;
    /// Unicode blocks 64 to 95.
    ul_unicode_range3, set_ul_unicode_range3: u32 = 50;
    /// Unicode blocks 96 to 127.
    ul_unicode_range4, set_ul_unicode_range4: u32 = 54;
    /// The vendor identifier.
    ach_vend_id, set_ach_vend_id: Tag = 58;
    /// Style flags.
    fs_selection, set_fs_selection: u16 = 62;
    /// Lowest character code in the font.
    us_first_char_index, set_us_first_char_index: u16 = 64;
    /// Highest character code in the font, capped at 0xFFFF.
    us_last_char_index, set_us_last_char_index: u16 = 66;
    /// Typographic ascender.
    s_typo_ascender, set_s_typo_ascender: i16 = 68;
    /// Typographic descender.
    s_typo_descender, set_s_typo_descender: i16 = 70;
    /// Typographic line gap.
    s_typo_line_gap, set_s_typo_line_gap: i16 = 72;
    /// Clipping ascent on Windows.
    us_win_ascent, set_us_win_ascent: u16 = 74;
    /// Clipping descent on Windows.
    us_win_descent, set_us_win_descent: u16 = 76;
    /// Code pages 0 to 31.
    ul_code_page_range1, set_ul_code_page_range1: u32 = 78;
    /// Code pages 32 to 63.
    ul_code_page_range2, set_ul_code_page_range2: u32 = 82;
}

/// Edits the `OS/2` table in place.
pub struct Os2Builder {
    core: BuilderCore,
}

impl Os2Builder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }

    /// The ten Panose classification bytes.
    pub fn panose(&self) -> Result<[u8; PANOSE_LENGTH]> {
        match self.core.internal_read_data() {
            Some(data) => read_panose(&data),
            None => Err(Error::OutOfBounds),
        }
    }

    /// Replace the Panose classification.
    pub fn set_panose(&mut self, panose: [u8; PANOSE_LENGTH]) -> Result<()> {
        self.core.internal_write_data()?.write_bytes(PANOSE_OFFSET, &panose)?;
        Ok(())
    }

    /// Both code page range fields as one value. Range 2 supplies the upper
    /// 32 bits.
    pub fn ul_code_page_range(&self) -> Result<u64> {
        Ok(code_page_range(self.ul_code_page_range1()?, self.ul_code_page_range2()?))
    }

    /// Split a combined value back into the two code page range fields.
    pub fn set_ul_code_page_range(&mut self, range: u64) -> Result<()> {
        self.set_ul_code_page_range1(range as u32)?;
        self.set_ul_code_page_range2((range >> 32) as u32)
    }
}

impl TableModel for Os2Builder {
    type Table = Os2Table;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<Os2Table> {
        Ok(Os2Table { header: self.core.table_header(&data), data })
    }
}
