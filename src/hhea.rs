//! The `hhea` table holds font-wide horizontal metrics. Its
//! `numberOfHMetrics` decides how `hmtx` is laid out.

use crate::data::ReadableFontData;
use crate::stream::Fixed;
use crate::table::{impl_font_data_table, table_fields, BuilderCore, Header, TableModel};
use crate::Result;

/// The horizontal header.
#[derive(Debug)]
pub struct HheaTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(HheaTable);

impl HheaTable {
    /// The size of an `hhea` table in bytes.
    pub const SIZE: usize = 36;
}

table_fields! { HheaTable, HheaBuilder;
    /// Version of the table, 1.0.
    table_version, set_table_version: Fixed = 0;
    /// Distance from the baseline to the highest ascender.
    ascender, set_ascender: i16 = 4;
    /// Distance from the baseline to the lowest descender.
    descender, set_descender: i16 = 6;
    /// Typographic line gap.
    line_gap, set_line_gap: i16 = 8;
    /// Maximum advance width in `hmtx`.
    advance_width_max, set_advance_width_max: u16 = 10;
    /// Minimum left side bearing of glyphs with contours.
    min_left_side_bearing, set_min_left_side_bearing: i16 = 12;
    /// Minimum right side bearing of glyphs with contours.
    min_right_side_bearing, set_min_right_side_bearing: i16 = 14;
    /// Maximum of `lsb + (xMax - xMin)`.
    x_max_extent, set_x_max_extent: i16 = 16;
    /// Rise of the cursor slope, 1 for upright text.
    caret_slope_rise, set_caret_slope_rise: i16 = 18;
    /// Run of the cursor slope, 0 for upright text.
    caret_slope_run, set_caret_slope_run: i16 = 20;
    /// Shift of slanted highlights.
    caret_offset, set_caret_offset: i16 = 22;
    /// 0 for the current format.
    metric_data_format, set_metric_data_format: i16 = 32;
    /// The number of full entries in `hmtx`.
    number_of_h_metrics, set_number_of_h_metrics: u16 = 34;
}

/// Edits the `hhea` table in place.
pub struct HheaBuilder {
    core: BuilderCore,
}

impl HheaBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for HheaBuilder {
    type Table = HheaTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<HheaTable> {
        Ok(HheaTable { header: self.core.table_header(&data), data })
    }
}
