//! The `maxp` table holds the number of glyphs, which sizes `loca` and
//! `hmtx`. Version 0.5 fonts (CFF outlines) stop after that field.

use crate::data::ReadableFontData;
use crate::stream::Fixed;
use crate::table::{impl_font_data_table, table_fields, BuilderCore, Header, TableModel};
use crate::Result;

/// The maximum profile.
#[derive(Debug)]
pub struct MaxpTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(MaxpTable);

impl MaxpTable {
    /// The size of a version 0.5 table.
    pub const SIZE_V05: usize = 6;
    /// The size of a version 1.0 table.
    pub const SIZE_V10: usize = 32;
}

table_fields! { MaxpTable, MaxpBuilder;
    /// 0.5 for CFF outlines, 1.0 for TrueType outlines.
    table_version, set_table_version: Fixed = 0;
    /// The number of glyphs in the font.
    num_glyphs, set_num_glyphs: u16 = 4;
    /// Points in the largest simple glyph.
    max_points, set_max_points: u16 = 6;
    /// Contours in the largest simple glyph.
    max_contours, set_max_contours: u16 = 8;
    /// Points in the largest composite glyph.
    max_composite_points, set_max_composite_points: u16 = 10;
    /// Contours in the largest composite glyph.
    max_composite_contours, set_max_composite_contours: u16 = 12;
    /// 1 without twilight zone instructions, 2 with.
    max_zones, set_max_zones: u16 = 14;
    /// Points used in the twilight zone.
    max_twilight_points, set_max_twilight_points: u16 = 16;
    /// Storage area locations.
    max_storage, set_max_storage: u16 = 18;
    /// Function definitions.
    max_function_defs, set_max_function_defs: u16 = 20;
    /// Instruction definitions.
    max_instruction_defs, set_max_instruction_defs: u16 = 22;
    /// Depth of the interpreter stack.
    max_stack_elements, set_max_stack_elements: u16 = 24;
    /// Bytes of the longest glyph program.
    max_size_of_instructions, set_max_size_of_instructions: u16 = 26;
    /// Components referenced at the top level of a composite glyph.
    max_component_elements, set_max_component_elements: u16 = 28;
    /// Levels of composite recursion.
    max_component_depth, set_max_component_depth: u16 = 30;
}

/// Edits the `maxp` table in place.
pub struct MaxpBuilder {
    core: BuilderCore,
}

impl MaxpBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for MaxpBuilder {
    type Table = MaxpTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<MaxpTable> {
        Ok(MaxpTable { header: self.core.table_header(&data), data })
    }
}
