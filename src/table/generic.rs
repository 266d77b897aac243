use super::{impl_font_data_table, BuilderCore, Header, TableModel};
use crate::data::ReadableFontData;
use crate::Result;

/// A table this crate has no structured view of.
#[derive(Debug)]
pub struct GenericTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(GenericTable);

/// Copies the bytes of an unknown table through unchanged.
pub struct GenericTableBuilder {
    core: BuilderCore,
}

impl GenericTableBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for GenericTableBuilder {
    type Table = GenericTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<GenericTable> {
        Ok(GenericTable { header: self.core.table_header(&data), data })
    }
}
