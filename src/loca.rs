//! The `loca` table stores where each glyph of the `glyf` table starts.
//!
//! It has `numGlyphs + 1` entries. The last one only bounds the length of
//! the final glyph. Short offsets are stored halved.

use crate::data::{ReadableFontData, WritableFontData};
use crate::table::{impl_font_data_table, BuilderCore, Header, SerializeSize, TableModel};
use crate::{Error, Result, Tag};

/// How `loca` offsets are stored, from `head.indexToLocFormat`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum IndexToLocFormat {
    /// 16-bit entries holding the offset divided by two.
    Short = 0,
    /// 32-bit entries holding the offset.
    #[default]
    Long = 1,
}

impl IndexToLocFormat {
    /// Decode the raw `head` field.
    pub fn from_i16(value: i16) -> Result<Self> {
        match value {
            0 => Ok(Self::Short),
            1 => Ok(Self::Long),
            _ => Err(Error::InvalidData),
        }
    }

    /// The size of one entry.
    pub fn entry_size(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }
}

/// The glyph location table.
#[derive(Debug)]
pub struct LocaTable {
    header: Header,
    data: ReadableFontData,
    format: IndexToLocFormat,
    num_glyphs: usize,
}

impl_font_data_table!(LocaTable);

impl LocaTable {
    fn new(
        header: Header,
        data: ReadableFontData,
        format: IndexToLocFormat,
        num_glyphs: usize,
    ) -> Result<Self> {
        if data.length() < (num_glyphs + 1) * format.entry_size() {
            log::warn!("loca table is too short for {num_glyphs} glyphs");
            return Err(Error::InvalidData);
        }
        Ok(Self { header, data, format, num_glyphs })
    }

    #[allow(missing_docs)]
    pub fn format_version(&self) -> IndexToLocFormat {
        self.format
    }

    #[allow(missing_docs)]
    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs
    }

    /// The number of entries, one more than the number of glyphs.
    pub fn num_locas(&self) -> usize {
        self.num_glyphs + 1
    }

    /// The entry at `index`, which may be `num_glyphs()`.
    pub fn loca(&self, index: usize) -> Result<u32> {
        if index > self.num_glyphs {
            return Err(Error::OutOfBounds);
        }

        match self.format {
            IndexToLocFormat::Short => {
                Ok(2 * u32::from(self.data.read_ushort(index * 2)?))
            }
            IndexToLocFormat::Long => self.data.read_ulong(index * 4),
        }
    }

    /// Where the glyph starts in `glyf`.
    pub fn glyph_offset(&self, glyph: u16) -> Result<u32> {
        if usize::from(glyph) >= self.num_glyphs {
            return Err(Error::OutOfBounds);
        }
        self.loca(usize::from(glyph))
    }

    /// The byte length of the glyph in `glyf`.
    pub fn glyph_length(&self, glyph: u16) -> Result<u32> {
        let start = self.glyph_offset(glyph)?;
        let end = self.loca(usize::from(glyph) + 1)?;
        end.checked_sub(start).ok_or(Error::InvalidData)
    }

    /// All entries in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<u32>> + '_ {
        (0..self.num_locas()).map(|i| self.loca(i))
    }
}

/// Edits the `loca` table as a list of offsets.
///
/// The number of glyphs and the format come from `maxp` and `head`. The
/// font builder pushes them in before every build.
pub struct LocaBuilder {
    core: BuilderCore,
    loca: Option<Vec<u32>>,
    format: IndexToLocFormat,
    num_glyphs: Option<usize>,
}

impl LocaBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self {
            core,
            loca: None,
            format: IndexToLocFormat::default(),
            num_glyphs: None,
        }
    }

    #[allow(missing_docs)]
    pub fn format_version(&self) -> IndexToLocFormat {
        self.format
    }

    /// Set the format used to read and write entries.
    pub fn set_format_version(&mut self, format: IndexToLocFormat) {
        self.format = format;
    }

    /// Must be set before the entries can be read from the loaded bytes.
    pub fn set_num_glyphs(&mut self, num_glyphs: usize) {
        self.num_glyphs = Some(num_glyphs);
    }

    /// The number of glyphs, from the list if it was parsed or set.
    pub fn num_glyphs(&self) -> Option<usize> {
        match &self.loca {
            Some(loca) if !loca.is_empty() => Some(loca.len() - 1),
            _ => self.num_glyphs,
        }
    }

    /// The list of offsets. Parsing it marks the model as changed.
    pub fn loca_list(&mut self) -> Result<&[u32]> {
        Ok(self.loca_mut()?.as_slice())
    }

    /// Replace the list of offsets. The number of glyphs follows its length.
    pub fn set_loca_list(&mut self, loca: Vec<u32>) {
        self.num_glyphs = Some(loca.len().saturating_sub(1));
        self.loca = Some(loca);
        self.set_model_changed();
    }

    /// The number of entries.
    pub fn num_locas(&mut self) -> Result<usize> {
        Ok(self.loca_mut()?.len())
    }

    /// The entry at `index`.
    pub fn loca(&mut self, index: usize) -> Result<u32> {
        self.loca_mut()?.get(index).copied().ok_or(Error::OutOfBounds)
    }

    /// Where the glyph starts in `glyf`.
    pub fn glyph_offset(&mut self, glyph: u16) -> Result<u32> {
        self.loca(usize::from(glyph))
    }

    /// The byte length of the glyph in `glyf`.
    pub fn glyph_length(&mut self, glyph: u16) -> Result<u32> {
        let start = self.loca(usize::from(glyph))?;
        let end = self.loca(usize::from(glyph) + 1)?;
        end.checked_sub(start).ok_or(Error::InvalidData)
    }

    /// Drop the parsed list and any edits to it.
    pub fn revert(&mut self) {
        self.loca = None;
        self.core.set_model_changed(false);
    }

    /// Empty the list.
    pub fn clear(&mut self) -> Result<()> {
        self.loca_mut()?.clear();
        Ok(())
    }

    fn loca_mut(&mut self) -> Result<&mut Vec<u32>> {
        if self.loca.is_none() {
            let loca = self.parse()?;
            self.loca = Some(loca);
            self.set_model_changed();
        }

        // Just filled in above.
        self.loca.as_mut().ok_or(Error::NotReady(Tag::LOCA))
    }

    fn parse(&self) -> Result<Vec<u32>> {
        let Some(data) = self.core.internal_read_data() else {
            return Ok(vec![]);
        };

        let num_glyphs = self.num_glyphs.ok_or(Error::NotReady(Tag::LOCA))?;
        let table = LocaTable::new(*self.core.header(), data, self.format, num_glyphs)?;
        table.iter().collect()
    }
}

impl TableModel for LocaBuilder {
    type Table = LocaTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_data_set(&mut self) {
        self.loca = None;
    }

    fn sub_data_size_to_serialize(&mut self) -> Result<SerializeSize> {
        let len = self.loca.as_ref().map_or(0, Vec::len);
        Ok(SerializeSize::Fixed(len * self.format.entry_size()))
    }

    fn sub_ready_to_serialize(&mut self) -> bool {
        self.loca.is_some()
    }

    fn sub_serialize(&mut self, dest: &WritableFontData) -> Result<usize> {
        let Some(loca) = &self.loca else { return Ok(0) };
        if loca.windows(2).any(|pair| pair[1] < pair[0]) {
            log::warn!("loca offsets are not in ascending order");
            return Err(Error::InvalidData);
        }

        let mut offset = 0;
        for &entry in loca {
            offset += match self.format {
                IndexToLocFormat::Short => {
                    if entry % 2 != 0 || entry / 2 > u32::from(u16::MAX) {
                        log::warn!("loca offset {entry} does not fit the short format");
                        return Err(Error::InvalidData);
                    }
                    dest.write_ushort(offset, (entry / 2) as u16)?
                }
                IndexToLocFormat::Long => dest.write_ulong(offset, entry)?,
            };
        }

        Ok(offset)
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<LocaTable> {
        // A serialized list is authoritative for its own length.
        let num_glyphs = match self.model_changed() {
            true => self.num_glyphs(),
            false => self.num_glyphs,
        };
        let num_glyphs = num_glyphs.ok_or(Error::NotReady(Tag::LOCA))?;
        LocaTable::new(self.core.table_header(&data), data, self.format, num_glyphs)
    }

    fn ready_to_build(&self) -> bool {
        self.num_glyphs().is_some()
    }
}
