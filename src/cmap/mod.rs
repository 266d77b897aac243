//! The `cmap` table maps character codes to glyph ids.
//!
//! Only the subtable formats needed for lookups are understood: 0, 4, 6 and
//! 12. Other formats are reported as [`Error::UnsupportedFormat`] when asked
//! for directly and skipped when iterating.

mod format12;
mod format4;

pub use self::format12::{Format12, SequentialMapGroup};
pub use self::format4::Format4;

use crate::data::ReadableFontData;
use crate::table::{impl_font_data_table, BuilderCore, Header, TableModel};
use crate::{Error, Result, Tag};

const ENCODING_RECORD_START: usize = 4;
const ENCODING_RECORD_SIZE: usize = 8;

/// Locates one subtable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EncodingRecord {
    #[allow(missing_docs)]
    pub platform_id: u16,
    #[allow(missing_docs)]
    pub encoding_id: u16,
    /// Offset from the start of the table.
    pub subtable_offset: u32,
}

impl EncodingRecord {
    /// Whether the subtable maps Unicode code points.
    pub fn is_unicode(&self) -> bool {
        self.platform_id == 0
            || (self.platform_id == 3 && [0, 1, 10].contains(&self.encoding_id))
    }
}

/// A format 0 subtable: one byte glyph ids for the first 256 codes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Format0 {
    language: u16,
    glyph_ids: Vec<u8>,
}

/// A format 6 subtable: a dense range of codes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Format6 {
    language: u16,
    first_code: u16,
    glyph_ids: Vec<u16>,
}

/// A parsed subtable.
#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum CmapSubtable {
    Format0(Format0),
    Format4(Format4),
    Format6(Format6),
    Format12(Format12),
}

impl CmapSubtable {
    /// Parse the subtable starting at the beginning of `data`.
    pub fn parse(data: &ReadableFontData) -> Result<Self> {
        let format = data.read_ushort(0)?;
        Ok(match format {
            0 => Self::Format0(Format0 {
                language: data.read_ushort(4)?,
                glyph_ids: data.read_vec(6, 256)?,
            }),
            4 => Self::Format4(Format4::parse(data)?),
            6 => {
                let count = usize::from(data.read_ushort(8)?);
                Self::Format6(Format6 {
                    language: data.read_ushort(4)?,
                    first_code: data.read_ushort(6)?,
                    glyph_ids: (0..count)
                        .map(|i| data.read_ushort(10 + i * 2))
                        .collect::<Result<_>>()?,
                })
            }
            12 => Self::Format12(Format12::parse(data)?),
            _ => return Err(Error::UnsupportedFormat { tag: Tag::CMAP, format }),
        })
    }

    #[allow(missing_docs)]
    pub fn format(&self) -> u16 {
        match self {
            Self::Format0(_) => 0,
            Self::Format4(_) => 4,
            Self::Format6(_) => 6,
            Self::Format12(_) => 12,
        }
    }

    /// The Macintosh language, 0 for everything else.
    pub fn language(&self) -> u32 {
        match self {
            Self::Format0(t) => u32::from(t.language),
            Self::Format4(t) => u32::from(t.language),
            Self::Format6(t) => u32::from(t.language),
            Self::Format12(t) => t.language,
        }
    }

    /// The glyph for a character code, if it is mapped.
    pub fn glyph_id(&self, code: u32) -> Option<u16> {
        let glyph = match self {
            Self::Format0(t) => {
                let glyph = *t.glyph_ids.get(usize::try_from(code).ok()?)?;
                Some(u16::from(glyph))
            }
            Self::Format4(t) => t.glyph_id(code),
            Self::Format6(t) => {
                let index = code.checked_sub(u32::from(t.first_code))?;
                t.glyph_ids.get(usize::try_from(index).ok()?).copied()
            }
            Self::Format12(t) => t.glyph_id(code),
        };
        glyph.filter(|&glyph| glyph != 0)
    }

    /// Calls `f` for each character code the subtable covers.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        match self {
            Self::Format4(t) => t.codepoints(f),
            Self::Format12(t) => t.codepoints(f),
            Self::Format0(t) => {
                for (code, &glyph) in t.glyph_ids.iter().enumerate() {
                    if glyph != 0 {
                        f(code as u32);
                    }
                }
            }
            Self::Format6(t) => {
                for (i, &glyph) in t.glyph_ids.iter().enumerate() {
                    if glyph != 0 {
                        f(u32::from(t.first_code) + i as u32);
                    }
                }
            }
        }
    }
}

/// The character to glyph mapping table.
#[derive(Debug)]
pub struct CmapTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(CmapTable);

impl CmapTable {
    #[allow(missing_docs)]
    pub fn version(&self) -> Result<u16> {
        self.data.read_ushort(0)
    }

    /// The number of encoding records.
    pub fn num_tables(&self) -> Result<usize> {
        Ok(usize::from(self.data.read_ushort(2)?))
    }

    /// The encoding record at `index`.
    pub fn encoding_record(&self, index: usize) -> Result<EncodingRecord> {
        if index >= self.num_tables()? {
            return Err(Error::OutOfBounds);
        }

        let offset = ENCODING_RECORD_START + index * ENCODING_RECORD_SIZE;
        Ok(EncodingRecord {
            platform_id: self.data.read_ushort(offset)?,
            encoding_id: self.data.read_ushort(offset + 2)?,
            subtable_offset: self.data.read_ulong(offset + 4)?,
        })
    }

    /// The subtable of the encoding record at `index`.
    pub fn subtable(&self, index: usize) -> Result<CmapSubtable> {
        let record = self.encoding_record(index)?;
        let data = self
            .data
            .slice_from(record.subtable_offset as usize)
            .ok_or(Error::OutOfBounds)?;
        CmapSubtable::parse(&data)
    }

    /// Every readable subtable with its record. Unsupported formats are
    /// skipped.
    pub fn subtables(&self) -> Result<Vec<(EncodingRecord, CmapSubtable)>> {
        let mut subtables = vec![];
        for index in 0..self.num_tables()? {
            let record = self.encoding_record(index)?;
            match self.subtable(index) {
                Ok(subtable) => subtables.push((record, subtable)),
                Err(Error::UnsupportedFormat { format, .. }) => {
                    log::warn!(
                        "skipping cmap subtable ({}, {}) with format {format}",
                        record.platform_id,
                        record.encoding_id,
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(subtables)
    }

    /// The subtable for a platform and encoding.
    pub fn find(&self, platform_id: u16, encoding_id: u16) -> Result<Option<CmapSubtable>> {
        Ok(self
            .subtables()?
            .into_iter()
            .find(|(r, _)| r.platform_id == platform_id && r.encoding_id == encoding_id)
            .map(|(_, subtable)| subtable))
    }

    /// The glyph for a Unicode code point, from the best Unicode subtable.
    pub fn glyph_id(&self, code_point: u32) -> Result<Option<u16>> {
        let subtables = self.subtables()?;
        let best = subtables
            .iter()
            .filter(|(record, _)| record.is_unicode())
            .max_by_key(|(record, subtable)| {
                (subtable.format() == 12, record.platform_id == 3)
            });
        Ok(best.and_then(|(_, subtable)| subtable.glyph_id(code_point)))
    }
}

/// Edits the `cmap` table as bytes.
pub struct CmapBuilder {
    core: BuilderCore,
}

impl CmapBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core }
    }
}

impl TableModel for CmapBuilder {
    type Table = CmapTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<CmapTable> {
        Ok(CmapTable { header: self.core.table_header(&data), data })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::data::{MemoryStorage, StorageFactory};

    fn u16s(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// 'A'..='C' map to 1..=3 through a delta, 'a'..='b' through the glyph
    /// array.
    fn format4() -> Vec<u8> {
        let mut bytes = u16s(&[4, 0, 0, 6, 4, 1, 2]);
        bytes.extend(u16s(&[0x43, 0x62, 0xFFFF])); // end codes
        bytes.extend(u16s(&[0])); // pad
        bytes.extend(u16s(&[0x41, 0x61, 0xFFFF])); // start codes
        bytes.extend(u16s(&[(-0x40i16) as u16, 0, 1])); // deltas
        bytes.extend(u16s(&[0, 4, 0])); // range offsets
        bytes.extend(u16s(&[7, 8])); // glyph array
        let len = bytes.len() as u16;
        bytes[2..4].copy_from_slice(&len.to_be_bytes());
        bytes
    }

    fn format12() -> Vec<u8> {
        let mut bytes = u16s(&[12, 0]);
        let groups: [[u32; 3]; 2] = [[0x41, 0x43, 1], [0x1F600, 0x1F601, 9]];
        bytes.extend((16 + 12 * groups.len() as u32).to_be_bytes());
        bytes.extend(0u32.to_be_bytes());
        bytes.extend((groups.len() as u32).to_be_bytes());
        for group in groups.iter().flatten() {
            bytes.extend(group.to_be_bytes());
        }
        bytes
    }

    fn cmap(subtables: &[(u16, u16, Vec<u8>)]) -> CmapTable {
        let mut bytes = u16s(&[0, subtables.len() as u16]);
        let mut offset = 4 + 8 * subtables.len() as u32;
        for (platform, encoding, data) in subtables {
            bytes.extend(u16s(&[*platform, *encoding]));
            bytes.extend(offset.to_be_bytes());
            offset += data.len() as u32;
        }
        for (_, _, data) in subtables {
            bytes.extend(data);
        }

        let data = MemoryStorage.wrap_bytes(&bytes).unwrap().to_readable();
        let core = BuilderCore::new(Header::new(Tag::CMAP), Some(data), Rc::new(MemoryStorage));
        CmapBuilder::new(core).build().unwrap()
    }

    #[test]
    fn format4_lookup() {
        let table = cmap(&[(3, 1, format4())]);
        let subtable = table.subtable(0).unwrap();
        assert_eq!(subtable.format(), 4);
        assert_eq!(subtable.glyph_id(0x41), Some(1));
        assert_eq!(subtable.glyph_id(0x43), Some(3));
        assert_eq!(subtable.glyph_id(0x61), Some(7));
        assert_eq!(subtable.glyph_id(0x62), Some(8));
        assert_eq!(subtable.glyph_id(0x44), None);
        assert_eq!(subtable.glyph_id(0x10000), None);

        let mut codes = vec![];
        subtable.codepoints(|c| codes.push(c));
        assert_eq!(codes, [0x41, 0x42, 0x43, 0x61, 0x62]);
    }

    #[test]
    fn prefers_full_unicode_subtable() {
        let table = cmap(&[(3, 1, format4()), (3, 10, format12())]);
        assert_eq!(table.glyph_id(0x1F601).unwrap(), Some(10));
        assert_eq!(table.glyph_id(0x42).unwrap(), Some(2));
        assert_eq!(table.find(3, 1).unwrap().map(|s| s.format()), Some(4));
    }

    #[test]
    fn skips_unsupported_formats() {
        let _ = env_logger::builder().is_test(true).try_init();
        let format14 = u16s(&[14, 0, 0, 0, 0]);
        let table = cmap(&[(0, 5, format14), (0, 3, format4())]);
        assert!(matches!(
            table.subtable(0),
            Err(Error::UnsupportedFormat { tag: Tag::CMAP, format: 14 })
        ));
        assert_eq!(table.subtables().unwrap().len(), 1);
        assert_eq!(table.glyph_id(0x41).unwrap(), Some(1));
    }

    #[test]
    fn byte_and_dense_formats() {
        let mut format0 = u16s(&[0, 262, 0]);
        let mut glyphs = vec![0u8; 256];
        glyphs[0x20] = 3;
        format0.extend(glyphs);
        let format6 = u16s(&[6, 16, 0, 0x30, 3, 4, 0, 6]);

        let table = cmap(&[(1, 0, format0), (3, 1, format6)]);
        assert_eq!(table.subtable(0).unwrap().glyph_id(0x20), Some(3));
        assert_eq!(table.subtable(0).unwrap().glyph_id(0x21), None);
        let format6 = table.subtable(1).unwrap();
        assert_eq!(format6.glyph_id(0x30), Some(4));
        assert_eq!(format6.glyph_id(0x31), None);
        assert_eq!(format6.glyph_id(0x32), Some(6));
        assert_eq!(format6.glyph_id(0x2F), None);
    }
}
