use crate::data::ReadableFontData;
use crate::{Error, Result, Tag};

const HEADER_SIZE: usize = 8;
const BIG_METRICS_SIZE: usize = 8;

/// Where a bitmap glyph lives in `EBDT`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitmapGlyphInfo {
    #[allow(missing_docs)]
    pub glyph_id: u16,
    /// Offset from the start of `EBDT`.
    pub offset: u32,
    #[allow(missing_docs)]
    pub length: u32,
    /// The `EBDT` image format.
    pub format: u16,
}

/// One index subtable: the bitmap locations of a range of glyphs.
///
/// Formats 1 and 3 store an offset per glyph, 2 and 5 a constant image
/// size, 4 and 5 a sparse list of glyph ids.
#[derive(Debug, Clone)]
pub struct IndexSubTable {
    first_glyph_index: u16,
    last_glyph_index: u16,
    index_format: u16,
    image_format: u16,
    image_data_offset: u32,
    data: ReadableFontData,
}

impl IndexSubTable {
    pub(super) fn parse(first: u16, last: u16, data: ReadableFontData) -> Result<Self> {
        let index_format = data.read_ushort(0)?;
        if !(1..=5).contains(&index_format) {
            return Err(Error::UnsupportedFormat { tag: Tag::EBLC, format: index_format });
        }
        if last < first {
            return Err(Error::InvalidData);
        }

        Ok(Self {
            first_glyph_index: first,
            last_glyph_index: last,
            index_format,
            image_format: data.read_ushort(2)?,
            image_data_offset: data.read_ulong(4)?,
            data,
        })
    }

    #[allow(missing_docs)]
    pub fn first_glyph_index(&self) -> u16 {
        self.first_glyph_index
    }

    #[allow(missing_docs)]
    pub fn last_glyph_index(&self) -> u16 {
        self.last_glyph_index
    }

    #[allow(missing_docs)]
    pub fn index_format(&self) -> u16 {
        self.index_format
    }

    #[allow(missing_docs)]
    pub fn image_format(&self) -> u16 {
        self.image_format
    }

    /// The offset all glyph offsets are relative to.
    pub fn image_data_offset(&self) -> u32 {
        self.image_data_offset
    }

    /// The location of `glyph`, or `None` if this subtable has no bitmap
    /// for it.
    pub fn glyph_location(&self, glyph: u16) -> Result<Option<BitmapGlyphInfo>> {
        if glyph < self.first_glyph_index || glyph > self.last_glyph_index {
            return Ok(None);
        }

        let index = usize::from(glyph - self.first_glyph_index);
        let location = match self.index_format {
            1 => {
                let start = self.data.read_ulong(HEADER_SIZE + index * 4)?;
                let end = self.data.read_ulong(HEADER_SIZE + (index + 1) * 4)?;
                Some((start, end))
            }
            3 => {
                let start = self.data.read_ushort(HEADER_SIZE + index * 2)?;
                let end = self.data.read_ushort(HEADER_SIZE + (index + 1) * 2)?;
                Some((u32::from(start), u32::from(end)))
            }
            2 => {
                let size = self.data.read_ulong(HEADER_SIZE)?;
                Some(fixed_size_range(index, size)?)
            }
            4 => self.search_pairs(glyph)?,
            5 => {
                let size = self.data.read_ulong(HEADER_SIZE)?;
                let count_offset = HEADER_SIZE + 4 + BIG_METRICS_SIZE;
                let count = self.data.read_ulong(count_offset)? as usize;
                let mut position = None;
                for i in 0..count {
                    if self.data.read_ushort(count_offset + 4 + i * 2)? == glyph {
                        position = Some(i);
                        break;
                    }
                }
                position.map(|i| fixed_size_range(i, size)).transpose()?
            }
            format => return Err(Error::UnsupportedFormat { tag: Tag::EBLC, format }),
        };

        let Some((start, end)) = location else { return Ok(None) };
        let length = end.checked_sub(start).ok_or(Error::InvalidData)?;
        if length == 0 {
            return Ok(None);
        }

        Ok(Some(BitmapGlyphInfo {
            glyph_id: glyph,
            offset: self.image_data_offset.checked_add(start).ok_or(Error::ArithmeticOverflow)?,
            length,
            format: self.image_format,
        }))
    }

    /// Format 4 stores `numGlyphs + 1` sorted (glyph id, offset) pairs.
    fn search_pairs(&self, glyph: u16) -> Result<Option<(u32, u32)>> {
        let count = self.data.read_ulong(HEADER_SIZE)? as usize;
        let pairs = HEADER_SIZE + 4;

        let (mut low, mut high) = (0, count);
        while low < high {
            let mid = (low + high) / 2;
            let id = self.data.read_ushort(pairs + mid * 4)?;
            if id < glyph {
                low = mid + 1;
            } else if id > glyph {
                high = mid;
            } else {
                let start = self.data.read_ushort(pairs + mid * 4 + 2)?;
                let end = self.data.read_ushort(pairs + (mid + 1) * 4 + 2)?;
                return Ok(Some((u32::from(start), u32::from(end))));
            }
        }

        Ok(None)
    }
}

fn fixed_size_range(index: usize, size: u32) -> Result<(u32, u32)> {
    let index = u32::try_from(index).map_err(|_| Error::ArithmeticOverflow)?;
    let start = index.checked_mul(size).ok_or(Error::ArithmeticOverflow)?;
    let end = start.checked_add(size).ok_or(Error::ArithmeticOverflow)?;
    Ok((start, end))
}
