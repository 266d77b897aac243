use std::cmp::Ordering;

use crate::data::ReadableFontData;
use crate::Result;

/// One run of consecutive characters mapped to consecutive glyphs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SequentialMapGroup {
    #[allow(missing_docs)]
    pub start_char_code: u32,
    #[allow(missing_docs)]
    pub end_char_code: u32,
    #[allow(missing_docs)]
    pub start_glyph_id: u32,
}

/// A format 12 subtable: segmented coverage of the full Unicode range.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Format12 {
    pub(super) language: u32,
    groups: Vec<SequentialMapGroup>,
}

impl Format12 {
    pub(super) fn parse(data: &ReadableFontData) -> Result<Self> {
        let language = data.read_ulong(8)?;
        let num_groups = data.read_ulong(12)? as usize;

        let mut groups = Vec::with_capacity(num_groups.min(data.length() / 12));
        for i in 0..num_groups {
            let offset = 16 + i * 12;
            groups.push(SequentialMapGroup {
                start_char_code: data.read_ulong(offset)?,
                end_char_code: data.read_ulong(offset + 4)?,
                start_glyph_id: data.read_ulong(offset + 8)?,
            });
        }

        Ok(Self { language, groups })
    }

    #[allow(missing_docs)]
    pub fn groups(&self) -> &[SequentialMapGroup] {
        &self.groups
    }

    /// The glyph for a code point.
    pub fn glyph_id(&self, code_point: u32) -> Option<u16> {
        let index = self
            .groups
            .binary_search_by(|range| {
                if range.start_char_code > code_point {
                    Ordering::Greater
                } else if range.end_char_code < code_point {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;

        let group = &self.groups[index];
        let id = group
            .start_glyph_id
            .checked_add(code_point)?
            .checked_sub(group.start_char_code)?;
        u16::try_from(id).ok()
    }

    /// Calls `f` for each mapped code point.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for group in &self.groups {
            for code_point in group.start_char_code..=group.end_char_code {
                f(code_point);
            }
        }
    }
}
