use crate::data::ReadableFontData;
use crate::Result;

/// A format 4 subtable: segment mapping to delta values, for the Basic
/// Multilingual Plane.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Format4 {
    pub(super) language: u16,
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: Vec<u8>,
}

impl Format4 {
    pub(super) fn parse(data: &ReadableFontData) -> Result<Self> {
        let length = usize::from(data.read_ushort(2)?);
        let language = data.read_ushort(4)?;
        let seg_count = usize::from(data.read_ushort(6)? / 2);

        let read_u16s = |start: usize| -> Result<Vec<u16>> {
            (0..seg_count).map(|i| data.read_ushort(start + i * 2)).collect()
        };

        let end_codes = read_u16s(14)?;
        // Skip the reserved pad.
        let start_codes = read_u16s(16 + seg_count * 2)?;
        let id_deltas = read_u16s(16 + seg_count * 4)?
            .into_iter()
            .map(|d| d as i16)
            .collect();
        let range_offsets_start = 16 + seg_count * 6;
        let id_range_offsets = read_u16s(range_offsets_start)?;

        // The glyph array holds the range offsets as well, since those
        // offsets are relative to their own position.
        let end = length.min(data.length()).max(range_offsets_start);
        let glyph_id_array = data.read_vec(range_offsets_start, end - range_offsets_start)?;

        Ok(Self {
            language,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }

    /// The number of segments.
    pub fn seg_count(&self) -> usize {
        self.end_codes.len()
    }

    /// The glyph for a code point.
    pub fn glyph_id(&self, code_point: u32) -> Option<u16> {
        // This subtable supports code points only in a u16 range.
        let code_point = u16::try_from(code_point).ok()?;

        let mut start = 0;
        let mut end = self.start_codes.len();
        while end > start {
            let index = (start + end) / 2;
            let end_value = *self.end_codes.get(index)?;
            if end_value < code_point {
                start = index + 1;
                continue;
            }

            let start_value = *self.start_codes.get(index)?;
            if start_value > code_point {
                end = index;
                continue;
            }

            let id_range_offset = *self.id_range_offsets.get(index)?;
            let id_delta = *self.id_deltas.get(index)?;
            if id_range_offset == 0 {
                return Some(code_point.wrapping_add(id_delta as u16));
            } else if id_range_offset == 0xFFFF {
                // Some malformed fonts end with this value.
                return None;
            }

            let pos = index * 2
                + usize::from(id_range_offset)
                + usize::from(code_point - start_value) * 2;
            let bytes = self.glyph_id_array.get(pos..pos + 2)?;
            let glyph = u16::from_be_bytes([bytes[0], bytes[1]]);

            // 0 indicates a missing glyph.
            if glyph == 0 {
                return None;
            }
            return Some(glyph.wrapping_add(id_delta as u16));
        }

        None
    }

    /// Calls `f` for each code point covered by a segment.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for (&start, &end) in self.start_codes.iter().zip(&self.end_codes) {
            // 0xFFFF closes the segment list.
            if start == end && start == 0xFFFF {
                break;
            }

            for code_point in start..=end {
                f(u32::from(code_point));
            }
        }
    }
}
