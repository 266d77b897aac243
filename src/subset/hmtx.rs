use super::{Subsetter, TableSubsetter};
use crate::data::ReadableFontData;
use crate::font::{Font, FontBuilder};
use crate::hmtx::HmtxTable;
use crate::table::{FontDataTable, Table, TableBuilder};
use crate::{Error, Result, Tag};

/// Writes horizontal metrics for the selected glyphs and updates the glyph
/// counts in `hhea` and `maxp` to match.
///
/// Every glyph of the subset gets a full metric, so the metrics never
/// depend on the position of a glyph in the old font.
#[derive(Debug, Default, Copy, Clone)]
pub struct HorizontalMetricsSubsetter;

impl TableSubsetter for HorizontalMetricsSubsetter {
    fn tags_handled(&self) -> &'static [Tag] {
        &[Tag::HMTX, Tag::HHEA, Tag::MAXP]
    }

    fn subset(
        &self,
        subsetter: &Subsetter,
        font: &Font,
        builder: &mut FontBuilder,
    ) -> Result<bool> {
        let glyphs = subsetter.glyph_permutation_table();
        let Some(hmtx) = font.table(Tag::HMTX).and_then(Table::as_hmtx) else {
            return Ok(false);
        };
        if glyphs.is_empty() {
            return Ok(false);
        }

        let num_glyphs = u16::try_from(glyphs.len()).map_err(|_| Error::InvalidData)?;
        let keep = |tag| font.has_table(tag) && !subsetter.removes(tag);

        if keep(Tag::HMTX) {
            let metrics = long_metrics(builder, hmtx, glyphs)?;
            builder.new_table_builder(Tag::HMTX).set_data(metrics);
        }

        if keep(Tag::HHEA) {
            copy_table(font, builder, Tag::HHEA)?
                .as_hhea_mut()
                .ok_or(Error::Assembly(Tag::HHEA))?
                .set_number_of_h_metrics(num_glyphs)?;
        } else if keep(Tag::HMTX) {
            return Err(Error::MissingTable(Tag::HHEA));
        }

        if keep(Tag::MAXP) {
            copy_table(font, builder, Tag::MAXP)?
                .as_maxp_mut()
                .ok_or(Error::Assembly(Tag::MAXP))?
                .set_num_glyphs(num_glyphs)?;
        }

        Ok(true)
    }
}

/// One advance width and left side bearing per new glyph.
fn long_metrics(
    builder: &FontBuilder,
    hmtx: &HmtxTable,
    glyphs: &[u16],
) -> Result<ReadableFontData> {
    let data = builder.storage().new_fixed_data(glyphs.len() * 4);
    let mut offset = 0;
    for &old in glyphs {
        offset += data.write_ushort(offset, hmtx.advance_width(old)?)?;
        offset += data.write_short(offset, hmtx.left_side_bearing(old)?)?;
    }
    Ok(data.into())
}

fn copy_table<'a>(
    font: &Font,
    builder: &'a mut FontBuilder,
    tag: Tag,
) -> Result<&'a mut TableBuilder> {
    let table = font.table(tag).ok_or(Error::MissingTable(tag))?;
    builder.new_table_builder_with_data(tag, table.read_font_data())
}
