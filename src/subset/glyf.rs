use rustc_hash::FxHashSet;

use super::{Subsetter, TableSubsetter};
use crate::font::{Font, FontBuilder};
use crate::glyf::{GlyphTable, GlyphType};
use crate::loca::LocaTable;
use crate::table::Table;
use crate::{Error, Result, Tag};

/// Copies the outlines of the selected glyphs into a new `glyf` table and
/// writes a matching `loca` table.
///
/// Glyph records are copied byte for byte.
#[derive(Debug, Default, Copy, Clone)]
pub struct GlyphTableSubsetter;

impl TableSubsetter for GlyphTableSubsetter {
    fn tags_handled(&self) -> &'static [Tag] {
        &[Tag::GLYF, Tag::LOCA]
    }

    fn subset(
        &self,
        subsetter: &Subsetter,
        font: &Font,
        builder: &mut FontBuilder,
    ) -> Result<bool> {
        let glyphs = subsetter.glyph_permutation_table();
        if glyphs.is_empty() {
            return Ok(false);
        }

        // Only TrueType outlines can be subset.
        let (glyf, loca) = outline_tables(font)?;

        let glyf_builder = builder
            .new_table_builder(Tag::GLYF)
            .as_glyf_mut()
            .ok_or(Error::Assembly(Tag::GLYF))?;

        let mut glyph_builders = Vec::with_capacity(glyphs.len());
        for &old in glyphs {
            let offset = loca.glyph_offset(old)?;
            let length = loca.glyph_length(old)?;
            let data = glyf.glyph_data(offset, length)?;
            glyph_builders.push(glyf_builder.glyph_builder(&data)?);
        }
        glyf_builder.set_glyph_builders(glyph_builders);
        let loca_list = glyf_builder.generate_loca_list()?;

        if subsetter.removes(Tag::GLYF) {
            builder.remove_table_builder(Tag::GLYF);
        }

        if !subsetter.removes(Tag::LOCA) {
            builder
                .new_table_builder(Tag::LOCA)
                .as_loca_mut()
                .ok_or(Error::Assembly(Tag::LOCA))?
                .set_loca_list(loca_list);
        }

        Ok(true)
    }
}

fn outline_tables(font: &Font) -> Result<(&GlyphTable, &LocaTable)> {
    let glyf = font
        .table(Tag::GLYF)
        .and_then(Table::as_glyf)
        .ok_or(Error::MissingTable(Tag::GLYF))?;
    let loca = font
        .table(Tag::LOCA)
        .and_then(Table::as_loca)
        .ok_or(Error::MissingTable(Tag::LOCA))?;
    Ok((glyf, loca))
}

/// Extend a glyph list with every glyph that the composite glyphs in it
/// refer to, directly or through other composites.
///
/// The given glyphs keep their order. Discovered components are appended
/// in the order they are found. Fonts without `glyf` outlines are returned
/// unchanged.
pub fn composite_closure(font: &Font, glyphs: &[u16]) -> Result<Vec<u16>> {
    if !font.has_table(Tag::GLYF) {
        return Ok(glyphs.to_vec());
    }

    let (glyf, loca) = outline_tables(font)?;
    let mut seen: FxHashSet<u16> = glyphs.iter().copied().collect();
    let mut closure = glyphs.to_vec();

    // The list grows while it is walked.
    let mut i = 0;
    while let Some(&glyph) = closure.get(i) {
        i += 1;

        let length = loca.glyph_length(glyph)?;
        if length == 0 {
            continue;
        }

        let record = glyf.glyph(loca.glyph_offset(glyph)?, length)?;
        if record.glyph_type() != GlyphType::Composite {
            continue;
        }

        for component in record.component_glyph_ids()? {
            if seen.insert(component) {
                closure.push(component);
            }
        }
    }

    if closure.len() > glyphs.len() {
        log::debug!("closure added {} component glyphs", closure.len() - glyphs.len());
    }
    Ok(closure)
}
