//! Glyph subsetting.
//!
//! A [`Subsetter`] takes a font and a list of old glyph ids in their new
//! order, and produces a [`FontBuilder`] whose glyph `n` is the old glyph
//! `glyphs[n]`. Table subsetters rewrite the tables that depend on glyph
//! ids, every other table is copied through unless it was asked to be
//! removed.
//!
//! Composite glyphs keep referring to old glyph ids. Use
//! [`composite_closure`] to pull their components into the glyph list and
//! keep the identity mapping for them if that matters.

mod glyf;
mod hmtx;

pub use self::glyf::{composite_closure, GlyphTableSubsetter};
pub use self::hmtx::HorizontalMetricsSubsetter;

use rustc_hash::FxHashSet;

use crate::factory::FontFactory;
use crate::font::{Font, FontBuilder};
use crate::table::FontDataTable;
use crate::{Result, Tag};

/// Rewrites a group of tables for a glyph subset.
pub trait TableSubsetter {
    /// The tables this subsetter writes. Once it reports success they are
    /// not copied through.
    fn tags_handled(&self) -> &'static [Tag];

    /// Write the subset tables into `builder`. Returns `false` if nothing
    /// was done and the tables should be copied through instead.
    fn subset(&self, subsetter: &Subsetter, font: &Font, builder: &mut FontBuilder)
        -> Result<bool>;
}

/// Builds a new font from some of the glyphs and tables of another.
pub struct Subsetter<'a> {
    font: &'a Font,
    factory: &'a FontFactory,
    glyphs: Vec<u16>,
    remove_tables: FxHashSet<Tag>,
    table_subsetters: Vec<Box<dyn TableSubsetter>>,
}

impl<'a> Subsetter<'a> {
    /// A subsetter with the glyph outline and horizontal metrics subsetters.
    pub fn new(font: &'a Font, factory: &'a FontFactory) -> Self {
        Self {
            font,
            factory,
            glyphs: vec![],
            remove_tables: FxHashSet::default(),
            table_subsetters: vec![
                Box::new(GlyphTableSubsetter),
                Box::new(HorizontalMetricsSubsetter),
            ],
        }
    }

    /// Set the old glyph ids, in the order they should have in the subset.
    /// Without any glyphs, glyph dependent tables are copied through.
    pub fn set_glyphs(&mut self, glyphs: &[u16]) {
        self.glyphs = glyphs.to_vec();
    }

    /// The old glyph id for every new glyph id.
    pub fn glyph_permutation_table(&self) -> &[u16] {
        &self.glyphs
    }

    /// Tables to leave out of the subset.
    pub fn set_remove_tables(&mut self, tags: &[Tag]) {
        self.remove_tables = tags.iter().copied().collect();
    }

    /// Whether the subset will drop `tag`.
    pub fn removes(&self, tag: Tag) -> bool {
        self.remove_tables.contains(&tag)
    }

    /// Add a table subsetter. It runs after the ones already present.
    pub fn add_table_subsetter(&mut self, subsetter: Box<dyn TableSubsetter>) {
        self.table_subsetters.push(subsetter);
    }

    /// Produce the subset font builder.
    pub fn subset(self) -> Result<FontBuilder> {
        let mut builder = self.factory.new_font_builder();
        builder.set_sfnt_version(self.font.sfnt_version());

        let mut remaining: Vec<Tag> = self
            .font
            .tables()
            .map(|table| table.header_tag())
            .filter(|&tag| !self.removes(tag))
            .collect();

        for table_subsetter in &self.table_subsetters {
            let handled = table_subsetter.tags_handled();
            if handled.iter().all(|&tag| self.removes(tag)) {
                continue;
            }

            if table_subsetter.subset(&self, self.font, &mut builder)? {
                remaining.retain(|tag| !handled.contains(tag));
                for &tag in handled.iter().filter(|&&tag| self.removes(tag)) {
                    builder.remove_table_builder(tag);
                }
            }
        }

        for tag in remaining {
            if let Some(table) = self.font.table(tag) {
                log::trace!("copying {tag} table into subset");
                builder.new_table_builder_with_data(tag, table.read_font_data())?;
            }
        }

        log::debug!(
            "subset {} glyphs into font with {} tables",
            self.glyphs.len(),
            builder.table_builder_count()
        );
        Ok(builder)
    }
}
