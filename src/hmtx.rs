//! The `hmtx` table. The first `numberOfHMetrics` glyphs have an advance
//! width and a left side bearing. All later glyphs repeat the last advance
//! width and only store a left side bearing.
//!
//! Neither count is stored in the table itself. They come from `hhea` and
//! `maxp`, and the font builder pushes them in before every build.

use crate::data::ReadableFontData;
use crate::table::{impl_font_data_table, BuilderCore, Header, TableModel};
use crate::{Error, Result, Tag};

const METRIC_SIZE: usize = 4;
const LSB_SIZE: usize = 2;

/// The horizontal metrics.
#[derive(Debug)]
pub struct HmtxTable {
    header: Header,
    data: ReadableFontData,
    num_h_metrics: usize,
    num_glyphs: usize,
}

impl_font_data_table!(HmtxTable);

impl HmtxTable {
    #[allow(missing_docs)]
    pub fn number_of_h_metrics(&self) -> usize {
        self.num_h_metrics
    }

    #[allow(missing_docs)]
    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs
    }

    /// The number of glyphs that only store a left side bearing.
    pub fn number_of_lsbs(&self) -> usize {
        self.num_glyphs.saturating_sub(self.num_h_metrics)
    }

    /// The advance width of the full metric `entry`.
    pub fn h_metric_advance_width(&self, entry: usize) -> Result<u16> {
        if entry >= self.num_h_metrics {
            return Err(Error::OutOfBounds);
        }
        self.data.read_ushort(entry * METRIC_SIZE)
    }

    /// The left side bearing of the full metric `entry`.
    pub fn h_metric_lsb(&self, entry: usize) -> Result<i16> {
        if entry >= self.num_h_metrics {
            return Err(Error::OutOfBounds);
        }
        self.data.read_short(entry * METRIC_SIZE + 2)
    }

    /// The left side bearing `entry` of the trailing array.
    pub fn lsb_table_entry(&self, entry: usize) -> Result<i16> {
        if entry >= self.number_of_lsbs() {
            return Err(Error::OutOfBounds);
        }
        self.data.read_short(self.num_h_metrics * METRIC_SIZE + entry * LSB_SIZE)
    }

    /// The advance width of a glyph.
    pub fn advance_width(&self, glyph: u16) -> Result<u16> {
        let glyph = usize::from(glyph);
        if glyph < self.num_h_metrics {
            self.h_metric_advance_width(glyph)
        } else if glyph >= self.num_glyphs {
            Err(Error::OutOfBounds)
        } else {
            let last = self.num_h_metrics.checked_sub(1).ok_or(Error::OutOfBounds)?;
            self.h_metric_advance_width(last)
        }
    }

    /// The left side bearing of a glyph.
    pub fn left_side_bearing(&self, glyph: u16) -> Result<i16> {
        let glyph = usize::from(glyph);
        if glyph < self.num_h_metrics {
            self.h_metric_lsb(glyph)
        } else {
            self.lsb_table_entry(glyph - self.num_h_metrics)
        }
    }
}

/// Edits the `hmtx` table as bytes.
pub struct HmtxBuilder {
    core: BuilderCore,
    num_h_metrics: Option<usize>,
    num_glyphs: Option<usize>,
}

impl HmtxBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core, num_h_metrics: None, num_glyphs: None }
    }

    /// Set the number of full metrics, from `hhea`.
    pub fn set_number_of_h_metrics(&mut self, num_h_metrics: usize) {
        self.num_h_metrics = Some(num_h_metrics);
    }

    /// Set the number of glyphs, from `maxp`.
    pub fn set_num_glyphs(&mut self, num_glyphs: usize) {
        self.num_glyphs = Some(num_glyphs);
    }
}

impl TableModel for HmtxBuilder {
    type Table = HmtxTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<HmtxTable> {
        let (Some(num_h_metrics), Some(num_glyphs)) = (self.num_h_metrics, self.num_glyphs)
        else {
            return Err(Error::NotReady(Tag::HMTX));
        };

        Ok(HmtxTable {
            header: self.core.table_header(&data),
            data,
            num_h_metrics,
            num_glyphs,
        })
    }

    fn ready_to_build(&self) -> bool {
        self.num_h_metrics.is_some() && self.num_glyphs.is_some()
    }
}
