//! The `glyf` table holds the glyph descriptions back to back. It has no
//! index of its own, so every glyph is found through `loca`.
//!
//! Glyph records are treated as opaque bytes. The only thing that is read
//! from them is the header and, for composite glyphs, the ids of their
//! components, so that callers can pull referenced glyphs into a subset.

use crate::data::{ReadableFontData, WritableFontData};
use crate::table::{impl_font_data_table, BuilderCore, Header, SerializeSize, TableModel};
use crate::{Error, Result, Tag};

/// The glyph data table.
#[derive(Debug)]
pub struct GlyphTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(GlyphTable);

impl GlyphTable {
    /// The bytes of one glyph record, as located by `loca`.
    pub fn glyph_data(&self, offset: u32, length: u32) -> Result<ReadableFontData> {
        self.data
            .slice(offset as usize, length as usize)
            .ok_or(Error::OutOfBounds)
    }

    /// The glyph record at the given location.
    pub fn glyph(&self, offset: u32, length: u32) -> Result<Glyph> {
        Glyph::new(self.glyph_data(offset, length)?)
    }
}

/// Whether a glyph has outlines or refers to other glyphs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GlyphType {
    /// Outlines, possibly none at all.
    Simple,
    /// Built from other glyphs.
    Composite,
}

/// One component of a composite glyph.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Component {
    /// The component flags.
    pub flags: u16,
    /// The referenced glyph.
    pub glyph_id: u16,
}

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

const ON_CURVE_REPEAT: u8 = 0x08;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

/// A single glyph record.
#[derive(Debug, Clone)]
pub struct Glyph {
    data: ReadableFontData,
    number_of_contours: i16,
}

impl Glyph {
    /// The size of the glyph header.
    pub const HEADER_SIZE: usize = 10;

    /// Wrap the bytes of one glyph record. Empty records are glyphs without
    /// outlines.
    pub fn new(data: ReadableFontData) -> Result<Self> {
        let number_of_contours = match data.length() {
            0 => 0,
            _ => data.read_short(0)?,
        };
        Ok(Self { data, number_of_contours })
    }

    #[allow(missing_docs)]
    pub fn data(&self) -> &ReadableFontData {
        &self.data
    }

    /// Simple for zero or more contours, composite for negative counts.
    pub fn glyph_type(&self) -> GlyphType {
        if self.number_of_contours < 0 {
            GlyphType::Composite
        } else {
            GlyphType::Simple
        }
    }

    #[allow(missing_docs)]
    pub fn number_of_contours(&self) -> i16 {
        self.number_of_contours
    }

    /// The bounding box as `(x_min, y_min, x_max, y_max)`, or `None` for an
    /// empty glyph.
    pub fn bbox(&self) -> Result<Option<(i16, i16, i16, i16)>> {
        if self.data.length() == 0 {
            return Ok(None);
        }

        Ok(Some((
            self.data.read_short(2)?,
            self.data.read_short(4)?,
            self.data.read_short(6)?,
            self.data.read_short(8)?,
        )))
    }

    /// The components of a composite glyph. Simple glyphs have none.
    pub fn components(&self) -> Result<Vec<Component>> {
        let mut components = vec![];
        if self.glyph_type() == GlyphType::Simple {
            return Ok(components);
        }

        self.walk_components(|component| components.push(component))?;
        Ok(components)
    }

    /// The glyph ids referenced by a composite glyph, in record order.
    pub fn component_glyph_ids(&self) -> Result<Vec<u16>> {
        Ok(self.components()?.into_iter().map(|c| c.glyph_id).collect())
    }

    /// The number of outline points of a simple glyph.
    pub fn number_of_points(&self) -> Result<usize> {
        if self.glyph_type() == GlyphType::Composite || self.number_of_contours == 0 {
            return Ok(0);
        }

        let last = Self::HEADER_SIZE + 2 * (self.number_of_contours as usize - 1);
        Ok(usize::from(self.data.read_ushort(last)?) + 1)
    }

    /// The number of bytes the record actually uses. Anything after that is
    /// padding.
    pub fn unpadded_size(&self) -> Result<usize> {
        if self.data.length() == 0 {
            return Ok(0);
        }

        match self.glyph_type() {
            GlyphType::Simple => self.simple_size(),
            GlyphType::Composite => self.walk_components(|_| {}),
        }
    }

    /// Trailing bytes after the glyph description.
    pub fn padding(&self) -> Result<usize> {
        let size = self.unpadded_size()?;
        self.data.length().checked_sub(size).ok_or(Error::InvalidData)
    }

    fn simple_size(&self) -> Result<usize> {
        let contours = self.number_of_contours as usize;
        let mut offset = Self::HEADER_SIZE + 2 * contours;
        let instruction_length = usize::from(self.data.read_ushort(offset)?);
        offset += 2 + instruction_length;

        let num_points = self.number_of_points()?;
        let mut x_size = 0;
        let mut y_size = 0;
        let mut point = 0;
        while point < num_points {
            let flag = self.data.read_ubyte(offset)?;
            offset += 1;

            let mut repeat = 1;
            if flag & ON_CURVE_REPEAT != 0 {
                repeat += usize::from(self.data.read_ubyte(offset)?);
                offset += 1;
            }

            let x = match (flag & X_SHORT_VECTOR != 0, flag & X_IS_SAME_OR_POSITIVE != 0) {
                (true, _) => 1,
                (false, true) => 0,
                (false, false) => 2,
            };
            let y = match (flag & Y_SHORT_VECTOR != 0, flag & Y_IS_SAME_OR_POSITIVE != 0) {
                (true, _) => 1,
                (false, true) => 0,
                (false, false) => 2,
            };

            x_size += x * repeat;
            y_size += y * repeat;
            point += repeat;
        }

        Ok(offset + x_size + y_size)
    }

    /// Visit every component and return the end of the composite record.
    fn walk_components(&self, mut f: impl FnMut(Component)) -> Result<usize> {
        let mut offset = Self::HEADER_SIZE;
        let mut have_instructions = false;
        loop {
            let flags = self.data.read_ushort(offset)?;
            let glyph_id = self.data.read_ushort(offset + 2)?;
            f(Component { flags, glyph_id });
            offset += 4;

            offset += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
            if flags & WE_HAVE_A_SCALE != 0 {
                offset += 2;
            } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
                offset += 4;
            } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
                offset += 8;
            }

            have_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;
            if flags & MORE_COMPONENTS == 0 {
                break;
            }
        }

        if have_instructions {
            let instruction_length = usize::from(self.data.read_ushort(offset)?);
            offset += 2 + instruction_length;
        }

        Ok(offset)
    }
}

/// Holds the bytes of one glyph record for a [`GlyphTableBuilder`].
#[derive(Debug, Clone)]
pub struct GlyphBuilder {
    data: ReadableFontData,
}

impl GlyphBuilder {
    /// Wrap the bytes of a glyph record.
    pub fn new(data: ReadableFontData) -> Self {
        Self { data }
    }

    #[allow(missing_docs)]
    pub fn data(&self) -> &ReadableFontData {
        &self.data
    }

    /// Replace the glyph record.
    pub fn set_data(&mut self, data: ReadableFontData) {
        self.data = data;
    }

    /// Parse the record.
    pub fn glyph(&self) -> Result<Glyph> {
        Glyph::new(self.data.clone())
    }

    /// The number of bytes [`serialize`](Self::serialize) writes. Both the
    /// generated `loca` list and the serialized table use this size.
    pub fn serialized_size(&self) -> SerializeSize {
        SerializeSize::Fixed(self.data.length())
    }

    /// Write the record to the start of `dest`.
    pub fn serialize(&self, dest: &WritableFontData) -> Result<usize> {
        self.data.copy_to(dest)
    }
}

/// Edits the `glyf` table as a list of glyph records.
///
/// The builder needs a `loca` list to split its bytes into glyphs. That
/// list is never taken from the font automatically: push it in with
/// [`set_loca`](Self::set_loca), and after editing glyphs pull a new one out
/// with [`generate_loca_list`](Self::generate_loca_list).
pub struct GlyphTableBuilder {
    core: BuilderCore,
    loca: Option<Vec<u32>>,
    glyph_builders: Option<Vec<GlyphBuilder>>,
}

impl GlyphTableBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core, loca: None, glyph_builders: None }
    }

    /// Set the offsets used to split the loaded bytes into glyphs. Any
    /// parsed glyphs and edits to them are dropped.
    pub fn set_loca(&mut self, loca: Vec<u32>) {
        self.loca = Some(loca);
        self.glyph_builders = None;
        self.core.set_model_changed(false);
    }

    /// The glyph records. Parsing them marks the model as changed.
    pub fn glyph_builders(&mut self) -> Result<&mut Vec<GlyphBuilder>> {
        if self.glyph_builders.is_none() {
            let builders = self.parse()?;
            self.glyph_builders = Some(builders);
            self.set_model_changed();
        }

        self.glyph_builders.as_mut().ok_or(Error::NotReady(Tag::GLYF))
    }

    /// Replace all glyph records.
    pub fn set_glyph_builders(&mut self, builders: Vec<GlyphBuilder>) {
        self.glyph_builders = Some(builders);
        self.set_model_changed();
    }

    /// A glyph builder over a private copy of `data`.
    pub fn glyph_builder(&self, data: &ReadableFontData) -> Result<GlyphBuilder> {
        let copy = self.core.storage().new_data_from(data)?;
        Ok(GlyphBuilder::new(copy.into()))
    }

    /// A fresh `loca` list derived from the current glyph records alone.
    pub fn generate_loca_list(&mut self) -> Result<Vec<u32>> {
        let builders = self.glyph_builders()?;
        let mut loca = Vec::with_capacity(builders.len() + 1);
        let mut total = 0u32;
        loca.push(total);
        for builder in builders.iter() {
            let size = u32::try_from(builder.serialized_size().len())
                .map_err(|_| Error::ArithmeticOverflow)?;
            total = total.checked_add(size).ok_or(Error::ArithmeticOverflow)?;
            loca.push(total);
        }
        Ok(loca)
    }

    /// Drop the parsed glyphs and any edits to them.
    pub fn revert(&mut self) {
        self.glyph_builders = None;
        self.core.set_model_changed(false);
    }

    fn parse(&self) -> Result<Vec<GlyphBuilder>> {
        let Some(data) = self.core.internal_read_data() else {
            return Ok(vec![]);
        };

        let loca = self.loca.as_ref().ok_or(Error::NotReady(Tag::GLYF))?;
        loca.windows(2)
            .map(|pair| {
                let length = pair[1].checked_sub(pair[0]).ok_or(Error::InvalidData)?;
                data.slice(pair[0] as usize, length as usize)
                    .map(GlyphBuilder::new)
                    .ok_or(Error::InvalidData)
            })
            .collect()
    }
}

impl TableModel for GlyphTableBuilder {
    type Table = GlyphTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_data_set(&mut self) {
        self.glyph_builders = None;
    }

    fn sub_data_size_to_serialize(&mut self) -> Result<SerializeSize> {
        Ok(match &self.glyph_builders {
            Some(builders) => builders.iter().map(GlyphBuilder::serialized_size).sum(),
            None => SerializeSize::Fixed(0),
        })
    }

    fn sub_ready_to_serialize(&mut self) -> bool {
        self.glyph_builders.is_some()
    }

    fn sub_serialize(&mut self, dest: &WritableFontData) -> Result<usize> {
        let Some(builders) = &self.glyph_builders else { return Ok(0) };

        let mut offset = 0;
        for builder in builders {
            let target = dest.slice_from(offset).ok_or(Error::OutOfBounds)?;
            let written = builder.serialize(&target)?;
            if written != builder.serialized_size().len() {
                return Err(Error::Assembly(Tag::GLYF));
            }
            offset += written;
        }

        Ok(offset)
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<GlyphTable> {
        Ok(GlyphTable { header: self.core.table_header(&data), data })
    }

    fn ready_to_build(&self) -> bool {
        !self.model_changed() || self.glyph_builders.is_some()
    }
}
