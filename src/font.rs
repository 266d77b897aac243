//! Whole fonts: the immutable [`Font`] and the editable [`FontBuilder`].
//!
//! A builder holds one table builder per tag. Some tables cannot be read
//! without values from others (`loca` needs the glyph count from `maxp` and
//! the offset format from `head`, `hmtx` needs counts from `hhea` and
//! `maxp`). The font builder pushes these values in after loading and again
//! before every build.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::rc::Rc;

use crate::data::{ReadableFontData, StorageFactory, COPY_BUFFER_SIZE};
use crate::head::{HeadTable, CHECKSUM_ADJUSTMENT_BASE};
use crate::loca::IndexToLocFormat;
use crate::stream::{FontInputStream, FontOutputStream};
use crate::table::{FontDataTable, Header, Table, TableBuilder};
use crate::{checksum, round4, Error, Result, Tag};

/// The version of fonts with TrueType outlines.
pub const SFNT_VERSION_TRUE_TYPE: u32 = 0x0001_0000;

/// The version of fonts with CFF outlines (`OTTO`).
pub const SFNT_VERSION_CFF: u32 = 0x4F54_544F;

/// The size of the offset table that precedes the table records.
pub const OFFSET_TABLE_SIZE: usize = 12;

/// Recommended table order for fonts with CFF outlines.
pub const CFF_TABLE_ORDERING: &[Tag] = &[
    Tag::HEAD,
    Tag::HHEA,
    Tag::MAXP,
    Tag::OS2,
    Tag::NAME,
    Tag::CMAP,
    Tag::POST,
    Tag::CFF,
];

/// Recommended table order for fonts with TrueType outlines.
pub const TRUE_TYPE_TABLE_ORDERING: &[Tag] = &[
    Tag::HEAD,
    Tag::HHEA,
    Tag::MAXP,
    Tag::OS2,
    Tag::HMTX,
    Tag::LTSH,
    Tag::VDMX,
    Tag::HDMX,
    Tag::CMAP,
    Tag::FPGM,
    Tag::PREP,
    Tag::CVT,
    Tag::LOCA,
    Tag::GLYF,
    Tag::KERN,
    Tag::NAME,
    Tag::POST,
    Tag::GASP,
    Tag::PCLT,
    Tag::DSIG,
];

/// The order used when the caller does not ask for one.
pub fn default_table_ordering(has_cff: bool) -> &'static [Tag] {
    if has_cff {
        CFF_TABLE_ORDERING
    } else {
        TRUE_TYPE_TABLE_ORDERING
    }
}

/// The `searchRange`, `entrySelector` and `rangeShift` fields of the offset
/// table.
pub fn search_fields(num_tables: u16) -> (u16, u16, u16) {
    let entry_selector = num_tables.checked_ilog2().unwrap_or(0) as u16;
    let search_range = (1u16 << entry_selector).wrapping_mul(16);
    let range_shift = num_tables.wrapping_mul(16).saturating_sub(search_range);
    (search_range, entry_selector, range_shift)
}

/// An immutable font: a set of tables with unique tags.
#[derive(Debug)]
pub struct Font {
    sfnt_version: u32,
    digest: Option<Vec<u8>>,
    tables: BTreeMap<Tag, Table>,
}

impl Font {
    /// `0x00010000` for TrueType outlines, `OTTO` for CFF outlines.
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    /// The digest the font was loaded with, if any. It is carried through
    /// as opaque bytes.
    pub fn digest(&self) -> Option<&[u8]> {
        self.digest.as_deref()
    }

    #[allow(missing_docs)]
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    #[allow(missing_docs)]
    pub fn has_table(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    #[allow(missing_docs)]
    pub fn table(&self, tag: Tag) -> Option<&Table> {
        self.tables.get(&tag)
    }

    /// All tables in tag order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// The tables keyed by tag.
    pub fn table_map(&self) -> &BTreeMap<Tag, Table> {
        &self.tables
    }

    /// The order in which table data will be written: the tags of
    /// `requested` (or the default order, if it is empty) that the font
    /// has, followed by all remaining tags in tag order.
    pub fn table_ordering(&self, requested: &[Tag]) -> Vec<Tag> {
        let preferred = if requested.is_empty() {
            default_table_ordering(self.has_table(Tag::CFF))
        } else {
            requested
        };

        let mut ordering = Vec::with_capacity(self.tables.len());
        for &tag in preferred {
            if self.has_table(tag) && !ordering.contains(&tag) {
                ordering.push(tag);
            }
        }
        for &tag in self.tables.keys() {
            if !ordering.contains(&tag) {
                ordering.push(tag);
            }
        }
        ordering
    }

    /// Write the font.
    ///
    /// Table data is laid out in [`table_ordering`](Self::table_ordering),
    /// each table padded to four bytes. Table records are sorted by tag,
    /// their checksums are recalculated, and the `head` checksum adjustment
    /// is set so that the whole font sums to `0xB1B0AFBA`.
    pub fn serialize(&self, w: &mut dyn Write, ordering: &[Tag]) -> Result<()> {
        let ordering = self.table_ordering(ordering);
        let num_tables = u16::try_from(ordering.len()).map_err(|_| Error::InvalidData)?;

        let mut records = Vec::with_capacity(ordering.len());
        let mut offset = OFFSET_TABLE_SIZE + ordering.len() * Header::SIZE;
        for &tag in &ordering {
            let table = self.tables.get(&tag).ok_or(Error::Assembly(tag))?;
            let length = table.data_length();
            records.push(Header::from_record(
                tag,
                table.calculated_checksum(),
                u32::try_from(offset).map_err(|_| Error::Assembly(tag))?,
                u32::try_from(length).map_err(|_| Error::Assembly(tag))?,
            ));
            offset += round4(length);
        }

        let (search_range, entry_selector, range_shift) = search_fields(num_tables);
        let mut out = FontOutputStream::new(Vec::with_capacity(offset));
        out.write(self.sfnt_version)?;
        out.write(num_tables)?;
        out.write(search_range)?;
        out.write(entry_selector)?;
        out.write(range_shift)?;

        let mut directory = records.clone();
        directory.sort_by_key(Header::tag);
        for record in directory {
            out.write(record)?;
        }

        for (tag, record) in ordering.iter().zip(&records) {
            let table = &self.tables[tag];
            if out.position() != u64::from(record.offset().unwrap_or(0)) {
                return Err(Error::Assembly(*tag));
            }
            table.serialize(&mut out)?;
            out.align(4)?;
        }

        let mut image = out.close()?;
        if let Some(head) = records.iter().find(|r| r.tag() == Tag::HEAD) {
            set_checksum_adjustment(&mut image, head)?;
        }

        log::debug!("serialized {} tables into {} bytes", records.len(), image.len());
        w.write_all(&image)?;
        Ok(())
    }
}

/// Zero the adjustment field, sum the whole font and store the difference.
fn set_checksum_adjustment(image: &mut [u8], head: &Header) -> Result<()> {
    if (head.length() as usize) < HeadTable::MAGIC_NUMBER_OFFSET {
        return Err(Error::Assembly(Tag::HEAD));
    }

    let start = head.offset().unwrap_or(0) as usize + HeadTable::CHECKSUM_ADJUSTMENT_OFFSET;
    let field = image.get_mut(start..start + 4).ok_or(Error::Assembly(Tag::HEAD))?;
    field.fill(0);

    let adjustment = CHECKSUM_ADJUSTMENT_BASE.wrapping_sub(checksum(image));
    image[start..start + 4].copy_from_slice(&adjustment.to_be_bytes());
    Ok(())
}

/// Edits a font as a map from tag to table builder.
pub struct FontBuilder {
    storage: Rc<dyn StorageFactory>,
    sfnt_version: u32,
    digest: Option<Vec<u8>>,
    builders: BTreeMap<Tag, TableBuilder>,
}

impl FontBuilder {
    /// An empty TrueType font.
    pub fn new(storage: Rc<dyn StorageFactory>) -> Self {
        Self {
            storage,
            sfnt_version: SFNT_VERSION_TRUE_TYPE,
            digest: None,
            builders: BTreeMap::new(),
        }
    }

    /// Read a font from a stream positioned at its offset table.
    ///
    /// Table data is read in offset order. Table offsets are relative to the
    /// start of the stream, and tables must not overlap.
    pub(crate) fn load<R: Read>(
        storage: Rc<dyn StorageFactory>,
        is: &mut FontInputStream<R>,
    ) -> Result<Self> {
        let sfnt_version = is.read_ulong()?;
        let num_tables = is.read_ushort()?;
        // Search range, entry selector and range shift are recomputed when
        // writing.
        is.skip(6)?;

        let mut headers = (0..num_tables)
            .map(|_| is.read::<Header>())
            .collect::<Result<Vec<_>>>()?;
        headers.sort_by(Header::cmp_by_offset);

        let mut blocks = Vec::with_capacity(headers.len());
        for header in headers {
            is.skip_to(u64::from(header.offset().unwrap_or(0)))?;
            let length = header.length() as usize;
            // Storage grows with the bytes actually read, not the declared
            // length.
            let data = storage.new_growable_data(length.min(COPY_BUFFER_SIZE));
            data.copy_from(is, length)?;
            let data = ReadableFontData::from(data)
                .slice(0, length)
                .ok_or(Error::InvalidData)?;
            blocks.push((header, data));
        }

        log::debug!("loaded {} tables from stream", blocks.len());
        Ok(Self::from_blocks(storage, sfnt_version, blocks))
    }

    /// Read a font whose offset table starts at `offset` in `data`. Tables
    /// are slices of `data` and share its storage.
    pub(crate) fn load_from_data(
        storage: Rc<dyn StorageFactory>,
        data: &ReadableFontData,
        offset: usize,
    ) -> Result<Self> {
        let sfnt_version = data.read_ulong(offset)?;
        let num_tables = usize::from(data.read_ushort(offset + 4)?);

        let mut blocks = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let header = data.read::<Header>(offset + OFFSET_TABLE_SIZE + i * Header::SIZE)?;
            let start = header.offset().unwrap_or(0) as usize;
            let table = data.slice(start, header.length() as usize).ok_or_else(|| {
                log::warn!("{} table lies outside of the font data", header.tag());
                Error::InvalidData
            })?;
            blocks.push((header, table));
        }

        log::debug!("loaded {} tables from bytes", blocks.len());
        Ok(Self::from_blocks(storage, sfnt_version, blocks))
    }

    fn from_blocks(
        storage: Rc<dyn StorageFactory>,
        sfnt_version: u32,
        blocks: Vec<(Header, ReadableFontData)>,
    ) -> Self {
        let mut builder = Self::new(storage);
        builder.sfnt_version = sfnt_version;
        for (header, data) in blocks {
            let table = TableBuilder::new(header, Some(data), builder.storage.clone());
            builder.builders.insert(header.tag(), table);
        }
        builder.wire_relations();
        builder
    }

    #[allow(missing_docs)]
    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    #[allow(missing_docs)]
    pub fn set_sfnt_version(&mut self, version: u32) {
        self.sfnt_version = version;
    }

    #[allow(missing_docs)]
    pub fn digest(&self) -> Option<&[u8]> {
        self.digest.as_deref()
    }

    /// Attach an opaque digest that is carried into the built font.
    pub fn set_digest(&mut self, digest: Vec<u8>) {
        self.digest = Some(digest);
    }

    /// The allocator used for new table data.
    pub fn storage(&self) -> &Rc<dyn StorageFactory> {
        &self.storage
    }

    #[allow(missing_docs)]
    pub fn has_table_builder(&self, tag: Tag) -> bool {
        self.builders.contains_key(&tag)
    }

    #[allow(missing_docs)]
    pub fn table_builder(&self, tag: Tag) -> Option<&TableBuilder> {
        self.builders.get(&tag)
    }

    #[allow(missing_docs)]
    pub fn table_builder_mut(&mut self, tag: Tag) -> Option<&mut TableBuilder> {
        self.builders.get_mut(&tag)
    }

    /// All table builders keyed by tag.
    pub fn table_builders(&self) -> &BTreeMap<Tag, TableBuilder> {
        &self.builders
    }

    #[allow(missing_docs)]
    pub fn table_builder_count(&self) -> usize {
        self.builders.len()
    }

    /// Add an empty builder for `tag`, replacing any existing one.
    pub fn new_table_builder(&mut self, tag: Tag) -> &mut TableBuilder {
        let builder = TableBuilder::new(Header::new(tag), None, self.storage.clone());
        self.insert_builder(tag, builder)
    }

    /// Add a builder for `tag` over a private copy of `data`, replacing any
    /// existing one.
    pub fn new_table_builder_with_data(
        &mut self,
        tag: Tag,
        data: &ReadableFontData,
    ) -> Result<&mut TableBuilder> {
        let copy = self.storage.new_data_from(data)?;
        let header = Header::with_length(tag, copy.length() as u32);
        let builder = TableBuilder::new(header, Some(copy.into()), self.storage.clone());
        Ok(self.insert_builder(tag, builder))
    }

    fn insert_builder(&mut self, tag: Tag, mut builder: TableBuilder) -> &mut TableBuilder {
        self.builders.remove(&tag);
        Relations::collect(&self.builders).apply(&mut builder);
        self.builders.entry(tag).or_insert(builder)
    }

    /// Remove the builder for `tag`.
    pub fn remove_table_builder(&mut self, tag: Tag) -> Option<TableBuilder> {
        self.builders.remove(&tag)
    }

    /// Whether every table builder has the inputs it needs.
    pub fn ready_to_build(&mut self) -> bool {
        self.wire_relations();
        self.builders.values().all(TableBuilder::ready_to_build)
    }

    /// Build every table.
    ///
    /// Relations between tables are refreshed first. If any table cannot be
    /// built the whole font fails with [`Error::Assembly`] naming it.
    pub fn build(&mut self) -> Result<Font> {
        self.wire_relations();

        let mut tables = BTreeMap::new();
        for (&tag, builder) in &mut self.builders {
            if !builder.ready_to_build() {
                log::warn!("{tag} table builder is not ready to build");
                return Err(Error::Assembly(tag));
            }

            let table = builder.build().map_err(|err| {
                log::warn!("failed to build {tag} table: {err}");
                Error::Assembly(tag)
            })?;
            tables.insert(tag, table);
        }

        log::debug!("built font with {} tables", tables.len());
        Ok(Font {
            sfnt_version: self.sfnt_version,
            digest: self.digest.clone(),
            tables,
        })
    }

    /// Push values that builders need from other tables into them.
    fn wire_relations(&mut self) {
        let relations = Relations::collect(&self.builders);
        for builder in self.builders.values_mut() {
            relations.apply(builder);
        }
    }
}

/// Values some builders need from other tables. Fields that cannot be read
/// are left out.
#[derive(Debug, Default, Copy, Clone)]
struct Relations {
    num_glyphs: Option<usize>,
    num_h_metrics: Option<usize>,
    loca_format: Option<IndexToLocFormat>,
}

impl Relations {
    fn collect(builders: &BTreeMap<Tag, TableBuilder>) -> Self {
        let num_glyphs = builders
            .get(&Tag::MAXP)
            .and_then(TableBuilder::as_maxp)
            .and_then(|maxp| maxp.num_glyphs().ok())
            .map(usize::from);
        let num_h_metrics = builders
            .get(&Tag::HHEA)
            .and_then(TableBuilder::as_hhea)
            .and_then(|hhea| hhea.number_of_h_metrics().ok())
            .map(usize::from);
        let loca_format = [Tag::HEAD, Tag::BHED]
            .iter()
            .find_map(|tag| builders.get(tag))
            .and_then(TableBuilder::as_head)
            .and_then(|head| head.index_to_loc_format().ok());
        Self { num_glyphs, num_h_metrics, loca_format }
    }

    fn apply(&self, builder: &mut TableBuilder) {
        match builder {
            TableBuilder::Hmtx(hmtx) => {
                if let Some(n) = self.num_glyphs {
                    hmtx.set_num_glyphs(n);
                }
                if let Some(n) = self.num_h_metrics {
                    hmtx.set_number_of_h_metrics(n);
                }
            }
            TableBuilder::Loca(loca) => {
                if let Some(n) = self.num_glyphs {
                    loca.set_num_glyphs(n);
                }
                if let Some(format) = self.loca_format {
                    loca.set_format_version(format);
                }
            }
            _ => {}
        }
    }
}
