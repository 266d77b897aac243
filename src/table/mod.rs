//! The read side (tables) and write side (table builders) of every table.
//!
//! A [`Table`] is an immutable header plus a view of its bytes. A
//! [`TableBuilder`] holds either the untouched bytes it was loaded from or
//! a writable copy of them, and tables with a structured model (`loca`,
//! `glyf`, `name`) regenerate their bytes through the [`TableModel`] hooks
//! when the model was edited.

mod generic;
mod header;

use std::io::Write;
use std::ops::Add;
use std::rc::Rc;

pub use self::generic::{GenericTable, GenericTableBuilder};
pub use self::header::Header;

use crate::bitmap::{EbdtBuilder, EbdtTable, EblcBuilder, EblcTable};
use crate::cmap::{CmapBuilder, CmapTable};
use crate::data::{ReadableFontData, StorageFactory, WritableFontData};
use crate::glyf::{GlyphTable, GlyphTableBuilder};
use crate::head::{HeadBuilder, HeadTable};
use crate::hhea::{HheaBuilder, HheaTable};
use crate::hmtx::{HmtxBuilder, HmtxTable};
use crate::loca::{LocaBuilder, LocaTable};
use crate::maxp::{MaxpBuilder, MaxpTable};
use crate::name::{NameBuilder, NameTable};
use crate::os2::{Os2Builder, Os2Table};
use crate::stream::{Readable, Writeable};
use crate::{Error, Result, Tag};

/// Common read access to every table.
pub trait FontDataTable {
    /// The directory record of the table.
    fn header(&self) -> &Header;

    /// The bytes of the table.
    fn read_font_data(&self) -> &ReadableFontData;

    #[allow(missing_docs)]
    fn header_tag(&self) -> Tag {
        self.header().tag()
    }

    #[allow(missing_docs)]
    fn header_offset(&self) -> Option<u32> {
        self.header().offset()
    }

    #[allow(missing_docs)]
    fn header_length(&self) -> u32 {
        self.header().length()
    }

    /// The checksum stored in the directory when the table was read. Use
    /// [`calculated_checksum`](Self::calculated_checksum) to validate data.
    fn header_checksum(&self) -> Option<u32> {
        self.header().checksum()
    }

    /// The checksum of the current bytes.
    fn calculated_checksum(&self) -> u32 {
        self.read_font_data().checksum()
    }

    /// The byte length of the table data.
    fn length(&self) -> usize {
        self.read_font_data().length()
    }

    /// The number of bytes that will be written for the table.
    fn data_length(&self) -> usize {
        self.read_font_data().length()
    }

    /// Trailing padding included in the data, if the table tracks it.
    fn padding(&self) -> Option<usize> {
        None
    }

    /// Write the table bytes, without alignment padding.
    fn serialize(&self, w: &mut dyn Write) -> Result<usize> {
        self.read_font_data().copy_to_writer(w)
    }
}

/// Implements [`FontDataTable`] for a struct with `header` and `data` fields.
macro_rules! impl_font_data_table {
    ($ty:ty) => {
        impl $crate::table::FontDataTable for $ty {
            fn header(&self) -> &$crate::table::Header {
                &self.header
            }

            fn read_font_data(&self) -> &$crate::data::ReadableFontData {
                &self.data
            }
        }
    };
}

pub(crate) use impl_font_data_table;

/// Generates getters on a table and getters plus setters on its builder
/// for fields at fixed offsets.
macro_rules! table_fields {
    ($table:ty, $builder:ty; $($(#[$doc:meta])* $get:ident, $set:ident: $ty:ty = $offset:expr;)*) => {
        impl $table {
            $(
                $(#[$doc])*
                pub fn $get(&self) -> $crate::Result<$ty> {
                    self.data.read::<$ty>($offset)
                }
            )*
        }

        impl $builder {
            $(
                $(#[$doc])*
                pub fn $get(&self) -> $crate::Result<$ty> {
                    self.core.read::<$ty>($offset)
                }

                $(#[$doc])*
                pub fn $set(&mut self, value: $ty) -> $crate::Result<()> {
                    self.core.write::<$ty>($offset, value)
                }
            )*
        }
    };
}

pub(crate) use table_fields;

/// The number of bytes a builder model needs.
///
/// A `Variable` size is a lower bound: some part of the model cannot tell
/// its exact size before it is written, so the bytes go into growable
/// storage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SerializeSize {
    /// The model writes exactly this many bytes.
    Fixed(usize),
    /// The model writes at least this many bytes.
    Variable(usize),
}

impl SerializeSize {
    /// The size in bytes, exact or estimated.
    pub fn len(self) -> usize {
        match self {
            Self::Fixed(n) | Self::Variable(n) => n,
        }
    }

    /// Whether the size is only an estimate.
    pub fn is_variable(self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

impl Add for SerializeSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let len = self.len() + rhs.len();
        if self.is_variable() || rhs.is_variable() {
            Self::Variable(len)
        } else {
            Self::Fixed(len)
        }
    }
}

impl std::iter::Sum for SerializeSize {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::Fixed(0), Add::add)
    }
}

/// State shared by every table builder.
pub struct BuilderCore {
    header: Header,
    rdata: Option<ReadableFontData>,
    wdata: Option<WritableFontData>,
    model_changed: bool,
    data_changed: bool,
    storage: Rc<dyn StorageFactory>,
}

impl BuilderCore {
    /// Create the state for a builder over existing bytes, or over nothing.
    pub fn new(
        header: Header,
        data: Option<ReadableFontData>,
        storage: Rc<dyn StorageFactory>,
    ) -> Self {
        Self {
            header,
            rdata: data,
            wdata: None,
            model_changed: false,
            data_changed: false,
            storage,
        }
    }

    #[allow(missing_docs)]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The header for a table built from `data`. Edited tables take the
    /// length of their new bytes.
    pub fn table_header(&self, data: &ReadableFontData) -> Header {
        let mut header = self.header;
        if self.model_changed || self.data_changed {
            header.set_length(data.length() as u32);
        }
        header
    }

    /// The allocator this builder was created with.
    pub fn storage(&self) -> &Rc<dyn StorageFactory> {
        &self.storage
    }

    /// The current bytes, without copying.
    pub fn internal_read_data(&self) -> Option<ReadableFontData> {
        match &self.wdata {
            Some(data) => Some(data.to_readable()),
            None => self.rdata.clone(),
        }
    }

    /// The current bytes as a private writable copy. The first call copies
    /// the loaded bytes into fresh storage.
    pub fn internal_write_data(&mut self) -> Result<WritableFontData> {
        if let Some(data) = &self.wdata {
            return Ok(data.clone());
        }

        let data = match self.rdata.take() {
            Some(src) => self.storage.new_data_from(&src)?,
            None => self.storage.new_growable_data(0),
        };
        self.wdata = Some(data.clone());
        Ok(data)
    }

    /// Read a field from the current bytes.
    pub fn read<T: Readable>(&self, index: usize) -> Result<T> {
        self.internal_read_data().ok_or(Error::OutOfBounds)?.read::<T>(index)
    }

    /// Write a field into the private copy of the bytes.
    pub fn write<T: Writeable>(&mut self, index: usize, value: T) -> Result<()> {
        self.internal_write_data()?.write(index, value).map(|_| ())
    }

    /// Mark the bytes as edited in place.
    pub fn set_data_changed(&mut self) {
        self.data_changed = true;
    }

    /// Mark the structured model as edited.
    pub fn set_model_changed(&mut self, changed: bool) {
        self.model_changed = changed;
    }

    fn replace_data(&mut self, data: ReadableFontData) {
        self.rdata = Some(data);
        self.wdata = None;
        self.data_changed = true;
        self.model_changed = false;
    }

    /// After a build the table shares the writable bytes, so the builder
    /// falls back to copy-on-write for later edits.
    fn release_write_data(&mut self) {
        if let Some(data) = self.wdata.take() {
            self.rdata = Some(data.into());
        }
    }

    fn new_serialize_target(&self, size: SerializeSize) -> WritableFontData {
        match size {
            SerializeSize::Fixed(n) => self.storage.new_fixed_data(n),
            SerializeSize::Variable(n) => self.storage.new_growable_data(n),
        }
    }
}

/// The build protocol shared by all table builders.
///
/// Implementors provide access to their [`BuilderCore`], the hooks that
/// write a structured model, and the conversion of finished bytes into a
/// table. Builders without a model keep the default hooks: they never set
/// `model_changed`, so building copies their bytes.
pub trait TableModel {
    /// The table this builder produces.
    type Table: FontDataTable;

    #[allow(missing_docs)]
    fn core(&self) -> &BuilderCore;

    #[allow(missing_docs)]
    fn core_mut(&mut self) -> &mut BuilderCore;

    /// Drop any cached model after the bytes were replaced.
    fn sub_data_set(&mut self) {}

    /// The size the model will serialize to.
    fn sub_data_size_to_serialize(&mut self) -> Result<SerializeSize> {
        Ok(SerializeSize::Fixed(0))
    }

    /// Whether the model is complete enough to serialize.
    fn sub_ready_to_serialize(&mut self) -> bool {
        false
    }

    /// Write the model into `dest`, returning the number of bytes written.
    fn sub_serialize(&mut self, _dest: &WritableFontData) -> Result<usize> {
        Ok(0)
    }

    /// Wrap finished bytes into the table type.
    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<Self::Table>;

    /// Whether `build` can succeed. Builders that depend on values from
    /// other tables return false until those values were pushed in.
    fn ready_to_build(&self) -> bool {
        true
    }

    #[allow(missing_docs)]
    fn header(&self) -> &Header {
        self.core().header()
    }

    #[allow(missing_docs)]
    fn model_changed(&self) -> bool {
        self.core().model_changed
    }

    #[allow(missing_docs)]
    fn data_changed(&self) -> bool {
        self.core().data_changed
    }

    /// Mark the model as edited, so the next build serializes it.
    fn set_model_changed(&mut self) {
        self.core_mut().set_model_changed(true);
    }

    /// Replace the bytes wholesale. Any parsed model is discarded.
    fn set_data(&mut self, data: ReadableFontData) {
        self.core_mut().replace_data(data);
        self.sub_data_set();
    }

    /// A fresh copy of what the builder would produce right now.
    fn data(&mut self) -> Result<WritableFontData> {
        if self.model_changed() {
            return self.serialize_model();
        }

        let core = self.core();
        match core.internal_read_data() {
            Some(src) => core.storage.new_data_from(&src),
            None => Ok(core.storage.new_fixed_data(0)),
        }
    }

    /// Build the table.
    ///
    /// An edited model is serialized into fresh storage first. Otherwise
    /// the current bytes are used as they are.
    fn build(&mut self) -> Result<Self::Table> {
        let data = if self.model_changed() {
            self.serialize_model()?.into()
        } else {
            let core = self.core();
            match core.internal_read_data() {
                Some(data) => data,
                None => core.storage.new_fixed_data(0).into(),
            }
        };

        log::trace!("building {} table from {} bytes", self.header().tag(), data.length());
        let table = self.sub_build_table(data)?;
        self.notify_post_table_build(&table);
        Ok(table)
    }

    /// Refresh the header length from the built table.
    fn notify_post_table_build(&mut self, table: &Self::Table) {
        let core = self.core_mut();
        if core.model_changed || core.data_changed {
            core.header.set_length(table.data_length() as u32);
        }
        core.release_write_data();
    }

    #[doc(hidden)]
    fn serialize_model(&mut self) -> Result<WritableFontData> {
        if !self.sub_ready_to_serialize() {
            return Err(Error::NotReady(self.header().tag()));
        }

        let size = self.sub_data_size_to_serialize()?;
        let data = self.core().new_serialize_target(size);
        self.sub_serialize(&data)?;
        Ok(data)
    }
}

/// Applies `$body` to whichever builder or table a variant holds.
macro_rules! dispatch {
    ($enum:ident, $value:expr, $inner:ident => $body:expr) => {
        match $value {
            $enum::Head($inner) => $body,
            $enum::Hhea($inner) => $body,
            $enum::Hmtx($inner) => $body,
            $enum::Maxp($inner) => $body,
            $enum::Name($inner) => $body,
            $enum::Os2($inner) => $body,
            $enum::Cmap($inner) => $body,
            $enum::Loca($inner) => $body,
            $enum::Glyf($inner) => $body,
            $enum::Eblc($inner) => $body,
            $enum::Ebdt($inner) => $body,
            $enum::Generic($inner) => $body,
        }
    };
}

/// Generates typed accessors for one variant.
macro_rules! accessors {
    ($enum:ident, $variant:ident, $ty:ty, $get:ident, $get_mut:ident) => {
        impl $enum {
            #[allow(missing_docs)]
            pub fn $get(&self) -> Option<&$ty> {
                match self {
                    $enum::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            #[allow(missing_docs)]
            pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                match self {
                    $enum::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

/// An immutable table of any kind.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum Table {
    Head(HeadTable),
    Hhea(HheaTable),
    Hmtx(HmtxTable),
    Maxp(MaxpTable),
    Name(NameTable),
    Os2(Os2Table),
    Cmap(CmapTable),
    Loca(LocaTable),
    Glyf(GlyphTable),
    Eblc(EblcTable),
    Ebdt(EbdtTable),
    Generic(GenericTable),
}

impl FontDataTable for Table {
    fn header(&self) -> &Header {
        dispatch!(Table, self, t => t.header())
    }

    fn read_font_data(&self) -> &ReadableFontData {
        dispatch!(Table, self, t => t.read_font_data())
    }

    fn padding(&self) -> Option<usize> {
        dispatch!(Table, self, t => t.padding())
    }
}

accessors!(Table, Head, HeadTable, as_head, as_head_mut);
accessors!(Table, Hhea, HheaTable, as_hhea, as_hhea_mut);
accessors!(Table, Hmtx, HmtxTable, as_hmtx, as_hmtx_mut);
accessors!(Table, Maxp, MaxpTable, as_maxp, as_maxp_mut);
accessors!(Table, Name, NameTable, as_name, as_name_mut);
accessors!(Table, Os2, Os2Table, as_os2, as_os2_mut);
accessors!(Table, Cmap, CmapTable, as_cmap, as_cmap_mut);
accessors!(Table, Loca, LocaTable, as_loca, as_loca_mut);
accessors!(Table, Glyf, GlyphTable, as_glyf, as_glyf_mut);
accessors!(Table, Eblc, EblcTable, as_eblc, as_eblc_mut);
accessors!(Table, Ebdt, EbdtTable, as_ebdt, as_ebdt_mut);

/// A builder for a table of any kind.
#[allow(missing_docs)]
pub enum TableBuilder {
    Head(HeadBuilder),
    Hhea(HheaBuilder),
    Hmtx(HmtxBuilder),
    Maxp(MaxpBuilder),
    Name(NameBuilder),
    Os2(Os2Builder),
    Cmap(CmapBuilder),
    Loca(LocaBuilder),
    Glyf(GlyphTableBuilder),
    Eblc(EblcBuilder),
    Ebdt(EbdtBuilder),
    Generic(GenericTableBuilder),
}

impl TableBuilder {
    /// Create the builder that handles `header.tag()`.
    ///
    /// Tags without a dedicated builder get a [`GenericTableBuilder`],
    /// which copies the bytes through.
    pub fn new(
        header: Header,
        data: Option<ReadableFontData>,
        storage: Rc<dyn StorageFactory>,
    ) -> Self {
        let core = BuilderCore::new(header, data, storage);
        match header.tag() {
            Tag::HEAD | Tag::BHED => Self::Head(HeadBuilder::new(core)),
            Tag::HHEA => Self::Hhea(HheaBuilder::new(core)),
            Tag::HMTX => Self::Hmtx(HmtxBuilder::new(core)),
            Tag::MAXP => Self::Maxp(MaxpBuilder::new(core)),
            Tag::NAME => Self::Name(NameBuilder::new(core)),
            Tag::OS2 => Self::Os2(Os2Builder::new(core)),
            Tag::CMAP => Self::Cmap(CmapBuilder::new(core)),
            Tag::LOCA => Self::Loca(LocaBuilder::new(core)),
            Tag::GLYF => Self::Glyf(GlyphTableBuilder::new(core)),
            Tag::EBLC | Tag::BLOC => Self::Eblc(EblcBuilder::new(core)),
            Tag::EBDT | Tag::BDAT => Self::Ebdt(EbdtBuilder::new(core)),
            _ => Self::Generic(GenericTableBuilder::new(core)),
        }
    }

    #[allow(missing_docs)]
    pub fn tag(&self) -> Tag {
        self.header().tag()
    }

    #[allow(missing_docs)]
    pub fn header(&self) -> &Header {
        dispatch!(TableBuilder, self, b => b.header())
    }

    #[allow(missing_docs)]
    pub fn model_changed(&self) -> bool {
        dispatch!(TableBuilder, self, b => b.model_changed())
    }

    #[allow(missing_docs)]
    pub fn data_changed(&self) -> bool {
        dispatch!(TableBuilder, self, b => b.data_changed())
    }

    /// Whether the builder has every input it needs.
    pub fn ready_to_build(&self) -> bool {
        dispatch!(TableBuilder, self, b => b.ready_to_build())
    }

    /// Replace the bytes wholesale.
    pub fn set_data(&mut self, data: ReadableFontData) {
        dispatch!(TableBuilder, self, b => b.set_data(data))
    }

    /// A fresh copy of what the builder would produce right now.
    pub fn data(&mut self) -> Result<WritableFontData> {
        dispatch!(TableBuilder, self, b => b.data())
    }

    /// Build the table.
    pub fn build(&mut self) -> Result<Table> {
        Ok(match self {
            Self::Head(b) => Table::Head(b.build()?),
            Self::Hhea(b) => Table::Hhea(b.build()?),
            Self::Hmtx(b) => Table::Hmtx(b.build()?),
            Self::Maxp(b) => Table::Maxp(b.build()?),
            Self::Name(b) => Table::Name(b.build()?),
            Self::Os2(b) => Table::Os2(b.build()?),
            Self::Cmap(b) => Table::Cmap(b.build()?),
            Self::Loca(b) => Table::Loca(b.build()?),
            Self::Glyf(b) => Table::Glyf(b.build()?),
            Self::Eblc(b) => Table::Eblc(b.build()?),
            Self::Ebdt(b) => Table::Ebdt(b.build()?),
            Self::Generic(b) => Table::Generic(b.build()?),
        })
    }
}

accessors!(TableBuilder, Head, HeadBuilder, as_head, as_head_mut);
accessors!(TableBuilder, Hhea, HheaBuilder, as_hhea, as_hhea_mut);
accessors!(TableBuilder, Hmtx, HmtxBuilder, as_hmtx, as_hmtx_mut);
accessors!(TableBuilder, Maxp, MaxpBuilder, as_maxp, as_maxp_mut);
accessors!(TableBuilder, Name, NameBuilder, as_name, as_name_mut);
accessors!(TableBuilder, Os2, Os2Builder, as_os2, as_os2_mut);
accessors!(TableBuilder, Cmap, CmapBuilder, as_cmap, as_cmap_mut);
accessors!(TableBuilder, Loca, LocaBuilder, as_loca, as_loca_mut);
accessors!(TableBuilder, Glyf, GlyphTableBuilder, as_glyf, as_glyf_mut);
accessors!(TableBuilder, Eblc, EblcBuilder, as_eblc, as_eblc_mut);
accessors!(TableBuilder, Ebdt, EbdtBuilder, as_ebdt, as_ebdt_mut);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStorage;

    fn storage() -> Rc<dyn StorageFactory> {
        Rc::new(MemoryStorage)
    }

    #[test]
    fn size_aggregation() {
        let fixed = [SerializeSize::Fixed(4), SerializeSize::Fixed(6)];
        assert_eq!(fixed.into_iter().sum::<SerializeSize>(), SerializeSize::Fixed(10));

        let mixed = [SerializeSize::Fixed(4), SerializeSize::Variable(6), SerializeSize::Fixed(0)];
        let sum: SerializeSize = mixed.into_iter().sum();
        assert_eq!(sum, SerializeSize::Variable(10));
        assert_eq!(sum.len(), 10);
        assert!(sum.is_variable());
    }

    #[test]
    fn unknown_tags_get_a_generic_builder() {
        let data = MemoryStorage.wrap_bytes(b"abcdefg").unwrap().to_readable();
        let builder = TableBuilder::new(Header::new(Tag::DSIG), Some(data), storage());
        assert!(matches!(builder, TableBuilder::Generic(_)));

        let builder = TableBuilder::new(Header::new(Tag::HEAD), None, storage());
        assert!(builder.as_head().is_some());
        assert!(builder.as_glyf().is_none());
    }

    #[test]
    fn clean_builder_builds_verbatim() {
        let data = MemoryStorage.wrap_bytes(b"some table bytes").unwrap().to_readable();
        let header = Header::from_record(Tag::new(b"zzzz"), 0, 64, 16);
        let mut builder = TableBuilder::new(header, Some(data.clone()), storage());
        assert!(!builder.model_changed());
        assert!(!builder.data_changed());

        let table = builder.build().unwrap();
        assert_eq!(table.read_font_data().to_vec().unwrap(), b"some table bytes");
        assert!(table.read_font_data().shares_storage(&data));
        assert_eq!(table.header_length(), 16);
        assert_eq!(table.calculated_checksum(), data.checksum());
    }

    #[test]
    fn set_data_marks_data_changed_and_updates_length() {
        let data = MemoryStorage.wrap_bytes(&[0; 8]).unwrap().to_readable();
        let header = Header::from_record(Tag::new(b"zzzz"), 0, 64, 8);
        let mut builder = TableBuilder::new(header, Some(data), storage());
        builder.set_data(MemoryStorage.wrap_bytes(&[1; 12]).unwrap().to_readable());
        assert!(builder.data_changed());

        let table = builder.build().unwrap();
        assert_eq!(table.length(), 12);
        assert_eq!(table.header_length(), 12);
        assert_eq!(builder.header().length(), 12);
    }

    #[test]
    fn data_is_a_snapshot() {
        let data = MemoryStorage.wrap_bytes(&[1, 2, 3, 4]).unwrap().to_readable();
        let mut builder = TableBuilder::new(Header::new(Tag::new(b"zzzz")), Some(data.clone()), storage());
        let snapshot = builder.data().unwrap();
        snapshot.write_ubyte(0, 9).unwrap();
        assert_eq!(data.read_ubyte(0).unwrap(), 1);
        assert!(!builder.model_changed());
    }
}
