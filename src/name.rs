//! The `name` table: localized strings such as the family name.
//!
//! The builder keeps one [`NameEntryBuilder`] per record, keyed and
//! serialized in (platform, encoding, language, name id) order.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::data::{ReadableFontData, WritableFontData};
use crate::table::{impl_font_data_table, BuilderCore, Header, SerializeSize, TableModel};
use crate::{Error, Result, Tag};

const HEADER_SIZE: usize = 6;
const RECORD_SIZE: usize = 12;

/// Platform ids.
pub mod platform {
    #[allow(missing_docs)]
    pub const UNICODE: u16 = 0;
    #[allow(missing_docs)]
    pub const MACINTOSH: u16 = 1;
    #[allow(missing_docs)]
    pub const WINDOWS: u16 = 3;
}

/// Identifies one name record.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NameEntryId {
    #[allow(missing_docs)]
    pub platform_id: u16,
    #[allow(missing_docs)]
    pub encoding_id: u16,
    #[allow(missing_docs)]
    pub language_id: u16,
    #[allow(missing_docs)]
    pub name_id: u16,
}

impl NameEntryId {
    #[allow(missing_docs)]
    pub fn new(platform_id: u16, encoding_id: u16, language_id: u16, name_id: u16) -> Self {
        Self { platform_id, encoding_id, language_id, name_id }
    }
}

/// A name record together with its string bytes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NameEntry {
    id: NameEntryId,
    bytes: Vec<u8>,
}

impl NameEntry {
    #[allow(missing_docs)]
    pub fn id(&self) -> NameEntryId {
        self.id
    }

    /// The encoded string.
    pub fn name_as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded string, if the encoding is known.
    pub fn name(&self) -> Option<String> {
        decode(self.id, &self.bytes)
    }
}

/// A name record as stored in the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct NameRecord {
    #[allow(missing_docs)]
    pub id: NameEntryId,
    /// Length of the string in bytes.
    pub length: u16,
    /// Offset of the string from the start of string storage.
    pub string_offset: u16,
}

/// The naming table.
#[derive(Debug)]
pub struct NameTable {
    header: Header,
    data: ReadableFontData,
}

impl_font_data_table!(NameTable);

impl NameTable {
    /// 0, or 1 with language tags.
    pub fn format(&self) -> Result<u16> {
        self.data.read_ushort(0)
    }

    /// The number of name records.
    pub fn name_count(&self) -> Result<usize> {
        Ok(usize::from(self.data.read_ushort(2)?))
    }

    fn string_offset(&self) -> Result<usize> {
        Ok(usize::from(self.data.read_ushort(4)?))
    }

    /// The record at `index`.
    pub fn record(&self, index: usize) -> Result<NameRecord> {
        if index >= self.name_count()? {
            return Err(Error::OutOfBounds);
        }

        let offset = HEADER_SIZE + index * RECORD_SIZE;
        let id = NameEntryId::new(
            self.data.read_ushort(offset)?,
            self.data.read_ushort(offset + 2)?,
            self.data.read_ushort(offset + 4)?,
            self.data.read_ushort(offset + 6)?,
        );
        Ok(NameRecord {
            id,
            length: self.data.read_ushort(offset + 8)?,
            string_offset: self.data.read_ushort(offset + 10)?,
        })
    }

    /// The encoded string of the record at `index`.
    pub fn name_as_bytes(&self, index: usize) -> Result<Vec<u8>> {
        let record = self.record(index)?;
        let start = self.string_offset()? + usize::from(record.string_offset);
        self.data.read_vec(start, usize::from(record.length))
    }

    /// The decoded string of the record at `index`, if the encoding is known.
    pub fn name(&self, index: usize) -> Result<Option<String>> {
        Ok(self.name_entry(index)?.name())
    }

    /// The record at `index` with its string.
    pub fn name_entry(&self, index: usize) -> Result<NameEntry> {
        Ok(NameEntry {
            id: self.record(index)?.id,
            bytes: self.name_as_bytes(index)?,
        })
    }

    /// The first record matching `id`.
    pub fn find(&self, id: NameEntryId) -> Result<Option<NameEntry>> {
        for index in 0..self.name_count()? {
            if self.record(index)?.id == id {
                return self.name_entry(index).map(Some);
            }
        }
        Ok(None)
    }

    /// All records with their strings.
    pub fn names(&self) -> Result<Vec<NameEntry>> {
        (0..self.name_count()?).map(|i| self.name_entry(i)).collect()
    }
}

/// Edits the string of one name record.
#[derive(Debug, Clone)]
pub struct NameEntryBuilder {
    entry: NameEntry,
}

impl NameEntryBuilder {
    fn new(id: NameEntryId) -> Self {
        Self { entry: NameEntry { id, bytes: vec![] } }
    }

    /// The current record.
    pub fn entry(&self) -> &NameEntry {
        &self.entry
    }

    /// Encode and store `name` for the record's platform. Macintosh records
    /// are stored as Latin-1 with `?` for characters outside it.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.entry.bytes = encode(self.entry.id, name).ok_or(Error::UnknownKind)?;
        Ok(())
    }

    /// Store already encoded bytes.
    pub fn set_name_bytes(&mut self, bytes: Vec<u8>) {
        self.entry.bytes = bytes;
    }
}

/// Edits the `name` table as a sorted map of records.
pub struct NameBuilder {
    core: BuilderCore,
    entries: Option<BTreeMap<NameEntryId, NameEntryBuilder>>,
}

impl NameBuilder {
    pub(crate) fn new(core: BuilderCore) -> Self {
        Self { core, entries: None }
    }

    /// The record builders. Accessing them marks the model as changed.
    pub fn name_builders(&mut self) -> Result<&mut BTreeMap<NameEntryId, NameEntryBuilder>> {
        if self.entries.is_none() {
            self.entries = Some(self.parse()?);
        }
        self.set_model_changed();
        self.entries.as_mut().ok_or(Error::NotReady(Tag::NAME))
    }

    /// Drop the record builders and any edits to them.
    pub fn revert_names(&mut self) {
        self.entries = None;
        self.core.set_model_changed(false);
    }

    /// The number of records.
    pub fn builder_count(&mut self) -> Result<usize> {
        Ok(self.name_builders()?.len())
    }

    /// Remove all records.
    pub fn clear(&mut self) -> Result<()> {
        self.name_builders()?.clear();
        Ok(())
    }

    /// Whether a record with `id` exists.
    pub fn has(&mut self, id: NameEntryId) -> Result<bool> {
        Ok(self.name_builders()?.contains_key(&id))
    }

    /// The builder for `id`, created empty when missing.
    pub fn name_builder(&mut self, id: NameEntryId) -> Result<&mut NameEntryBuilder> {
        Ok(match self.name_builders()?.entry(id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(NameEntryBuilder::new(id)),
        })
    }

    /// Remove the record with `id`, reporting whether it existed.
    pub fn remove(&mut self, id: NameEntryId) -> Result<bool> {
        Ok(self.name_builders()?.remove(&id).is_some())
    }

    fn parse(&self) -> Result<BTreeMap<NameEntryId, NameEntryBuilder>> {
        let mut entries = BTreeMap::new();
        let Some(data) = self.core.internal_read_data() else {
            return Ok(entries);
        };

        let table = NameTable { header: *self.core.header(), data };
        for entry in table.names()? {
            entries.insert(entry.id, NameEntryBuilder { entry });
        }
        Ok(entries)
    }
}

impl TableModel for NameBuilder {
    type Table = NameTable;

    fn core(&self) -> &BuilderCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut BuilderCore {
        &mut self.core
    }

    fn sub_data_set(&mut self) {
        self.entries = None;
    }

    fn sub_data_size_to_serialize(&mut self) -> Result<SerializeSize> {
        let Some(entries) = self.entries.as_ref().filter(|e| !e.is_empty()) else {
            return Ok(SerializeSize::Fixed(0));
        };

        let strings: usize = entries.values().map(|b| b.entry.bytes.len()).sum();
        Ok(SerializeSize::Fixed(HEADER_SIZE + entries.len() * RECORD_SIZE + strings))
    }

    fn sub_ready_to_serialize(&mut self) -> bool {
        self.entries.as_ref().is_some_and(|e| !e.is_empty())
    }

    fn sub_serialize(&mut self, dest: &WritableFontData) -> Result<usize> {
        let Some(entries) = &self.entries else { return Ok(0) };

        let count = u16::try_from(entries.len()).map_err(|_| Error::ArithmeticOverflow)?;
        let storage_start = HEADER_SIZE + entries.len() * RECORD_SIZE;
        dest.write_ushort(0, 0)?;
        dest.write_ushort(2, count)?;
        dest.write_ushort(4, u16::try_from(storage_start).map_err(|_| Error::ArithmeticOverflow)?)?;

        let mut offset = HEADER_SIZE;
        let mut string_offset = 0;
        for (id, builder) in entries {
            let bytes = &builder.entry.bytes;
            let length = u16::try_from(bytes.len()).map_err(|_| Error::ArithmeticOverflow)?;
            let start = u16::try_from(string_offset).map_err(|_| Error::ArithmeticOverflow)?;

            dest.write_ushort(offset, id.platform_id)?;
            dest.write_ushort(offset + 2, id.encoding_id)?;
            dest.write_ushort(offset + 4, id.language_id)?;
            dest.write_ushort(offset + 6, id.name_id)?;
            dest.write_ushort(offset + 8, length)?;
            dest.write_ushort(offset + 10, start)?;
            offset += RECORD_SIZE;

            if !bytes.is_empty() {
                string_offset += dest.write_bytes(storage_start + string_offset, bytes)?;
            }
        }

        Ok(storage_start + string_offset)
    }

    fn sub_build_table(&mut self, data: ReadableFontData) -> Result<NameTable> {
        Ok(NameTable { header: self.core.table_header(&data), data })
    }
}

fn is_utf16(id: NameEntryId) -> bool {
    id.platform_id == platform::UNICODE || id.platform_id == platform::WINDOWS
}

fn decode(id: NameEntryId, bytes: &[u8]) -> Option<String> {
    if is_utf16(id) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).ok()
    } else if id.platform_id == platform::MACINTOSH {
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    } else {
        None
    }
}

fn encode(id: NameEntryId, name: &str) -> Option<Vec<u8>> {
    if is_utf16(id) {
        Some(name.encode_utf16().flat_map(u16::to_be_bytes).collect())
    } else if id.platform_id == platform::MACINTOSH {
        Some(name.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect())
    } else {
        None
    }
}
