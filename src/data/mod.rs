//! Byte storage and the bounded views that tables read from and builders
//! write into.

mod byte_array;
mod font_data;

use std::cell::RefCell;
use std::rc::Rc;

pub use self::byte_array::{
    ByteArray, GrowableMemoryByteArray, MemoryByteArray, COPY_BUFFER_SIZE,
};
pub use self::font_data::{FontData, ReadableFontData, SharedByteArray, WritableFontData};

use crate::{Error, Result};

/// Allocates the storage behind every view.
///
/// Builders never allocate bytes themselves. They ask the factory they were
/// created with, which makes it possible to swap in pooled or instrumented
/// storage.
pub trait StorageFactory {
    /// Storage with a fixed capacity.
    fn new_fixed_storage(&self, capacity: usize) -> SharedByteArray;

    /// Storage that grows as it is written to.
    fn new_growable_storage(&self, initial_capacity: usize) -> SharedByteArray;

    /// A writable view over fresh fixed storage.
    fn new_fixed_data(&self, capacity: usize) -> WritableFontData {
        WritableFontData::new(self.new_fixed_storage(capacity))
    }

    /// A writable view over fresh growable storage.
    fn new_growable_data(&self, initial_capacity: usize) -> WritableFontData {
        WritableFontData::new(self.new_growable_storage(initial_capacity))
    }

    /// A writable copy of `src` in fresh fixed storage.
    fn new_data_from(&self, src: &ReadableFontData) -> Result<WritableFontData> {
        let data = self.new_fixed_data(src.length());
        src.copy_to(&data)?;
        Ok(data)
    }

    /// A writable copy of raw bytes in fresh fixed storage.
    fn wrap_bytes(&self, bytes: &[u8]) -> Result<WritableFontData> {
        let data = self.new_fixed_data(bytes.len());
        if data.write_bytes(0, bytes)? != bytes.len() {
            return Err(Error::OutOfBounds);
        }
        Ok(data)
    }
}

/// The default factory, backed by heap memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryStorage;

impl StorageFactory for MemoryStorage {
    fn new_fixed_storage(&self, capacity: usize) -> SharedByteArray {
        Rc::new(RefCell::new(MemoryByteArray::new(capacity)))
    }

    fn new_growable_storage(&self, initial_capacity: usize) -> SharedByteArray {
        Rc::new(RefCell::new(GrowableMemoryByteArray::new(initial_capacity)))
    }

    fn wrap_bytes(&self, bytes: &[u8]) -> Result<WritableFontData> {
        let array = MemoryByteArray::from_vec(bytes.to_vec());
        Ok(WritableFontData::new(Rc::new(RefCell::new(array))))
    }
}
