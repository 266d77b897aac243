use std::cell::{Cell, RefCell};
use std::io::{Read, Write};
use std::ops::Deref;
use std::rc::Rc;

use super::byte_array::ByteArray;
use crate::stream::{Fixed, Readable, Writeable, MAX_SIZE, U24};
use crate::{checksum, Error, Result, Tag};

/// Byte storage shared by every view that points into it.
pub type SharedByteArray = Rc<RefCell<dyn ByteArray>>;

/// A bounded window into shared byte storage.
///
/// All indices are relative to the window. Slicing narrows the window but
/// keeps pointing at the same storage, so nothing is copied.
#[derive(Clone)]
pub struct FontData {
    array: SharedByteArray,
    bound_offset: usize,
    /// `None` means the window extends to the end of the storage.
    bound_length: Option<usize>,
}

impl FontData {
    fn new(array: SharedByteArray) -> Self {
        Self { array, bound_offset: 0, bound_length: None }
    }

    /// The number of readable bytes in the window.
    pub fn length(&self) -> usize {
        let filled = self.array.borrow().length().saturating_sub(self.bound_offset);
        match self.bound_length {
            Some(len) => len.min(filled),
            None => filled,
        }
    }

    /// The number of bytes the window may hold.
    pub fn size(&self) -> usize {
        match self.bound_length {
            Some(len) => len,
            None => self.array.borrow().size().saturating_sub(self.bound_offset),
        }
    }

    /// Whether both views point into the same storage.
    pub fn shares_storage(&self, other: &FontData) -> bool {
        Rc::ptr_eq(&self.array, &other.array)
    }

    fn bound(&self, offset: usize, length: Option<usize>) -> Option<Self> {
        let size = self.size();
        let bound_length = match length {
            Some(len) => {
                if offset.checked_add(len)? > size {
                    return None;
                }
                Some(len)
            }
            None => {
                if offset > size {
                    return None;
                }
                self.bound_length.map(|len| len - offset)
            }
        };

        Some(Self {
            array: self.array.clone(),
            bound_offset: self.bound_offset + offset,
            bound_length,
        })
    }

    fn get_bytes(&self, index: usize, dst: &mut [u8]) -> Result<usize> {
        let length = self.length();
        if index >= length {
            return if dst.is_empty() && index == length {
                Ok(0)
            } else {
                Err(Error::OutOfBounds)
            };
        }

        let count = dst.len().min(length - index);
        self.array.borrow().get_bytes(self.bound_offset + index, &mut dst[..count])
    }

    fn put_bytes(&self, index: usize, src: &[u8]) -> Result<usize> {
        let size = self.size();
        if index >= size {
            return Err(Error::OutOfBounds);
        }

        let count = src.len().min(size - index);
        self.array.borrow_mut().put_bytes(self.bound_offset + index, &src[..count])
    }
}

/// A read-only view with typed big-endian accessors and a memoized
/// OpenType checksum.
///
/// The checksum memo is a plain [`Cell`]. Views are single threaded.
#[derive(Clone)]
pub struct ReadableFontData {
    data: FontData,
    checksum: Cell<Option<u32>>,
    checksum_ranges: Vec<usize>,
}

impl ReadableFontData {
    /// Create a view over the whole storage.
    pub fn new(array: SharedByteArray) -> Self {
        Self::from_data(FontData::new(array))
    }

    fn from_data(data: FontData) -> Self {
        Self { data, checksum: Cell::new(None), checksum_ranges: vec![] }
    }

    /// The number of readable bytes.
    pub fn length(&self) -> usize {
        self.data.length()
    }

    /// The number of bytes the view may hold.
    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Whether both views point into the same storage.
    pub fn shares_storage(&self, other: &ReadableFontData) -> bool {
        self.data.shares_storage(&other.data)
    }

    /// A view of `length` bytes starting at `offset`, or `None` if that
    /// window does not fit.
    pub fn slice(&self, offset: usize, length: usize) -> Option<ReadableFontData> {
        self.data.bound(offset, Some(length)).map(Self::from_data)
    }

    /// A view from `offset` to the end of this one.
    pub fn slice_from(&self, offset: usize) -> Option<ReadableFontData> {
        self.data.bound(offset, None).map(Self::from_data)
    }

    /// Read a big-endian value at `index`.
    pub fn read<T: Readable>(&self, index: usize) -> Result<T> {
        let mut buf = [0; MAX_SIZE];
        let bytes = &mut buf[..T::SIZE];
        if index.checked_add(T::SIZE).ok_or(Error::OutOfBounds)? > self.length() {
            return Err(Error::OutOfBounds);
        }
        self.data.get_bytes(index, bytes)?;
        Ok(T::read(bytes))
    }

    /// Read up to `dst.len()` bytes. Short reads at the end are a success.
    pub fn read_bytes(&self, index: usize, dst: &mut [u8]) -> Result<usize> {
        self.data.get_bytes(index, dst)
    }

    /// Copy `length` bytes at `index` into a vector.
    pub fn read_vec(&self, index: usize, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; length];
        if length > 0 && self.read_bytes(index, &mut buf)? != length {
            return Err(Error::OutOfBounds);
        }
        Ok(buf)
    }

    /// Copy the whole view into a vector.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.read_vec(0, self.length())
    }

    #[allow(missing_docs)]
    pub fn read_ubyte(&self, index: usize) -> Result<u8> {
        self.read::<u8>(index)
    }

    #[allow(missing_docs)]
    pub fn read_byte(&self, index: usize) -> Result<i8> {
        self.read::<i8>(index)
    }

    #[allow(missing_docs)]
    pub fn read_ushort(&self, index: usize) -> Result<u16> {
        self.read::<u16>(index)
    }

    #[allow(missing_docs)]
    pub fn read_short(&self, index: usize) -> Result<i16> {
        self.read::<i16>(index)
    }

    #[allow(missing_docs)]
    pub fn read_uint24(&self, index: usize) -> Result<u32> {
        self.read::<U24>(index).map(|v| v.0)
    }

    #[allow(missing_docs)]
    pub fn read_ulong(&self, index: usize) -> Result<u32> {
        self.read::<u32>(index)
    }

    #[allow(missing_docs)]
    pub fn read_long(&self, index: usize) -> Result<i32> {
        self.read::<i32>(index)
    }

    /// Read an unsigned 32-bit value that must fit into an `i32`.
    pub fn read_ulong_as_int(&self, index: usize) -> Result<i32> {
        let value = self.read_ulong(index)?;
        i32::try_from(value).map_err(|_| Error::ArithmeticOverflow)
    }

    /// Read a 16.16 fixed-point value.
    pub fn read_fixed(&self, index: usize) -> Result<Fixed> {
        self.read::<Fixed>(index)
    }

    /// Read a `LONGDATETIME`, i.e. two 32-bit words.
    pub fn read_date_time_as_long(&self, index: usize) -> Result<i64> {
        let high = i64::from(self.read_ulong(index)?);
        let low = i64::from(self.read_ulong(index + 4)?);
        Ok(high << 32 | low)
    }

    /// Read a signed value in font design units.
    pub fn read_fword(&self, index: usize) -> Result<i16> {
        self.read_short(index)
    }

    /// Read an unsigned value in font design units.
    pub fn read_fufword(&self, index: usize) -> Result<u16> {
        self.read_ushort(index)
    }

    #[allow(missing_docs)]
    pub fn read_tag(&self, index: usize) -> Result<Tag> {
        self.read::<Tag>(index)
    }

    /// The checksum over the checksum ranges, or the whole view if none
    /// are set. Computed once and then cached.
    pub fn checksum(&self) -> u32 {
        if let Some(sum) = self.checksum.get() {
            return sum;
        }

        let sum = self.compute_checksum();
        self.checksum.set(Some(sum));
        sum
    }

    /// Restrict the checksum to `[low, high)` pairs. An odd trailing entry
    /// runs to the end of the data.
    pub fn set_checksum_ranges(&mut self, ranges: &[usize]) {
        self.checksum_ranges = ranges.to_vec();
        self.checksum.set(None);
    }

    /// The current checksum ranges.
    pub fn checksum_ranges(&self) -> &[usize] {
        &self.checksum_ranges
    }

    fn compute_checksum(&self) -> u32 {
        let length = self.length();
        let mut sum = 0u32;
        let mut add = |low: usize, high: usize| {
            let high = high.min(length);
            if low < high {
                // The range lies within the filled bytes.
                if let Ok(bytes) = self.read_vec(low, high - low) {
                    sum = sum.wrapping_add(checksum(&bytes));
                }
            }
        };

        if self.checksum_ranges.is_empty() {
            add(0, length);
        } else {
            for pair in self.checksum_ranges.chunks(2) {
                add(pair[0], pair.get(1).copied().unwrap_or(length));
            }
        }

        sum
    }

    /// Copy the view into `dst` starting at its index 0.
    pub fn copy_to(&self, dst: &WritableFontData) -> Result<usize> {
        let mut buf = [0; super::COPY_BUFFER_SIZE];
        let length = self.length();
        let mut index = 0;
        while index < length {
            let want = buf.len().min(length - index);
            let read = self.read_bytes(index, &mut buf[..want])?;
            if dst.write_bytes(index, &buf[..read])? != read {
                return Err(Error::OutOfBounds);
            }
            index += read;
        }
        Ok(index)
    }

    /// Copy the view into a byte array starting at its index 0.
    pub fn copy_to_array(&self, array: &mut dyn ByteArray) -> Result<usize> {
        self.data.array.borrow().copy_range_to(
            0,
            array,
            self.data.bound_offset,
            self.length(),
        )
    }

    /// Write the view to a sink.
    pub fn copy_to_writer(&self, w: &mut dyn Write) -> Result<usize> {
        self.data.array.borrow().copy_range_to_writer(
            w,
            self.data.bound_offset,
            self.length(),
        )
    }
}

impl std::fmt::Debug for ReadableFontData {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ReadableFontData")
            .field("offset", &self.data.bound_offset)
            .field("length", &self.length())
            .finish()
    }
}

/// A view that can also be written to.
///
/// Writes go straight to the shared storage, so every other view over the
/// same bytes observes them.
#[derive(Clone, Debug)]
pub struct WritableFontData(ReadableFontData);

impl WritableFontData {
    /// Create a view over the whole storage.
    pub fn new(array: SharedByteArray) -> Self {
        Self(ReadableFontData::new(array))
    }

    /// A writable view of `length` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, length: usize) -> Option<WritableFontData> {
        self.0.slice(offset, length).map(Self)
    }

    /// A writable view from `offset` to the end of this one.
    pub fn slice_from(&self, offset: usize) -> Option<WritableFontData> {
        self.0.slice_from(offset).map(Self)
    }

    /// A read-only view over the same bytes.
    pub fn to_readable(&self) -> ReadableFontData {
        ReadableFontData::from_data(self.0.data.clone())
    }

    /// Write a big-endian value at `index`, returning the bytes written.
    pub fn write<T: Writeable>(&self, index: usize, value: T) -> Result<usize> {
        if index.checked_add(T::SIZE).ok_or(Error::OutOfBounds)? > self.size() {
            return Err(Error::OutOfBounds);
        }

        let mut buf = [0; MAX_SIZE];
        let bytes = &mut buf[..T::SIZE];
        value.write(bytes);
        self.write_bytes(index, bytes)
    }

    /// Write as much of `src` as fits at `index`.
    pub fn write_bytes(&self, index: usize, src: &[u8]) -> Result<usize> {
        if src.is_empty() {
            return Ok(0);
        }
        self.0.checksum.set(None);
        self.0.data.put_bytes(index, src)
    }

    /// Write `src` and fill the rest of `length` bytes with `pad`.
    pub fn write_bytes_padded(
        &self,
        index: usize,
        src: &[u8],
        length: usize,
        pad: u8,
    ) -> Result<usize> {
        let count = src.len().min(length);
        let mut written = self.write_bytes(index, &src[..count])?;
        written += self.write_padding(index + written, length - count, pad)?;
        Ok(written)
    }

    /// Write `count` copies of `pad`.
    pub fn write_padding(&self, index: usize, count: usize, pad: u8) -> Result<usize> {
        let mut written = 0;
        while written < count {
            written += self.write::<u8>(index + written, pad)?;
        }
        Ok(written)
    }

    #[allow(missing_docs)]
    pub fn write_ubyte(&self, index: usize, value: u8) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_byte(&self, index: usize, value: i8) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_ushort(&self, index: usize, value: u16) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_short(&self, index: usize, value: i16) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_uint24(&self, index: usize, value: u32) -> Result<usize> {
        self.write(index, U24(value))
    }

    #[allow(missing_docs)]
    pub fn write_ulong(&self, index: usize, value: u32) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_long(&self, index: usize, value: i32) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_fixed(&self, index: usize, value: Fixed) -> Result<usize> {
        self.write(index, value)
    }

    /// Write a `LONGDATETIME`.
    pub fn write_date_time(&self, index: usize, value: i64) -> Result<usize> {
        self.write(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_fword(&self, index: usize, value: i16) -> Result<usize> {
        self.write_short(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_fufword(&self, index: usize, value: u16) -> Result<usize> {
        self.write_ushort(index, value)
    }

    #[allow(missing_docs)]
    pub fn write_tag(&self, index: usize, tag: Tag) -> Result<usize> {
        self.write(index, tag)
    }

    /// Write an unsigned 16-bit value in little-endian order.
    pub fn write_ushort_le(&self, index: usize, value: u16) -> Result<usize> {
        self.write_bytes(index, &value.to_le_bytes())
    }

    /// Write an unsigned 32-bit value in little-endian order.
    pub fn write_ulong_le(&self, index: usize, value: u32) -> Result<usize> {
        self.write_bytes(index, &value.to_le_bytes())
    }

    /// Fill the view with exactly `length` bytes from a source.
    pub fn copy_from(&self, r: &mut dyn Read, length: usize) -> Result<usize> {
        let mut buf = [0; super::COPY_BUFFER_SIZE];
        let mut index = 0;
        while index < length {
            let want = buf.len().min(length - index);
            r.read_exact(&mut buf[..want])?;
            if self.write_bytes(index, &buf[..want])? != want {
                return Err(Error::OutOfBounds);
            }
            index += want;
        }
        Ok(index)
    }
}

impl Deref for WritableFontData {
    type Target = ReadableFontData;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<WritableFontData> for ReadableFontData {
    fn from(data: WritableFontData) -> Self {
        data.0
    }
}
