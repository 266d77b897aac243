use std::io::{self, Read, Write};

use crate::{Error, Result};

/// The size of the intermediate buffer used by all bulk copies.
pub const COPY_BUFFER_SIZE: usize = 8192;

/// Byte storage with a filled length and a capacity.
///
/// Implementors provide the raw accessors. The bounds checks and the
/// streaming copies are shared by every storage kind.
pub trait ByteArray {
    /// The number of bytes written so far.
    fn length(&self) -> usize;

    /// The capacity of the storage.
    fn size(&self) -> usize;

    /// Whether the storage resizes itself on writes past its backing buffer.
    fn is_growable(&self) -> bool;

    /// Copy `dst.len()` bytes starting at `index` into `dst`. Bounds have
    /// already been checked.
    fn internal_get(&self, index: usize, dst: &mut [u8]);

    /// Copy `src` into the storage at `index`, returning the number of bytes
    /// written. The start index is known to be below `size()`.
    fn internal_put(&mut self, index: usize, src: &[u8]) -> usize;

    /// Set the filled length. Never exceeds `size()`.
    fn set_filled_length(&mut self, length: usize);

    /// Read the byte at `index`.
    fn get(&self, index: usize) -> Result<u8> {
        let mut b = [0];
        self.get_bytes(index, &mut b)?;
        Ok(b[0])
    }

    /// Read up to `dst.len()` bytes starting at `index`.
    ///
    /// The count is clamped to the filled length, so a short read is a
    /// success. An `index` outside the filled bytes is an error.
    fn get_bytes(&self, index: usize, dst: &mut [u8]) -> Result<usize> {
        if index >= self.length() {
            return Err(Error::OutOfBounds);
        }

        let count = dst.len().min(self.length() - index);
        self.internal_get(index, &mut dst[..count]);
        Ok(count)
    }

    /// Write one byte at `index`, extending the filled length.
    fn put(&mut self, index: usize, b: u8) -> Result<()> {
        self.put_bytes(index, &[b]).map(|_| ())
    }

    /// Write `src` at `index`, clamped to the capacity. Returns the number
    /// of bytes written.
    fn put_bytes(&mut self, index: usize, src: &[u8]) -> Result<usize> {
        if index >= self.size() {
            return Err(Error::OutOfBounds);
        }

        let count = src.len().min(self.size() - index);
        let written = self.internal_put(index, &src[..count]);
        let filled = self.length().max(index + written);
        self.set_filled_length(filled);
        Ok(written)
    }

    /// Copy all filled bytes into the start of `other`.
    fn copy_to(&self, other: &mut dyn ByteArray) -> Result<usize> {
        self.copy_range_to(0, other, 0, self.length())
    }

    /// Copy `length` bytes from `src_offset` into `other` at `dst_offset`.
    fn copy_range_to(
        &self,
        dst_offset: usize,
        other: &mut dyn ByteArray,
        src_offset: usize,
        length: usize,
    ) -> Result<usize> {
        if other.size() < dst_offset + length {
            return Err(Error::OutOfBounds);
        }

        let mut buf = [0; COPY_BUFFER_SIZE];
        let mut index = 0;
        while index < length {
            let want = COPY_BUFFER_SIZE.min(length - index);
            let read = self.get_bytes(src_offset + index, &mut buf[..want])?;
            let written = other.put_bytes(dst_offset + index, &buf[..read])?;
            if written != read {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            index += read;
        }

        Ok(index)
    }

    /// Write all filled bytes to a sink.
    fn copy_to_writer(&self, w: &mut dyn Write) -> Result<usize> {
        self.copy_range_to_writer(w, 0, self.length())
    }

    /// Write `length` bytes starting at `offset` to a sink.
    fn copy_range_to_writer(
        &self,
        w: &mut dyn Write,
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        let mut buf = [0; COPY_BUFFER_SIZE];
        let mut index = 0;
        while index < length {
            let want = COPY_BUFFER_SIZE.min(length - index);
            let read = self.get_bytes(offset + index, &mut buf[..want])?;
            w.write_all(&buf[..read])?;
            index += read;
        }

        Ok(index)
    }

    /// Fill the storage from the start with exactly `length` bytes read
    /// from a source. Running out of input is an error.
    fn copy_from_reader(&mut self, r: &mut dyn Read, length: usize) -> Result<usize> {
        let mut buf = [0; COPY_BUFFER_SIZE];
        let mut index = 0;
        while index < length {
            let want = COPY_BUFFER_SIZE.min(length - index);
            r.read_exact(&mut buf[..want])?;
            if self.put_bytes(index, &buf[..want])? != want {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            index += want;
        }

        Ok(index)
    }

    /// Fill the storage from the start with everything a source yields.
    fn copy_all_from_reader(&mut self, r: &mut dyn Read) -> Result<usize> {
        let mut buf = [0; COPY_BUFFER_SIZE];
        let mut index = 0;
        loop {
            let read = match r.read(&mut buf) {
                Ok(0) => return Ok(index),
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };

            if self.put_bytes(index, &buf[..read])? != read {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            index += read;
        }
    }
}

/// Fixed capacity storage. The backing buffer is only allocated on the
/// first write.
#[derive(Debug, Clone)]
pub struct MemoryByteArray {
    data: Option<Vec<u8>>,
    capacity: usize,
    filled: usize,
}

impl MemoryByteArray {
    /// Create empty storage with a fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self { data: None, capacity, filled: 0 }
    }

    /// Take over existing bytes. They count as filled.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self { data: Some(data), capacity: len, filled: len }
    }
}

impl ByteArray for MemoryByteArray {
    fn length(&self) -> usize {
        self.filled
    }

    fn size(&self) -> usize {
        self.capacity
    }

    fn is_growable(&self) -> bool {
        false
    }

    fn internal_get(&self, index: usize, dst: &mut [u8]) {
        match &self.data {
            Some(data) => dst.copy_from_slice(&data[index..index + dst.len()]),
            None => dst.fill(0),
        }
    }

    fn internal_put(&mut self, index: usize, src: &[u8]) -> usize {
        let capacity = self.capacity;
        let data = self.data.get_or_insert_with(|| vec![0; capacity]);
        data[index..index + src.len()].copy_from_slice(src);
        src.len()
    }

    fn set_filled_length(&mut self, length: usize) {
        self.filled = length.min(self.capacity);
    }
}

/// Storage that grows on demand. Its capacity is unbounded.
#[derive(Debug, Clone, Default)]
pub struct GrowableMemoryByteArray {
    data: Vec<u8>,
    filled: usize,
}

impl GrowableMemoryByteArray {
    /// Create empty storage with a starting buffer size.
    pub fn new(initial_capacity: usize) -> Self {
        Self { data: Vec::with_capacity(initial_capacity), filled: 0 }
    }
}

impl ByteArray for GrowableMemoryByteArray {
    fn length(&self) -> usize {
        self.filled
    }

    fn size(&self) -> usize {
        usize::MAX
    }

    fn is_growable(&self) -> bool {
        true
    }

    fn internal_get(&self, index: usize, dst: &mut [u8]) {
        dst.copy_from_slice(&self.data[index..index + dst.len()]);
    }

    fn internal_put(&mut self, index: usize, src: &[u8]) -> usize {
        let end = index.saturating_add(src.len());
        if end > self.data.len() {
            // Geometric growth, but never less than what this write needs.
            let grown = end.max(self.data.len().saturating_mul(2));
            self.data.resize(grown, 0);
        }
        self.data[index..end].copy_from_slice(src);
        src.len()
    }

    fn set_filled_length(&mut self, length: usize) {
        self.filled = length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_array_bounds() {
        let mut a = MemoryByteArray::new(4);
        assert_eq!(a.length(), 0);
        assert!(a.get(0).is_err());
        a.put(2, 7).unwrap();
        assert_eq!(a.length(), 3);
        assert_eq!(a.get(0).unwrap(), 0);
        assert_eq!(a.get(2).unwrap(), 7);
        assert!(a.put(4, 1).is_err());
        assert_eq!(a.put_bytes(2, &[1, 2, 3, 4]).unwrap(), 2);
        assert_eq!(a.length(), 4);
    }

    #[test]
    fn bulk_get_clamps_to_filled_length() {
        let a = MemoryByteArray::from_vec(vec![1, 2, 3, 4, 5]);
        let mut buf = [0; 8];
        assert_eq!(a.get_bytes(3, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert!(a.get_bytes(5, &mut buf).is_err());
    }

    #[test]
    fn growable_array_grows() {
        let mut a = GrowableMemoryByteArray::new(0);
        a.put_bytes(10_000, &[9; 100]).unwrap();
        assert_eq!(a.length(), 10_100);
        assert_eq!(a.get(0).unwrap(), 0);
        assert_eq!(a.get(10_099).unwrap(), 9);
        assert!(a.is_growable());
    }

    #[test]
    fn copies_through_buffer() {
        let src: Vec<u8> = (0..20_000u32).map(|i| i as u8).collect();
        let a = MemoryByteArray::from_vec(src.clone());
        let mut b = MemoryByteArray::new(20_000);
        assert_eq!(a.copy_to(&mut b).unwrap(), 20_000);
        assert_eq!(b.get(12_345).unwrap(), src[12_345]);

        let mut small = MemoryByteArray::new(10);
        assert!(a.copy_to(&mut small).is_err());

        let mut out = Vec::new();
        a.copy_range_to_writer(&mut out, 100, 9000).unwrap();
        assert_eq!(out, &src[100..9100]);
    }

    #[test]
    fn copy_from_reader_requires_all_bytes() {
        let mut a = GrowableMemoryByteArray::new(0);
        assert_eq!(a.copy_from_reader(&mut &[1u8, 2, 3][..], 3).unwrap(), 3);
        assert_eq!(a.length(), 3);

        let mut b = MemoryByteArray::new(8);
        assert!(matches!(b.copy_from_reader(&mut &[1u8, 2][..], 4), Err(Error::Io(_))));

        let mut c = GrowableMemoryByteArray::new(0);
        assert_eq!(c.copy_all_from_reader(&mut &[5u8; 9000][..]).unwrap(), 9000);
    }
}
