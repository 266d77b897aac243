//! Big-endian scalar types and the stream wrappers used to load and
//! serialize fonts.

use std::io::{self, Read, Write};

use crate::{Error, Result};

/// The size of the largest codec value, a table record.
pub(crate) const MAX_SIZE: usize = 16;

/// A fixed-size big-endian value that can be decoded from bytes.
pub trait Readable: Sized {
    /// The number of bytes occupied by the value.
    const SIZE: usize;

    /// Decode the value. `bytes` holds at least `SIZE` bytes.
    fn read(bytes: &[u8]) -> Self;
}

/// A fixed-size value that can be encoded as big-endian bytes.
pub trait Writeable: Sized {
    /// The number of bytes occupied by the value.
    const SIZE: usize;

    /// Encode the value. `out` holds at least `SIZE` bytes.
    fn write(&self, out: &mut [u8]);
}

macro_rules! primitive {
    ($($ty:ty),*) => {$(
        impl Readable for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Self {
                let mut buf = [0; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..<Self as Readable>::SIZE]);
                <$ty>::from_be_bytes(buf)
            }
        }

        impl Writeable for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn write(&self, out: &mut [u8]) {
                out[..<Self as Writeable>::SIZE].copy_from_slice(&self.to_be_bytes());
            }
        }
    )*};
}

primitive!(u8, i8, u16, i16, u32, i32, u64, i64);

/// An unsigned 24-bit integer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct U24(pub u32);

impl Readable for U24 {
    const SIZE: usize = 3;

    fn read(bytes: &[u8]) -> Self {
        U24(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }
}

impl Writeable for U24 {
    const SIZE: usize = 3;

    fn write(&self, out: &mut [u8]) {
        let data = self.0.to_be_bytes();
        out[..3].copy_from_slice(&data[1..]);
    }
}

/// A 32-bit signed fixed-point number (16.16), kept in its raw form.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fixed(pub i32);

impl Fixed {
    /// The value as a float.
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}

impl Readable for Fixed {
    const SIZE: usize = 4;

    fn read(bytes: &[u8]) -> Self {
        Fixed(i32::read(bytes))
    }
}

impl Writeable for Fixed {
    const SIZE: usize = 4;

    fn write(&self, out: &mut [u8]) {
        self.0.write(out)
    }
}

/// A stream of font bytes that tracks its position.
///
/// Skipping only moves forward. Tables are read in offset order, so a
/// backward jump means the directory is corrupt.
pub struct FontInputStream<R> {
    inner: R,
    position: u64,
    limit: Option<u64>,
}

impl<R: Read> FontInputStream<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0, limit: None }
    }

    /// Wrap a byte source that yields at most `length` bytes.
    pub fn bounded(inner: R, length: u64) -> Self {
        Self { inner, position: 0, limit: Some(length) }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The number of bytes left before the limit, if there is one.
    pub fn available(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.position))
    }

    /// Read a big-endian value.
    pub fn read<T: Readable>(&mut self) -> Result<T> {
        let mut buf = [0; MAX_SIZE];
        let bytes = &mut buf[..T::SIZE];
        self.read_exact(bytes)?;
        Ok(T::read(bytes))
    }

    /// Read an unsigned 8-bit value.
    pub fn read_ubyte(&mut self) -> Result<u8> {
        self.read::<u8>()
    }

    /// Read an unsigned 16-bit value.
    pub fn read_ushort(&mut self) -> Result<u16> {
        self.read::<u16>()
    }

    /// Read a signed 16-bit value.
    pub fn read_short(&mut self) -> Result<i16> {
        self.read::<i16>()
    }

    /// Read an unsigned 32-bit value.
    pub fn read_ulong(&mut self) -> Result<u32> {
        self.read::<u32>()
    }

    /// Read a 16.16 fixed-point value.
    pub fn read_fixed(&mut self) -> Result<Fixed> {
        self.read::<Fixed>()
    }

    /// Skip `count` bytes forward, returning how many were actually skipped.
    pub fn skip(&mut self, count: u64) -> Result<u64> {
        let skipped = io::copy(&mut self.by_ref().take(count), &mut io::sink())?;
        Ok(skipped)
    }

    /// Skip forward to an absolute position.
    pub fn skip_to(&mut self, position: u64) -> Result<()> {
        if position < self.position {
            return Err(Error::InvalidData);
        }

        let count = position - self.position;
        if self.skip(count)? != count {
            return Err(Error::Io(io::ErrorKind::UnexpectedEof.into()));
        }

        Ok(())
    }

    /// Give up the wrapper.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for FontInputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = match self.available() {
            Some(left) => buf.len().min(usize::try_from(left).unwrap_or(usize::MAX)),
            None => buf.len(),
        };

        let n = self.inner.read(&mut buf[..max])?;
        self.position += n as u64;
        Ok(n)
    }
}

/// A byte sink for fonts that tracks its position.
pub struct FontOutputStream<W> {
    inner: W,
    position: u64,
}

impl<W: Write> FontOutputStream<W> {
    /// Wrap a byte sink.
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// The number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Write a big-endian value.
    pub fn write<T: Writeable>(&mut self, value: T) -> Result<()> {
        let mut buf = [0; MAX_SIZE];
        let bytes = &mut buf[..T::SIZE];
        value.write(bytes);
        self.write_bytes(bytes)
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)?;
        Ok(())
    }

    /// Write zeros until the position is a multiple of `to`.
    pub fn align(&mut self, to: u64) -> Result<()> {
        while self.position % to != 0 {
            self.write::<u8>(0)?;
        }
        Ok(())
    }

    /// Flush and give up the wrapper.
    pub fn close(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for FontOutputStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
