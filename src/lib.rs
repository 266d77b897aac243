/*!
Parses, edits and re-serializes SFNT fonts (TrueType/OpenType, `.ttf`,
`.otf` and `.ttc` collections).

A font is loaded into a [`FontBuilder`](font::FontBuilder), which holds one
table builder per tag. Builders can be edited (or left alone), then the
whole font is built into an immutable [`Font`](font::Font) that serializes
with a recomputed directory, table checksums and 4-byte padding.

# Example
Keep only the first three glyphs of a font and drop its digital signature.

```no_run
use sfnt_builder::{factory::FontFactory, subset::Subsetter, Tag};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let data = std::fs::read("fonts/Tuffy.ttf")?;
let factory = FontFactory::new();
let fonts = factory.load_fonts_from_bytes(&data)?;

let mut subsetter = Subsetter::new(&fonts[0], &factory);
subsetter.set_glyphs(&[0, 1, 2]);
subsetter.set_remove_tables(&[Tag::DSIG]);
let font = subsetter.subset()?.build()?;

let mut out = Vec::new();
factory.serialize_font(&font, &mut out)?;
std::fs::write("target/Tuffy-Small.ttf", out)?;
# Ok(())
# }
```

Everything is single threaded. Byte storage is shared between the views
that point into it, so views and builders are neither `Send` nor `Sync`.
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod bitmap;
pub mod cmap;
pub mod data;
pub mod factory;
pub mod font;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;
pub mod name;
pub mod os2;
pub mod stream;
pub mod subset;
pub mod table;

use std::fmt::{self, Debug, Display, Formatter};

use crate::stream::{Readable, Writeable};

/// A 4-byte OpenType tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag(pub [u8; 4]);

#[allow(missing_docs)]
impl Tag {
    // Required tables.
    pub const CMAP: Self = Self(*b"cmap");
    pub const HEAD: Self = Self(*b"head");
    pub const HHEA: Self = Self(*b"hhea");
    pub const HMTX: Self = Self(*b"hmtx");
    pub const MAXP: Self = Self(*b"maxp");
    pub const NAME: Self = Self(*b"name");
    pub const OS2: Self = Self(*b"OS/2");
    pub const POST: Self = Self(*b"post");

    // TrueType.
    pub const CVT: Self = Self(*b"cvt ");
    pub const FPGM: Self = Self(*b"fpgm");
    pub const GLYF: Self = Self(*b"glyf");
    pub const LOCA: Self = Self(*b"loca");
    pub const PREP: Self = Self(*b"prep");
    pub const GASP: Self = Self(*b"gasp");

    // CFF.
    pub const CFF: Self = Self(*b"CFF ");
    pub const VORG: Self = Self(*b"VORG");

    // Bitmap glyphs.
    pub const EBDT: Self = Self(*b"EBDT");
    pub const EBLC: Self = Self(*b"EBLC");
    pub const EBSC: Self = Self(*b"EBSC");
    pub const BHED: Self = Self(*b"bhed");
    pub const BDAT: Self = Self(*b"bdat");
    pub const BLOC: Self = Self(*b"bloc");

    // Everything else.
    pub const DSIG: Self = Self(*b"DSIG");
    pub const HDMX: Self = Self(*b"hdmx");
    pub const KERN: Self = Self(*b"kern");
    pub const LTSH: Self = Self(*b"LTSH");
    pub const PCLT: Self = Self(*b"PCLT");
    pub const VDMX: Self = Self(*b"VDMX");
    pub const VHEA: Self = Self(*b"vhea");
    pub const VMTX: Self = Self(*b"vmtx");
    pub const GDEF: Self = Self(*b"GDEF");
    pub const GPOS: Self = Self(*b"GPOS");
    pub const GSUB: Self = Self(*b"GSUB");

    /// Create a tag from its four bytes.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// Create a tag from its big-endian integer form.
    pub const fn from_u32(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    /// The big-endian integer form of the tag.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl Readable for Tag {
    const SIZE: usize = 4;

    fn read(bytes: &[u8]) -> Self {
        Self([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl Writeable for Tag {
    const SIZE: usize = 4;

    fn write(&self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.0);
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(std::str::from_utf8(&self.0).unwrap_or("..."))
    }
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// Reading, building or writing a font failed.
#[derive(Debug)]
pub enum Error {
    /// An index, offset or length fell outside of a byte array or view.
    OutOfBounds,
    /// An unsigned 32-bit value does not fit into a signed 32-bit integer.
    ArithmeticOverflow,
    /// A builder was asked to serialize while inputs it depends on, such as
    /// the number of glyphs, are still missing.
    NotReady(Tag),
    /// Reading from or writing to a stream failed.
    Io(std::io::Error),
    /// A table could not be built, or the table directory and the tables
    /// disagree. No partial font is ever produced.
    Assembly(Tag),
    /// A subtable uses a format this crate does not read.
    UnsupportedFormat {
        /// The table that contains the subtable.
        tag: Tag,
        /// The format number found in the data.
        format: u16,
    },
    /// The file contains an unknown kind of font.
    UnknownKind,
    /// Parsed data was invalid.
    InvalidData,
    /// A table is missing.
    ///
    /// Only operations that need a specific table report this, e.g.
    /// subsetting a font that has `glyf` but no `loca`.
    MissingTable(Tag),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::OutOfBounds => f.pad("index out of bounds"),
            Self::ArithmeticOverflow => f.pad("value does not fit into a signed integer"),
            Self::NotReady(tag) => write!(f, "{tag} builder is missing required inputs"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Assembly(tag) => write!(f, "failed to assemble font at '{tag}' table"),
            Self::UnsupportedFormat { tag, format } => {
                write!(f, "unsupported {tag} subtable format {format}")
            }
            Self::UnknownKind => f.pad("unknown font kind"),
            Self::InvalidData => f.pad("invalid data"),
            Self::MissingTable(tag) => write!(f, "missing {tag} table"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Calculate a checksum over the sliced data as a sum of u32s. If the data
/// length is not a multiple of four, it is treated as if padded with zero to a
/// length that is a multiple of four.
pub(crate) fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(bytes));
    }
    sum
}

/// Round up to the next multiple of four.
pub(crate) const fn round4(len: usize) -> usize {
    (len + 3) & !3
}
