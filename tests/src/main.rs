use std::error::Error;

use sfnt_builder::factory::FontFactory;
use sfnt_builder::font::Font;
use sfnt_builder::Tag;

mod collection;
mod subset;
mod tuffy;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Number of glyphs in the fixture font.
const NUM_GLYPHS: u16 = 197;

/// Advance widths and left side bearings of the first ten glyphs.
const METRICS: [(u16, i16); 10] = [
    (32768, 0),
    (0, 0),
    (682, 0),
    (616, 0),
    (421, 103),
    (690, 129),
    (1589, 129),
    (1017, 25),
    (1402, 104),
    (1241, 100),
];

/// The glyph that is built from other glyphs.
const COMPOSITE_GLYPH: u16 = 10;

fn metric(glyph: u16) -> (u16, i16) {
    match glyph {
        0..=9 => METRICS[glyph as usize],
        196 => (1089, 135),
        _ => (400 + (glyph * 7) % 300, (glyph % 50) as i16),
    }
}

fn glyph_length(glyph: u16) -> usize {
    match glyph {
        0 => 36,
        1 => 0,
        2..=4 => 20,
        5 | 6 => 218,
        196 => 140,
        _ => 68,
    }
}

/// A triangle with `length - 20` bytes of instructions.
fn simple_glyph(length: usize) -> Vec<u8> {
    let instructions = length - 20;
    let mut glyph = vec![0, 1, 0, 0, 0, 0, 0, 100, 0, 100, 0, 2];
    glyph.extend((instructions as u16).to_be_bytes());
    glyph.extend(std::iter::repeat(0xB0).take(instructions));
    glyph.extend([0x31, 0x33, 0x37, 100, 0, 100]);
    glyph
}

/// Glyph 3 shifted to the right, with instructions filling it up to
/// `length`.
fn composite_glyph(length: usize) -> Vec<u8> {
    let instructions = length - 20;
    let mut glyph = vec![0xFF, 0xFF, 0, 50, 0, 0, 0, 150, 0, 100];
    glyph.extend([0x01, 0x03, 0, 3, 0, 50, 0, 0]);
    glyph.extend((instructions as u16).to_be_bytes());
    glyph.extend(std::iter::repeat(0xB0).take(instructions));
    glyph
}

fn glyph(glyph: u16) -> Vec<u8> {
    match (glyph, glyph_length(glyph)) {
        (_, 0) => vec![],
        (COMPOSITE_GLYPH, length) => composite_glyph(length),
        (_, length) => simple_glyph(length),
    }
}

fn be16(values: impl IntoIterator<Item = u16>) -> Vec<u8> {
    values.into_iter().flat_map(u16::to_be_bytes).collect()
}

fn put16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

fn put32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn head() -> Vec<u8> {
    let mut head = vec![0; 54];
    put32(&mut head, 0, 0x0001_0000);
    put32(&mut head, 4, 0x0001_0000);
    put32(&mut head, 12, 0x5F0F_3CF5);
    put16(&mut head, 16, 0x000B);
    put16(&mut head, 18, 2048);
    put16(&mut head, 36, (-119i16) as u16);
    put16(&mut head, 38, (-449i16) as u16);
    put16(&mut head, 40, 1565);
    put16(&mut head, 42, 1993);
    put16(&mut head, 46, 9);
    put16(&mut head, 48, 2);
    head
}

fn hhea() -> Vec<u8> {
    let mut hhea = vec![0; 36];
    put32(&mut hhea, 0, 0x0001_0000);
    put16(&mut hhea, 4, 1993);
    put16(&mut hhea, 6, (-449i16) as u16);
    put16(&mut hhea, 8, 93);
    put16(&mut hhea, 10, 3969);
    put16(&mut hhea, 12, (-119i16) as u16);
    put16(&mut hhea, 14, (-32768i16) as u16);
    put16(&mut hhea, 16, 1565);
    put16(&mut hhea, 18, 1);
    put16(&mut hhea, 34, NUM_GLYPHS);
    hhea
}

fn maxp() -> Vec<u8> {
    let mut maxp = vec![0; 32];
    put32(&mut maxp, 0, 0x0001_0000);
    put16(&mut maxp, 4, NUM_GLYPHS);
    put16(&mut maxp, 6, 3);
    put16(&mut maxp, 8, 1);
    put16(&mut maxp, 14, 2);
    put16(&mut maxp, 28, 2);
    put16(&mut maxp, 30, 1);
    maxp
}

fn os2() -> Vec<u8> {
    let mut os2 = vec![0; 96];
    put16(&mut os2, 0, 4);
    put16(&mut os2, 2, 1024);
    put16(&mut os2, 4, 400);
    put16(&mut os2, 6, 5);
    put16(&mut os2, 26, 102);
    put16(&mut os2, 28, 530);
    os2[32..42].copy_from_slice(&[2, 11, 6, 3, 3, 4, 5, 2, 2, 4]);
    put32(&mut os2, 42, 0x8000_0003);
    os2[58..62].copy_from_slice(b"PfEd");
    put16(&mut os2, 62, 0x0040);
    put16(&mut os2, 64, 0x20);
    put16(&mut os2, 66, 0x5A);
    put16(&mut os2, 68, 1556);
    put16(&mut os2, 70, (-492i16) as u16);
    put16(&mut os2, 72, 410);
    put16(&mut os2, 74, 1993);
    put16(&mut os2, 76, 449);
    put32(&mut os2, 78, 0x2000_0001);
    put32(&mut os2, 82, 0x8000_0000);
    put16(&mut os2, 86, 1082);
    put16(&mut os2, 88, 1456);
    put16(&mut os2, 92, 0x20);
    put16(&mut os2, 94, 2);
    os2
}

fn hmtx() -> Vec<u8> {
    (0..NUM_GLYPHS)
        .flat_map(|g| {
            let (advance, lsb) = metric(g);
            be16([advance, lsb as u16])
        })
        .collect()
}

fn loca_and_glyf() -> (Vec<u8>, Vec<u8>) {
    let mut offsets = vec![0];
    let mut glyf = vec![];
    for g in 0..NUM_GLYPHS {
        glyf.extend(glyph(g));
        offsets.push(glyf.len());
    }
    (be16(offsets.into_iter().map(|o| (o / 2) as u16)), glyf)
}

/// Maps the printable ASCII range from space to `Z` onto glyphs 3 to 61.
fn cmap() -> Vec<u8> {
    let mut cmap = be16([0, 1, 3, 1, 0, 12]);
    cmap.extend(be16([4, 32, 0, 4, 4, 1, 0]));
    cmap.extend(be16([0x5A, 0xFFFF, 0, 0x20, 0xFFFF]));
    cmap.extend(be16([(3i16 - 0x20) as u16, 1, 0, 0]));
    cmap
}

const FAMILY: &str = "Tuffy";
const SUBFAMILY: &str = "Regular";

fn name() -> Vec<u8> {
    let windows_family: Vec<u8> = FAMILY.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let windows_subfamily: Vec<u8> =
        SUBFAMILY.encode_utf16().flat_map(u16::to_be_bytes).collect();
    let records: [(u16, u16, u16, u16, &[u8]); 3] = [
        (1, 0, 0, 1, FAMILY.as_bytes()),
        (3, 1, 0x409, 1, &windows_family),
        (3, 1, 0x409, 2, &windows_subfamily),
    ];

    let mut name = be16([0, records.len() as u16, 6 + 12 * records.len() as u16]);
    let mut strings: Vec<u8> = vec![];
    for (platform, encoding, language, id, bytes) in records {
        name.extend(be16([platform, encoding, language, id]));
        name.extend(be16([bytes.len() as u16, strings.len() as u16]));
        strings.extend(bytes);
    }
    name.extend(strings);
    name
}

fn post() -> Vec<u8> {
    let mut post = vec![0; 32];
    put32(&mut post, 0, 0x0003_0000);
    put16(&mut post, 8, (-150i16) as u16);
    put16(&mut post, 10, 80);
    post
}

/// Every table of the fixture font, in tag order.
fn tables() -> Vec<(Tag, Vec<u8>)> {
    let (loca, glyf) = loca_and_glyf();
    let mut ltsh = be16([0, NUM_GLYPHS]);
    ltsh.extend(std::iter::repeat(1).take(NUM_GLYPHS as usize));

    let mut tables = vec![
        (Tag::DSIG, vec![0, 0, 0, 1, 0, 0, 0, 0]),
        (Tag::GDEF, be16([1, 0, 0, 0, 0, 0])),
        (Tag::GSUB, be16([1, 0, 0, 0, 0])),
        (Tag::LTSH, ltsh),
        (Tag::OS2, os2()),
        (Tag::PCLT, vec![0; 54]),
        (Tag::VDMX, be16([0, 0, 0])),
        (Tag::CMAP, cmap()),
        (Tag::CVT, be16([0, 100])),
        (Tag::FPGM, vec![0xB0, 1, 0x2C, 0, 0, 0]),
        (Tag::GASP, be16([1, 1, 0xFFFF, 0x000F])),
        (Tag::GLYF, glyf),
        (Tag::HDMX, vec![0; 8]),
        (Tag::HEAD, head()),
        (Tag::HHEA, hhea()),
        (Tag::HMTX, hmtx()),
        (Tag::KERN, be16([0, 0])),
        (Tag::LOCA, loca),
        (Tag::MAXP, maxp()),
        (Tag::NAME, name()),
        (Tag::POST, post()),
        (Tag::PREP, vec![0xB0, 1, 0x2C]),
    ];
    tables.sort_by_key(|(tag, _)| *tag);
    tables
}

fn checksum(bytes: &[u8]) -> u32 {
    bytes.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Lay out a font the plain way: records and data in tag order, each
/// table padded to four bytes, with a correct head checksum adjustment.
fn assemble(tables: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let n = tables.len() as u16;
    let entry_selector = 15 - n.leading_zeros() as u16;
    let search_range = 16 << entry_selector;

    let mut font = vec![0, 1, 0, 0];
    font.extend(be16([n, search_range, entry_selector, n * 16 - search_range]));

    let mut offset = 12 + 16 * tables.len();
    let mut data = vec![];
    let mut head_offset = None;
    for (tag, bytes) in tables {
        if *tag == Tag::HEAD {
            head_offset = Some(offset);
        }
        font.extend(tag.0);
        font.extend(checksum(bytes).to_be_bytes());
        font.extend((offset as u32).to_be_bytes());
        font.extend((bytes.len() as u32).to_be_bytes());
        data.extend(bytes);
        data.resize(data.len().next_multiple_of(4), 0);
        offset = 12 + 16 * tables.len() + data.len();
    }
    font.extend(data);

    if let Some(head) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&font));
        font[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    font
}

/// A font shaped like Tuffy: 197 glyphs, 22 tables, short `loca` offsets.
fn tuffy() -> Vec<u8> {
    assemble(&tables())
}

fn load(data: &[u8]) -> Result<Font> {
    let factory = FontFactory::new();
    Ok(factory.load_fonts_from_bytes(data)?.remove(0))
}

fn serialize(font: &Font) -> Result<Vec<u8>> {
    let mut out = vec![];
    FontFactory::new().serialize_font(font, &mut out)?;
    Ok(out)
}

fn parse_gids(gids: &str) -> Vec<u16> {
    let mut parsed = vec![];
    for el in gids.split(',').filter(|s| !s.is_empty()) {
        if let Some((first, last)) = el.split_once('-') {
            let first = first.parse::<u16>().unwrap();
            let last = last.parse::<u16>().unwrap();
            parsed.extend(first..=last);
        } else {
            parsed.push(el.parse::<u16>().unwrap());
        }
    }
    parsed
}

#[test]
fn fixture_is_a_valid_font() {
    let data = tuffy();
    assert_eq!(checksum(&data), 0xB1B0_AFBA);

    let face = ttf_parser::Face::parse(&data, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), NUM_GLYPHS);
    assert_eq!(face.units_per_em(), 2048);
    assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(36)));
    assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(4)), Some(421));
}
