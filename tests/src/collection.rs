use sfnt_builder::factory::FontFactory;
use sfnt_builder::table::{FontDataTable, Table, TableBuilder};
use sfnt_builder::Tag;

use crate::{assemble, checksum, put16, put32, serialize, tables, tuffy, NUM_GLYPHS};

const DIRECTORY_ENTRY: usize = 16;

fn num_tables(font: &[u8]) -> usize {
    u16::from_be_bytes([font[4], font[5]]) as usize
}

/// Shift every table offset in a font's directory by `base`.
fn rebase(font: &mut [u8], base: usize) {
    for i in 0..num_tables(font) {
        let at = 12 + DIRECTORY_ENTRY * i + 8;
        let offset = u32::from_be_bytes(font[at..at + 4].try_into().unwrap());
        put32(font, at, offset + base as u32);
    }
}

fn ttc_header(num_fonts: usize) -> Vec<u8> {
    let mut ttc = b"ttcf".to_vec();
    ttc.extend(0x0001_0000u32.to_be_bytes());
    ttc.extend((num_fonts as u32).to_be_bytes());
    ttc.extend(std::iter::repeat(0).take(4 * num_fonts));
    ttc
}

/// Place whole fonts one after another behind the collection header.
fn collection(fonts: &[Vec<u8>]) -> Vec<u8> {
    let mut ttc = ttc_header(fonts.len());
    for (i, font) in fonts.iter().enumerate() {
        let base = ttc.len();
        put32(&mut ttc, 12 + 4 * i, base as u32);
        let mut font = font.clone();
        rebase(&mut font, base);
        ttc.extend(font);
    }
    ttc
}

/// Two directories that point at the same table data.
fn shared_collection() -> Vec<u8> {
    let mut font = tuffy();
    let directory_len = 12 + DIRECTORY_ENTRY * num_tables(&font);
    let mut ttc = ttc_header(2);
    let header_len = ttc.len();
    put32(&mut ttc, 12, header_len as u32);
    put32(&mut ttc, 16, (header_len + directory_len) as u32);

    // Data follows both directories.
    rebase(&mut font, ttc.len() + directory_len);
    ttc.extend(&font[..directory_len]);
    ttc.extend(&font[..directory_len]);
    ttc.extend(&font[directory_len..]);
    ttc
}

/// The fixture with a different ascender.
fn tall() -> Vec<u8> {
    let mut tables = tables();
    for (tag, bytes) in &mut tables {
        if *tag == Tag::HHEA {
            put16(bytes, 4, 1800);
        }
    }
    assemble(&tables)
}

fn ascender(table: Option<&Table>) -> i16 {
    table.and_then(Table::as_hhea).unwrap().ascender().unwrap()
}

#[test]
fn fixture_is_a_valid_collection() {
    let ttc = collection(&[tuffy(), tall()]);
    assert_eq!(ttf_parser::fonts_in_collection(&ttc), Some(2));
    assert_eq!(ttf_parser::Face::parse(&ttc, 0).unwrap().ascender(), 1993);
    assert_eq!(ttf_parser::Face::parse(&ttc, 1).unwrap().ascender(), 1800);
}

#[test]
fn every_font_is_loaded() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ttc = collection(&[tuffy(), tall()]);
    assert!(FontFactory::is_collection(&ttc));

    let factory = FontFactory::new();
    let from_bytes = factory.load_fonts_from_bytes(&ttc).unwrap();
    let from_stream = factory.load_fonts(&ttc[..]).unwrap();
    for fonts in [from_bytes, from_stream] {
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].num_tables(), 22);
        assert_eq!(fonts[1].num_tables(), 22);
        assert_eq!(ascender(fonts[0].table(Tag::HHEA)), 1993);
        assert_eq!(ascender(fonts[1].table(Tag::HHEA)), 1800);
    }
}

#[test]
fn fonts_are_written_standalone() {
    let ttc = collection(&[tuffy(), tall()]);
    let fonts = FontFactory::new().load_fonts_from_bytes(&ttc).unwrap();

    let out = serialize(&fonts[1]).unwrap();
    assert_eq!(checksum(&out), 0xB1B0_AFBA);
    assert!(!FontFactory::is_collection(&out));

    let face = ttf_parser::Face::parse(&out, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), NUM_GLYPHS);
    assert_eq!(face.ascender(), 1800);
}

#[test]
fn shared_tables_are_read_for_each_font() {
    let ttc = shared_collection();
    let fonts = FontFactory::new().load_fonts_from_bytes(&ttc).unwrap();
    assert_eq!(fonts.len(), 2);

    for tag in [Tag::GLYF, Tag::HMTX, Tag::NAME] {
        let first = fonts[0].table(tag).unwrap().read_font_data().to_vec().unwrap();
        let second = fonts[1].table(tag).unwrap().read_font_data().to_vec().unwrap();
        assert_eq!(first, second);
    }
    assert_eq!(serialize(&fonts[0]).unwrap(), serialize(&fonts[1]).unwrap());
}

#[test]
fn builders_of_one_font_are_independent() {
    let ttc = collection(&[tuffy(), tuffy()]);
    let mut builders = FontFactory::new().load_font_builders_from_bytes(&ttc).unwrap();
    assert_eq!(builders.len(), 2);

    builders[0]
        .table_builder_mut(Tag::HHEA)
        .and_then(TableBuilder::as_hhea_mut)
        .unwrap()
        .set_ascender(1000)
        .unwrap();

    let first = builders[0].build().unwrap();
    let second = builders[1].build().unwrap();
    assert_eq!(ascender(first.table(Tag::HHEA)), 1000);
    assert_eq!(ascender(second.table(Tag::HHEA)), 1993);
}
