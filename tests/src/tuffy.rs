use sfnt_builder::factory::FontFactory;
use sfnt_builder::font::{search_fields, FontBuilder};
use sfnt_builder::loca::IndexToLocFormat;
use sfnt_builder::name::{platform, NameEntryId};
use sfnt_builder::table::{FontDataTable, Table, TableBuilder};
use sfnt_builder::Tag;

use crate::{checksum, load, serialize, tuffy, NUM_GLYPHS};

#[test]
fn hhea_reference_values() {
    let font = load(&tuffy()).unwrap();
    let hhea = font.table(Tag::HHEA).and_then(Table::as_hhea).unwrap();
    assert_eq!(hhea.table_version().unwrap().0, 0x0001_0000);
    assert_eq!(hhea.ascender().unwrap(), 1993);
    assert_eq!(hhea.descender().unwrap(), -449);
    assert_eq!(hhea.line_gap().unwrap(), 93);
    assert_eq!(hhea.advance_width_max().unwrap(), 3969);
    assert_eq!(hhea.min_left_side_bearing().unwrap(), -119);
    assert_eq!(hhea.min_right_side_bearing().unwrap(), -32768);
    assert_eq!(hhea.x_max_extent().unwrap(), 1565);
    assert_eq!(hhea.metric_data_format().unwrap(), 0);
    assert_eq!(hhea.number_of_h_metrics().unwrap(), 197);
}

#[test]
fn loca_reference_values() {
    let font = load(&tuffy()).unwrap();
    let loca = font.table(Tag::LOCA).and_then(Table::as_loca).unwrap();
    assert_eq!(loca.format_version(), IndexToLocFormat::Short);
    assert_eq!(loca.num_glyphs(), 197);
    assert_eq!(loca.num_locas(), 198);
    assert_eq!(loca.glyph_offset(0).unwrap(), 0);
    assert_eq!(loca.glyph_offset(5).unwrap(), 0x60);
    assert_eq!(loca.glyph_length(196).unwrap(), 0x34D4 - 0x3448);
    assert!(loca.glyph_offset(197).is_err());

    let offsets: Vec<u32> = loca.iter().map(Result::unwrap).collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn hmtx_reference_values() {
    let font = load(&tuffy()).unwrap();
    let hmtx = font.table(Tag::HMTX).and_then(Table::as_hmtx).unwrap();
    assert_eq!(hmtx.number_of_h_metrics(), 197);
    assert_eq!(hmtx.number_of_lsbs(), 0);
    assert_eq!(hmtx.advance_width(0).unwrap(), 32768);
    assert_eq!(hmtx.left_side_bearing(0).unwrap(), 0);
    assert_eq!(hmtx.advance_width(4).unwrap(), 421);
    assert_eq!(hmtx.left_side_bearing(4).unwrap(), 103);
    assert_eq!(hmtx.advance_width(196).unwrap(), 1089);
    assert_eq!(hmtx.left_side_bearing(196).unwrap(), 135);
    assert!(hmtx.advance_width(197).is_err());
}

#[test]
fn other_tables() {
    let font = load(&tuffy()).unwrap();
    assert_eq!(font.num_tables(), 22);

    let head = font.table(Tag::HEAD).and_then(Table::as_head).unwrap();
    assert_eq!(head.units_per_em().unwrap(), 2048);
    assert_eq!(head.index_to_loc_format().unwrap(), IndexToLocFormat::Short);

    let maxp = font.table(Tag::MAXP).and_then(Table::as_maxp).unwrap();
    assert_eq!(maxp.num_glyphs().unwrap(), NUM_GLYPHS);

    let os2 = font.table(Tag::OS2).and_then(Table::as_os2).unwrap();
    assert_eq!(os2.us_weight_class().unwrap(), 400);
    assert_eq!(os2.ach_vend_id().unwrap(), Tag::new(b"PfEd"));
    assert_eq!(os2.ul_code_page_range().unwrap(), 0x8000_0000_2000_0001);
    assert_eq!(os2.sx_height().unwrap(), Some(1082));

    let cmap = font.table(Tag::CMAP).and_then(Table::as_cmap).unwrap();
    assert_eq!(cmap.glyph_id('A' as u32).unwrap(), Some(36));
    assert_eq!(cmap.glyph_id(' ' as u32).unwrap(), Some(3));
    assert_eq!(cmap.glyph_id('a' as u32).unwrap(), None);

    let name = font.table(Tag::NAME).and_then(Table::as_name).unwrap();
    let family = NameEntryId::new(platform::WINDOWS, 1, 0x409, 1);
    assert_eq!(name.find(family).unwrap().unwrap().name().as_deref(), Some("Tuffy"));
}

#[test]
fn round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let data = tuffy();
    let font = load(&data).unwrap();
    let out = serialize(&font).unwrap();
    assert_eq!(checksum(&out), 0xB1B0_AFBA);

    let reloaded = load(&out).unwrap();
    assert_eq!(reloaded.num_tables(), font.num_tables());
    for table in font.tables() {
        let other = reloaded.table(table.header_tag()).unwrap();
        assert_eq!(other.calculated_checksum(), table.calculated_checksum());
        assert_eq!(other.length(), table.length());
    }

    let num_tables = u16::from_be_bytes([out[4], out[5]]);
    let fields = [&out[6..8], &out[8..10], &out[10..12]].map(|b| u16::from_be_bytes([b[0], b[1]]));
    assert_eq!(num_tables, 22);
    assert_eq!((fields[0], fields[1], fields[2]), search_fields(22));
    assert_eq!(search_fields(22), (256, 4, 96));

    let face = ttf_parser::Face::parse(&out, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), NUM_GLYPHS);
    assert_eq!(face.ascender(), 1993);
    assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(36)));
}

#[test]
fn stream_and_bytes_agree() {
    let data = tuffy();
    let factory = FontFactory::new();
    let from_stream = factory.load_fonts(&data[..]).unwrap().remove(0);
    let from_bytes = factory.load_fonts_from_bytes(&data).unwrap().remove(0);
    assert_eq!(serialize(&from_stream).unwrap(), serialize(&from_bytes).unwrap());
}

#[test]
fn edits_survive_serialization() {
    let factory = FontFactory::new();
    let mut builder: FontBuilder = factory.load_font_builders_from_bytes(&tuffy()).unwrap().remove(0);

    builder
        .table_builder_mut(Tag::HHEA)
        .and_then(TableBuilder::as_hhea_mut)
        .unwrap()
        .set_ascender(2000)
        .unwrap();

    let name = builder.table_builder_mut(Tag::NAME).and_then(TableBuilder::as_name_mut).unwrap();
    let family = NameEntryId::new(platform::WINDOWS, 1, 0x409, 1);
    name.name_builder(family).unwrap().set_name("Tuffy Subset").unwrap();

    let font = builder.build().unwrap();
    let out = serialize(&font).unwrap();
    assert_eq!(checksum(&out), 0xB1B0_AFBA);

    let face = ttf_parser::Face::parse(&out, 0).unwrap();
    assert_eq!(face.ascender(), 2000);
    let family = face
        .names()
        .into_iter()
        .find(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
        .and_then(|n| n.to_string());
    assert_eq!(family.as_deref(), Some("Tuffy Subset"));

    let reloaded = load(&out).unwrap();
    let name = reloaded.table(Tag::NAME).and_then(Table::as_name).unwrap();
    assert_eq!(name.name_count().unwrap(), 3);
}

#[test]
fn skrifa_reads_the_output() {
    use skrifa::instance::{Location, Size};
    use skrifa::{FontRef, GlyphId, MetadataProvider};

    let out = serialize(&load(&tuffy()).unwrap()).unwrap();
    let font_ref = FontRef::new(&out).unwrap();
    let location = Location::default();
    let metrics = font_ref.glyph_metrics(Size::unscaled(), &location);
    assert_eq!(metrics.advance_width(GlyphId::new(4)), Some(421.0));
    assert_eq!(metrics.left_side_bearing(GlyphId::new(4)), Some(103.0));
    assert!(font_ref.outline_glyphs().get(GlyphId::new(3)).is_some());
}
