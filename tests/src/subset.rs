use sfnt_builder::factory::FontFactory;
use sfnt_builder::font::Font;
use sfnt_builder::subset::{composite_closure, Subsetter};
use sfnt_builder::table::Table;
use sfnt_builder::Tag;

use crate::{checksum, load, metric, parse_gids, serialize, tuffy, COMPOSITE_GLYPH};

fn subset(font: &Font, gids: &[u16], remove: &[Tag]) -> Vec<u8> {
    let factory = FontFactory::new();
    let mut subsetter = Subsetter::new(font, &factory);
    subsetter.set_glyphs(gids);
    subsetter.set_remove_tables(remove);
    let font = subsetter.subset().unwrap().build().unwrap();
    serialize(&font).unwrap()
}

fn glyph_bytes(font: &Font, glyph: u16) -> Vec<u8> {
    let glyf = font.table(Tag::GLYF).and_then(Table::as_glyf).unwrap();
    let loca = font.table(Tag::LOCA).and_then(Table::as_loca).unwrap();
    let offset = loca.glyph_offset(glyph).unwrap();
    let length = loca.glyph_length(glyph).unwrap();
    glyf.glyph_data(offset, length).unwrap().to_vec().unwrap()
}

#[test]
fn subset_keeps_selected_glyphs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let data = tuffy();
    let font = load(&data).unwrap();
    let gids = parse_gids("0-9,11,10");
    let out = subset(&font, &gids, &[Tag::DSIG]);
    assert_eq!(checksum(&out), 0xB1B0_AFBA);

    let sub = load(&out).unwrap();
    assert!(!sub.has_table(Tag::DSIG));
    assert_eq!(sub.num_tables(), 21);
    assert!(sub.has_table(Tag::LTSH));

    let maxp = sub.table(Tag::MAXP).and_then(Table::as_maxp).unwrap();
    assert_eq!(maxp.num_glyphs().unwrap(), 12);
    let hhea = sub.table(Tag::HHEA).and_then(Table::as_hhea).unwrap();
    assert_eq!(hhea.number_of_h_metrics().unwrap(), 12);
    let loca = sub.table(Tag::LOCA).and_then(Table::as_loca).unwrap();
    assert_eq!(loca.num_glyphs(), 12);

    for (new, &old) in gids.iter().enumerate() {
        assert_eq!(glyph_bytes(&sub, new as u16), glyph_bytes(&font, old));
    }
}

#[test]
fn subset_is_read_by_other_parsers() {
    let data = tuffy();
    let gids = parse_gids("0-9,11,10");
    let out = subset(&load(&data).unwrap(), &gids, &[Tag::DSIG]);

    let original = ttf_parser::Face::parse(&data, 0).unwrap();
    let face = ttf_parser::Face::parse(&out, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 12);

    for (new, &old) in gids.iter().enumerate() {
        let (new, old) = (ttf_parser::GlyphId(new as u16), ttf_parser::GlyphId(old));
        assert_eq!(face.glyph_hor_advance(new), original.glyph_hor_advance(old));
        assert_eq!(face.glyph_hor_side_bearing(new), original.glyph_hor_side_bearing(old));
        assert_eq!(face.glyph_bounding_box(new), original.glyph_bounding_box(old));
    }

    use skrifa::instance::{Location, Size};
    use skrifa::{FontRef, GlyphId, MetadataProvider};

    let font_ref = FontRef::new(&out).unwrap();
    let location = Location::default();
    let metrics = font_ref.glyph_metrics(Size::unscaled(), &location);
    for (new, &old) in gids.iter().enumerate() {
        let advance = metrics.advance_width(GlyphId::new(new as u32));
        assert_eq!(advance, Some(metric(old).0 as f32));
    }
}

#[test]
fn closure_pulls_in_components() {
    let font = load(&tuffy()).unwrap();
    assert_eq!(composite_closure(&font, &[COMPOSITE_GLYPH]).unwrap(), [COMPOSITE_GLYPH, 3]);
    assert_eq!(composite_closure(&font, &[3, COMPOSITE_GLYPH]).unwrap(), [3, COMPOSITE_GLYPH]);
    assert_eq!(composite_closure(&font, &[4, 1]).unwrap(), [4, 1]);

    let gids = composite_closure(&font, &[0, COMPOSITE_GLYPH]).unwrap();
    let sub = load(&subset(&font, &gids, &[])).unwrap();
    assert!(sub.has_table(Tag::DSIG));
    assert_eq!(glyph_bytes(&sub, 2), glyph_bytes(&font, 3));
}

#[test]
fn empty_selection_copies_everything() {
    let data = tuffy();
    let font = load(&data).unwrap();
    let out = subset(&font, &[], &[Tag::DSIG, Tag::KERN]);

    let sub = load(&out).unwrap();
    assert_eq!(sub.num_tables(), 20);
    let face = ttf_parser::Face::parse(&out, 0).unwrap();
    assert_eq!(face.number_of_glyphs(), 197);
    assert_eq!(glyph_bytes(&sub, 196), glyph_bytes(&font, 196));
}
