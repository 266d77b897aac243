use std::env;

use sfnt_builder::factory::FontFactory;
use sfnt_builder::subset::{composite_closure, Subsetter};
use sfnt_builder::Tag;

fn parse_gids(gids: &str) -> Vec<u16> {
    if gids == "*" {
        return vec![];
    }

    let split = gids.split(',').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    let mut gids = vec![];

    for el in &split {
        if el.contains('-') {
            let range = el.split('-').collect::<Vec<_>>();
            let first = range[0].parse::<u16>().unwrap();
            let second = range[1].parse::<u16>().unwrap();

            gids.extend(first..=second);
        } else {
            gids.push(el.parse::<u16>().unwrap());
        }
    }

    gids
}

// Note that this is more of an experimental CLI used for testing.
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data = std::fs::read(&args[1]).unwrap();
    let factory = FontFactory::new();
    let font = factory.load_fonts_from_bytes(&data).unwrap().remove(0);

    let gids = parse_gids(args.get(3).to_owned().unwrap_or(&"0-5".to_owned()));
    let gids = composite_closure(&font, &gids).unwrap();

    let mut subsetter = Subsetter::new(&font, &factory);
    subsetter.set_glyphs(&gids);
    subsetter.set_remove_tables(&[Tag::DSIG]);
    let sub = subsetter.subset().unwrap().build().unwrap();

    let mut out = vec![];
    factory.serialize_font(&sub, &mut out).unwrap();
    std::fs::write(args.get(2).unwrap_or(&"res.ttf".to_owned()), out).unwrap();
}
