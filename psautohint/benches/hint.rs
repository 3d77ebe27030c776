use criterion::{black_box, criterion_group, criterion_main, Criterion};
use psautohint::{FontContext, FontInfoMap, HintSession};

fn test_session() -> HintSession {
    let info = FontInfoMap::parse(bez_test_data::fontinfo::TEST_SANS);
    HintSession::new(FontContext::from_font_info(&info).unwrap())
}

pub fn hint_glyphs(c: &mut Criterion) {
    let mut session = test_session();
    c.bench_function("hint_all", |b| {
        b.iter(|| {
            for source in bez_test_data::bez::ALL {
                let _ = black_box(session.hint_glyph(source.as_bytes(), &mut ()));
            }
        })
    });
    c.bench_function("hint_o", |b| {
        b.iter(|| session.hint_glyph(black_box(bez_test_data::bez::O.as_bytes()), &mut ()))
    });
}

pub fn write_glyphs(c: &mut Criterion) {
    let mut session = test_session();
    let glyphs = bez_test_data::bez::ALL
        .iter()
        .filter_map(|source| session.hint_glyph(source.as_bytes(), &mut ()).ok())
        .collect::<Vec<_>>();
    c.bench_function("write_all", |b| {
        b.iter(|| {
            for glyph in &glyphs {
                black_box(psautohint::write_bez(glyph));
            }
        })
    });
}

criterion_group!(benches, hint_glyphs, write_glyphs);
criterion_main!(benches);
