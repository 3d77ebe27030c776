#![no_main]
use libfuzzer_sys::{
    arbitrary::{self, Arbitrary},
    fuzz_target,
};
use psautohint::{FontContext, HintSession, Severity};

/// Font options that change which passes run.
#[derive(Debug, Arbitrary)]
struct Options {
    flex_ok: bool,
    flex_strict: bool,
    edit_char: bool,
    report_curve_stems: bool,
    round_to_int: bool,
}

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    options: Options,
    glyph: &'a [u8],
}

fuzz_target!(|input: Input| {
    let font = FontContext {
        flex_ok: input.options.flex_ok,
        flex_strict: input.options.flex_strict,
        edit_char: input.options.edit_char,
        report_curve_stems: input.options.report_curve_stems,
        round_to_int: input.options.round_to_int,
        ..Default::default()
    };
    let mut session = HintSession::new(font);
    match session.hint_glyph(input.glyph, &mut ()) {
        Ok(glyph) => {
            let text = psautohint::write_bez(&glyph);
            let _ = session.hint_glyph(text.as_bytes(), &mut ());
        }
        Err(e) => assert!(e.default_severity() > Severity::Ok || session.is_poisoned()),
    }
    assert_eq!(session.arena_used(), 0);
});
