#![no_main]
use libfuzzer_sys::fuzz_target;
use psautohint::{FontContext, FontInfoMap, HintSession};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let info = FontInfoMap::parse(text);
    if let Ok(font) = FontContext::from_font_info(&info) {
        let mut session = HintSession::new(font);
        let _ = session.hint_glyph(b"% O sc 0 0 mt 100 0 rdt 0 100 rdt cp ed", &mut ());
    }
});
