#![no_main]
use bez_types::Fixed;
use libfuzzer_sys::fuzz_target;
use read_bez::{CommandSink, HintKind};

/// The sink for when you don't really care what gets evaluated
struct NopSink;

impl CommandSink for NopSink {
    fn move_to(&mut self, _x: Fixed, _y: Fixed) {
        // nop
    }

    fn line_to(&mut self, _x: Fixed, _y: Fixed) {
        // nop
    }

    fn curve_to(&mut self, _cx0: Fixed, _cy0: Fixed, _cx1: Fixed, _cy1: Fixed, _x: Fixed, _y: Fixed) {
        // nop
    }

    fn close(&mut self) {
        // nop
    }

    fn hint(&mut self, _kind: HintKind, _lo: Fixed, _hi: Fixed) {
        // nop
    }
}

fuzz_target!(|data: &[u8]| {
    let plain = read_bez::decrypt::decode(data);
    let _ = read_bez::evaluate(&plain, &mut NopSink);
});
