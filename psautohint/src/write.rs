//! Serialising hinted glyphs to bez text.

use std::fmt::Write;

use bez_types::{Fixed, Point};
use read_bez::Operator;

use crate::{
    path::Hint,
    session::{HintedGlyph, OutlineCommand},
};

/// Writes a hinted glyph as a bez program.
///
/// Main hints follow `sc`. Each local hint group is written as a
/// `beginsubr snc … endsubr enc newcolors` block, holding the main hints
/// and the group, ahead of the command where it takes effect. Path
/// commands are relative and flex pairs are bracketed by `preflx1` and
/// `preflx2`. Values are written to two decimal places.
pub fn write_bez(glyph: &HintedGlyph) -> String {
    let mut writer = BezWriter::default();
    if let Some(name) = &glyph.name {
        writer.line(format_args!("% {name}"));
    }
    writer.op(Operator::StartChar);
    writer.hints(&glyph.main_hints);
    let mut groups = glyph.local_hints.iter().peekable();
    for (ordinal, command) in glyph.outline.iter().enumerate() {
        while let Some(group) = groups.next_if(|group| group.ordinal == ordinal) {
            writer.line(format_args!(
                "{} {}",
                Operator::BeginSubr,
                Operator::StartNewColors
            ));
            writer.hints(&glyph.main_hints);
            writer.hints(&group.hints);
            writer.line(format_args!("{} {}", Operator::EndSubr, Operator::EndNewColors));
            writer.op(Operator::NewColors);
        }
        if ends_flex_pair(&glyph.outline, ordinal + 1) {
            writer.op(Operator::PreFlex1);
        }
        writer.command(command);
        if ends_flex_pair(&glyph.outline, ordinal) {
            writer.op(Operator::PreFlex2);
        }
    }
    writer.op(Operator::EndChar);
    writer.out
}

/// True if the command at `ordinal` is a flex curve following a plain one.
fn ends_flex_pair(outline: &[OutlineCommand], ordinal: usize) -> bool {
    ordinal > 0
        && matches!(
            outline.get(ordinal),
            Some(OutlineCommand::CurveTo { flex: true, .. })
        )
        && matches!(
            outline[ordinal - 1],
            OutlineCommand::CurveTo { flex: false, .. }
        )
}

/// Coordinates in hundredths, so relative moves accumulate exactly.
type Hundredths = (i64, i64);

#[derive(Default)]
struct BezWriter {
    out: String,
    pos: Hundredths,
}

impl BezWriter {
    fn line(&mut self, args: std::fmt::Arguments) {
        // Writing to a string cannot fail
        let _ = self.out.write_fmt(args);
        self.out.push('\n');
    }

    fn op(&mut self, op: Operator) {
        self.line(format_args!("{op}"));
    }

    fn hints(&mut self, hints: &[Hint]) {
        for hint in hints {
            self.line(format_args!(
                "{} {} {}",
                number(hundredths(hint.lo)),
                number(hundredths(hint.hi)),
                hint.kind.operator()
            ));
        }
    }

    /// Writes `points` relative to each other, starting from the pen.
    fn relative(&mut self, points: &[Point<Fixed>], op: Operator) {
        let mut text = String::new();
        for point in points {
            let target = (hundredths(point.x), hundredths(point.y));
            let _ = write!(
                text,
                "{} {} ",
                number(target.0 - self.pos.0),
                number(target.1 - self.pos.1)
            );
            self.pos = target;
        }
        self.line(format_args!("{text}{op}"));
    }

    fn command(&mut self, command: &OutlineCommand) {
        match command {
            OutlineCommand::MoveTo(p) => self.relative(&[*p], Operator::RMoveTo),
            OutlineCommand::LineTo(p) => self.relative(&[*p], Operator::RLineTo),
            OutlineCommand::CurveTo { c1, c2, end, .. } => {
                self.relative(&[*c1, *c2, *end], Operator::RCurveTo)
            }
            OutlineCommand::Close => self.op(Operator::ClosePath),
        }
    }
}

fn hundredths(value: Fixed) -> i64 {
    (value.to_f64() * 100.0).round() as i64
}

fn number(value: i64) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let (whole, frac) = (value.abs() / 100, value.abs() % 100);
    match frac {
        0 => format!("{sign}{whole}"),
        f if f % 10 == 0 => format!("{sign}{whole}.{}", f / 10),
        f => format!("{sign}{whole}.{f:02}"),
    }
}
