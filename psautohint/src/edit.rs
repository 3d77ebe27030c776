//! Outline clean up before hinting.
//!
//! Each pass is a small scanner that visits the path elements in order and
//! records what to change; the changes are applied once the walk is done.

use bez_types::{Fixed, Point};

use crate::{
    classify,
    error::HintError,
    flatten,
    font::FontContext,
    path::{ControlPoint, ElementIx, ElementKind, Path},
    report::Reporter,
    session::GlyphState,
};

/// Upper bound on restarts after an edit asks for another check.
pub(crate) const MAX_EDIT_ROUNDS: usize = 16;

/// Turning angle above which a junction is reported as sharp.
const SHARP_ANGLE: f64 = 160.0;

/// Turning angle up to which a junction is treated as meant to be smooth.
const BEND_ANGLE: f64 = 30.0;

/// Elements shorter than this are ignored by the smoothness check.
const MIN_CHORD: Fixed = Fixed::from_i32(2);

/// Handles within this many raw units of the target are left alone.
const SMOOTH_TOLERANCE: i32 = 4;

/// Runs the edit passes until the outline stops changing.
pub(crate) fn edit_path(
    path: &mut Path,
    font: &FontContext,
    reporter: &mut Reporter,
    state: &mut GlyphState,
) -> Result<(), HintError> {
    for round in 0..MAX_EDIT_ROUNDS {
        *state = GlyphState::Editing;
        ZeroLengthScanner::default().run(path, reporter)?;
        MoveScanner::default().run(path, reporter)?;
        let mut re_check = LoopScanner::default().run(path)?;
        *state = GlyphState::Classifying;
        if font.edit_char {
            re_check |= split_s_curves(path)?;
        }
        let smooth = SmoothScanner {
            edit: font.edit_char,
            report_sharp: round == 0,
            ..Default::default()
        };
        re_check |= smooth.run(path, reporter)?;
        *state = GlyphState::Editing;
        if !re_check {
            break;
        }
        log::debug!("edit round {round} changed the outline; checking again");
    }
    if font.edit_char {
        reorder_subpaths(path)?;
    }
    path.link_close_partners();
    Ok(())
}

/// Removes lines and curves that do not move the pen.
#[derive(Default)]
struct ZeroLengthScanner {
    degenerate: Vec<ElementIx>,
}

impl ZeroLengthScanner {
    fn visit(&mut self, path: &Path, ix: ElementIx) {
        let element = path.get(ix);
        let start = path.start_point(ix);
        let is_degenerate = match element.kind {
            ElementKind::LineTo => element.end == start,
            ElementKind::CurveTo => {
                element.end == start && element.c1 == start && element.c2 == start
            }
            _ => false,
        };
        if is_degenerate {
            self.degenerate.push(ix);
        }
    }

    fn run(mut self, path: &mut Path, reporter: &mut Reporter) -> Result<(), HintError> {
        for ix in path.indices() {
            self.visit(path, ix);
        }
        for ix in self.degenerate {
            let at = path.get(ix).end;
            path.remove(ix);
            reporter.check(HintError::ZeroLengthDegenerate(at))?;
        }
        Ok(())
    }
}

/// Collapses consecutive moves and drops subpaths that draw nothing.
#[derive(Default)]
struct MoveScanner {
    duplicates: Vec<ElementIx>,
    empty: Vec<ElementIx>,
}

impl MoveScanner {
    fn visit(&mut self, path: &Path, ix: ElementIx) {
        if path.get(ix).kind != ElementKind::MoveTo {
            return;
        }
        match path.next(ix).map(|next| (next, path.get(next).kind)) {
            Some((_, ElementKind::MoveTo)) => self.duplicates.push(ix),
            Some((close, ElementKind::ClosePath)) => self.empty.extend([ix, close]),
            None => self.empty.push(ix),
            _ => {}
        }
    }

    fn run(mut self, path: &mut Path, reporter: &mut Reporter) -> Result<(), HintError> {
        for ix in path.indices() {
            self.visit(path, ix);
        }
        for ix in self.duplicates {
            let at = path.get(ix).end;
            path.remove(ix);
            reporter.check(HintError::DuplicateMoveTo(at))?;
        }
        if !self.empty.is_empty() {
            log::debug!("removing {} elements of empty subpaths", self.empty.len());
        }
        for ix in self.empty {
            path.remove(ix);
        }
        Ok(())
    }
}

/// Splits curves that return to their start point without being
/// degenerate, so that no curve ends where it starts.
#[derive(Default)]
struct LoopScanner {
    loops: Vec<(ElementIx, f64)>,
}

impl LoopScanner {
    fn visit(&mut self, path: &Path, ix: ElementIx) {
        let Some([p0, c1, c2, p3]) = path.curve_points(ix) else {
            return;
        };
        if p3 != p0 || (c1 == p0 && c2 == p0) {
            return;
        }
        // A symmetric loop can pass back through its start at the middle
        if let Some(t) = [0.5, 1.0 / 3.0]
            .into_iter()
            .find(|&t| flatten::eval_cubic(p0, c1, c2, p3, t) != p0)
        {
            self.loops.push((ix, t));
        }
    }

    /// Returns true if any curve was split.
    fn run(mut self, path: &mut Path) -> Result<bool, HintError> {
        for ix in path.indices() {
            self.visit(path, ix);
        }
        for &(ix, t) in &self.loops {
            log::debug!("splitting looped curve {ix:?} at t = {t:.3}");
            path.split_curve(ix, t)?;
        }
        Ok(!self.loops.is_empty())
    }
}

/// Splits S-curves through their reversing flat. Returns true if any
/// curve was split.
fn split_s_curves(path: &mut Path) -> Result<bool, HintError> {
    let mut split = false;
    for ix in path.indices() {
        if path.get(ix).is_flex {
            continue;
        }
        let Some([p0, c1, c2, p3]) = path.curve_points(ix) else {
            continue;
        };
        if let Some(flat) = classify::split_candidate(p0, c1, c2, p3) {
            let t = flat.t_mid();
            log::debug!(
                "splitting S-curve ending at ({}, {}) at t = {t:.3}",
                p3.x,
                p3.y
            );
            path.split_curve(ix, t)?;
            split = true;
        }
    }
    Ok(split)
}

/// The part of an element that meets a junction.
#[derive(Copy, Clone, Debug)]
struct Side {
    ix: ElementIx,
    start: Point<Fixed>,
    end: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    is_curve: bool,
    is_flex: bool,
}

impl Side {
    fn of(path: &Path, ix: ElementIx) -> Self {
        let element = path.get(ix);
        Self {
            ix,
            start: path.start_point(ix),
            end: element.end,
            c1: element.c1,
            c2: element.c2,
            is_curve: element.is_curve(),
            is_flex: element.is_flex,
        }
    }

    fn is_tiny(&self) -> bool {
        (self.end.x - self.start.x).abs().max((self.end.y - self.start.y).abs()) < MIN_CHORD
    }

    /// Direction of travel arriving at the end.
    fn incoming(&self) -> Option<(f64, f64)> {
        let from = if !self.is_curve {
            self.start
        } else if self.c2 != self.end {
            self.c2
        } else if self.c1 != self.end {
            self.c1
        } else {
            self.start
        };
        unit(from, self.end)
    }

    /// Direction of travel leaving the start.
    fn outgoing(&self) -> Option<(f64, f64)> {
        let to = if !self.is_curve {
            self.end
        } else if self.c1 != self.start {
            self.c1
        } else if self.c2 != self.start {
            self.c2
        } else {
            self.end
        };
        unit(self.start, to)
    }
}

fn unit(from: Point<Fixed>, to: Point<Fixed>) -> Option<(f64, f64)> {
    let (fx, fy) = from.to_f64();
    let (tx, ty) = to.to_f64();
    let (dx, dy) = (tx - fx, ty - fy);
    let len = dx.hypot(dy);
    (len > 0.0).then(|| (dx / len, dy / len))
}

/// Measures the turning angle at every junction. Sharp junctions are
/// reported, curve junctions past the bend limit are flagged for smoothing
/// and the handles of nearly smooth ones are aligned.
#[derive(Default)]
struct SmoothScanner {
    edit: bool,
    report_sharp: bool,
    sharp: Vec<Point<Fixed>>,
    /// Curve junctions bending past the smooth limit.
    rough: Vec<Point<Fixed>>,
    moves: Vec<(ElementIx, ControlPoint, Point<Fixed>)>,
}

impl SmoothScanner {
    fn visit(&mut self, a: &Side, b: &Side) {
        if a.is_tiny() || b.is_tiny() || a.is_flex || b.is_flex {
            return;
        }
        let (Some(u), Some(v)) = (a.incoming(), b.outgoing()) else {
            return;
        };
        let angle = (u.0 * v.0 + u.1 * v.1).clamp(-1.0, 1.0).acos().to_degrees();
        if angle > SHARP_ANGLE {
            self.sharp.push(a.end);
            return;
        }
        if !(a.is_curve || b.is_curve) {
            return;
        }
        if angle > BEND_ANGLE {
            self.rough.push(a.end);
            return;
        }
        if !self.edit || angle <= 0.0 {
            return;
        }
        let tangent = match (a.is_curve, b.is_curve) {
            (true, true) => {
                let sum = (u.0 + v.0, u.1 + v.1);
                let len = sum.0.hypot(sum.1);
                if len == 0.0 {
                    return;
                }
                (sum.0 / len, sum.1 / len)
            }
            (false, _) => u,
            (_, false) => v,
        };
        let place = |anchor: Point<Fixed>, handle: Point<Fixed>, sign: f64| {
            let (ax, ay) = anchor.to_f64();
            let (hx, hy) = handle.to_f64();
            let len = (hx - ax).hypot(hy - ay);
            Point::new(
                Fixed::from_f64(ax + sign * tangent.0 * len),
                Fixed::from_f64(ay + sign * tangent.1 * len),
            )
        };
        if a.is_curve && a.c2 != a.end {
            let target = place(a.end, a.c2, -1.0);
            self.propose(a.ix, ControlPoint::Curve2, a.c2, target);
        }
        if b.is_curve && b.c1 != b.start {
            let target = place(b.start, b.c1, 1.0);
            self.propose(b.ix, ControlPoint::Curve1, b.c1, target);
        }
    }

    fn propose(
        &mut self,
        ix: ElementIx,
        which: ControlPoint,
        current: Point<Fixed>,
        target: Point<Fixed>,
    ) {
        let deviation = (target.x - current.x)
            .abs()
            .max((target.y - current.y).abs())
            .to_bits();
        if deviation > SMOOTH_TOLERANCE {
            self.moves.push((ix, which, target));
        }
    }

    /// Returns true if any handle moved.
    fn run(mut self, path: &mut Path, reporter: &mut Reporter) -> Result<bool, HintError> {
        for (mv, close) in path.subpaths() {
            let mut sides = Vec::new();
            let mut cursor = path.next(mv);
            while let Some(ix) = cursor {
                if ix == close {
                    break;
                }
                sides.push(Side::of(path, ix));
                cursor = path.next(ix);
            }
            let Some(last) = sides.last().copied() else {
                continue;
            };
            // The implicit closing line joins the subpath end to its start
            let start = path.get(mv).end;
            if last.end != start {
                sides.push(Side {
                    ix: close,
                    start: last.end,
                    end: start,
                    c1: start,
                    c2: start,
                    is_curve: false,
                    is_flex: false,
                });
            }
            if sides.len() < 2 {
                continue;
            }
            for (i, a) in sides.iter().enumerate() {
                self.visit(a, &sides[(i + 1) % sides.len()]);
            }
        }
        if self.report_sharp {
            for at in self.sharp {
                reporter.check(HintError::SharpAngle(at))?;
            }
            for at in self.rough {
                reporter.warning(format!(
                    "junction at ({}, {}) may need smoothing",
                    at.x, at.y
                ));
            }
        }
        let moved = !self.moves.is_empty();
        for (ix, which, to) in self.moves {
            log::debug!("smoothing {which:?} of {ix:?} to ({}, {})", to.x, to.y);
            path.move_point(ix, which, to)?;
        }
        Ok(moved)
    }
}

/// Moves each subpath enclosed by a later one to the end of the path.
fn reorder_subpaths(path: &mut Path) -> Result<(), HintError> {
    let subpaths = path
        .subpaths()
        .into_iter()
        .filter_map(|(mv, close)| Some((mv, path.bounds_of(mv, close)?)))
        .collect::<Vec<_>>();
    for (i, (mv, bounds)) in subpaths.iter().enumerate() {
        if subpaths[i + 1..]
            .iter()
            .any(|(_, later)| later.strictly_contains(bounds))
        {
            log::debug!("moving enclosed subpath {mv:?} to the end");
            path.move_subpath_to_end(*mv)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        path::testing::{kinds_and_ends, path_from},
        report::testing::RecordingSink,
        Level,
    };
    use pretty_assertions::assert_eq;
    use ElementKind::*;

    fn edit(path: &mut Path, font: &FontContext, sink: &mut RecordingSink) -> Result<(), HintError> {
        let mut reporter = Reporter::new(sink);
        let mut state = GlyphState::Idle;
        let result = edit_path(path, font, &mut reporter, &mut state);
        reporter.finish();
        assert_eq!(state, GlyphState::Editing);
        result
    }

    #[test]
    fn zero_length_line_removed() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[0, 0]),
            ('L', &[100, 0]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        let lines = path.iter().filter(|(_, e)| e.kind == LineTo).count();
        assert_eq!(lines, 1);
        assert_eq!(sink.errors[0], HintError::ZeroLengthDegenerate(Point::ZERO));
        // What remains is a line doubling back along itself
        assert!(sink.errors[1..]
            .iter()
            .all(|e| matches!(e, HintError::SharpAngle(_))));
    }

    #[test]
    fn zero_length_removal_is_idempotent() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[0, 0]),
            ('C', &[0, 0, 0, 0, 0, 0]),
            ('L', &[50, 0]),
            ('L', &[50, 0]),
            ('L', &[50, 50]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink::default();
        let mut reporter = Reporter::new(&mut sink);
        ZeroLengthScanner::default().run(&mut path, &mut reporter).unwrap();
        let once = kinds_and_ends(&path);
        ZeroLengthScanner::default().run(&mut path, &mut reporter).unwrap();
        assert_eq!(kinds_and_ends(&path), once);
        assert_eq!(
            once,
            [
                (MoveTo, Point::ZERO),
                (LineTo, Point::from_i32(50, 0)),
                (LineTo, Point::from_i32(50, 50)),
                (ClosePath, Point::ZERO),
            ]
        );
    }

    #[test]
    fn duplicate_and_empty_moves() {
        let mut path = path_from(&[
            ('M', &[10, 10]),
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('L', &[100, 100]),
            ('Z', &[]),
            ('M', &[300, 300]),
            ('Z', &[]),
            ('M', &[400, 400]),
        ]);
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        assert_eq!(
            kinds_and_ends(&path),
            [
                (MoveTo, Point::ZERO),
                (LineTo, Point::from_i32(100, 0)),
                (LineTo, Point::from_i32(100, 100)),
                (ClosePath, Point::ZERO),
            ]
        );
        assert_eq!(
            sink.errors,
            [HintError::DuplicateMoveTo(Point::from_i32(10, 10))]
        );
        path.validate().unwrap();
    }

    #[test]
    fn s_curve_is_split() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('C', &[50, 100, 50, -100, 100, 0]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        let curves = path
            .iter()
            .filter(|(_, e)| e.is_curve())
            .map(|(_, e)| e.end)
            .collect::<Vec<_>>();
        assert_eq!(curves.len(), 2);
        let (x, y) = curves[0].to_f64();
        assert!((x - 50.0).abs() < 3.0 && y.abs() < 3.0, "split at ({x}, {y})");
        path.validate().unwrap();
    }

    #[test]
    fn s_curve_kept_without_edit_char() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('C', &[50, 100, 50, -100, 100, 0]),
            ('Z', &[]),
        ]);
        let font = FontContext {
            edit_char: false,
            ..Default::default()
        };
        edit(&mut path, &font, &mut RecordingSink::default()).unwrap();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn sharp_angle_reported_once() {
        // A spike that doubles back on itself
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[200, 0]),
            ('L', &[0, 10]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        assert_eq!(sink.errors, [HintError::SharpAngle(Point::from_i32(200, 0))]);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn nearly_smooth_handle_is_aligned() {
        // The curve leaves the line's end 20 degrees off its direction
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('C', &[194, 34, 200, 100, 200, 200]),
            ('L', &[0, 200]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        let curve = path.indices()[2];
        let c1 = path.get(curve).c1;
        assert_eq!(c1.y, Fixed::ZERO);
        // Handle length is kept
        assert!((c1.x.to_f64() - 200.0).abs() < 0.1, "{c1:?}");
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn corners_are_not_smoothed() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('C', &[100, 50, 150, 100, 200, 100]),
            ('L', &[0, 100]),
            ('Z', &[]),
        ]);
        let before = path.get(path.indices()[2]).clone();
        edit(&mut path, &FontContext::default(), &mut RecordingSink::default()).unwrap();
        assert_eq!(path.get(path.indices()[2]), &before);
    }

    #[test]
    fn bent_curve_junction_is_flagged() {
        // The curve leaves the line's end 60 degrees off its direction
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('C', &[150, 87, 200, 150, 200, 300]),
            ('L', &[0, 300]),
            ('Z', &[]),
        ]);
        let before = kinds_and_ends(&path);
        let curve = path.get(path.indices()[2]).clone();
        let mut sink = RecordingSink::default();
        edit(&mut path, &FontContext::default(), &mut sink).unwrap();
        assert_eq!(kinds_and_ends(&path), before);
        assert_eq!(path.get(path.indices()[2]), &curve);
        assert!(sink.errors.is_empty());
        let warnings = sink
            .messages
            .iter()
            .filter(|(level, _)| *level == Level::Warning)
            .map(|(_, message)| message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            warnings,
            [
                "junction at (100, 0) may need smoothing",
                "junction at (200, 300) may need smoothing",
            ]
        );
    }

    #[test]
    fn looped_curve_is_split() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('C', &[300, 400, -300, 400, 0, 0]),
            ('Z', &[]),
        ]);
        edit(&mut path, &FontContext::default(), &mut RecordingSink::default()).unwrap();
        let ends = path
            .iter()
            .filter(|(_, e)| e.is_curve())
            .map(|(_, e)| e.end)
            .collect::<Vec<_>>();
        assert_eq!(ends, [Point::from_i32(0, 300), Point::ZERO]);
        path.validate().unwrap();
    }

    #[test]
    fn enclosed_subpath_moves_last() {
        let mut path = path_from(&[
            ('M', &[100, 100]),
            ('L', &[100, 600]),
            ('L', &[400, 600]),
            ('L', &[400, 100]),
            ('Z', &[]),
            ('M', &[0, 0]),
            ('L', &[500, 0]),
            ('L', &[500, 700]),
            ('L', &[0, 700]),
            ('Z', &[]),
        ]);
        edit(&mut path, &FontContext::default(), &mut RecordingSink::default()).unwrap();
        let moves = path
            .iter()
            .filter(|(_, e)| e.kind == MoveTo)
            .map(|(_, e)| e.end)
            .collect::<Vec<_>>();
        assert_eq!(moves, [Point::ZERO, Point::from_i32(100, 100)]);
        path.validate().unwrap();
    }

    #[test]
    fn escalated_diagnostic_aborts() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[0, 0]),
            ('L', &[100, 0]),
            ('Z', &[]),
        ]);
        let mut sink = RecordingSink {
            escalate: Some(crate::Severity::NonFatal),
            ..Default::default()
        };
        assert_eq!(
            edit(&mut path, &FontContext::default(), &mut sink),
            Err(HintError::ZeroLengthDegenerate(Point::ZERO))
        );
    }
}
