//! Direction and flatness analysis of curves.
//!
//! A curve is flattened and each axis runs a small state machine over the
//! resulting polyline. The y machine looks for runs where the curve travels
//! mostly along x (candidates for horizontal stem edges) and the x machine
//! does the same for vertical edges.

use bez_types::{Fixed, Point};

use crate::{error::HintError, flatten::flatten_curve};

/// Slope limit, times 100, below which a step counts as flat.
pub(crate) const S_CURVE_TAN: i64 = 25;

/// Minimum distance between a flat and the ends of its curve.
pub(crate) const SDELTA: Fixed = Fixed::from_i32(8);

/// Minimum length of a flat.
pub(crate) const SDELTA3: Fixed = Fixed::from_i32(10);

/// Axis across which a machine measures direction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Axis {
    /// Direction changes in x; flats are vertical.
    X,
    /// Direction changes in y; flats are horizontal.
    Y,
}

impl Axis {
    /// Coordinate that a flat on this axis is located at.
    pub(crate) fn across(self, p: Point<Fixed>) -> Fixed {
        match self {
            Self::X => p.x,
            Self::Y => p.y,
        }
    }

    /// Coordinate that a flat on this axis extends along.
    pub(crate) fn along(self, p: Point<Fixed>) -> Fixed {
        match self {
            Self::X => p.y,
            Self::Y => p.x,
        }
    }
}

/// Returns true if a step of the given deltas is within the flat slope.
pub(crate) fn is_flat_step(across: Fixed, along: Fixed) -> bool {
    (across.to_bits() as i64).abs() * 100 < (along.to_bits() as i64).abs() * S_CURVE_TAN
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Direction {
    Starting,
    Up,
    Down,
}

/// A run of a flattened curve that is flat on one axis.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct Flat {
    pub axis: Axis,
    pub start: Point<Fixed>,
    pub end: Point<Fixed>,
    pub t_start: f64,
    pub t_end: f64,
    /// True if travel across the axis reversed inside the run.
    pub reversed: bool,
    /// Range covered across the axis while the run was open.
    pub extent: Fixed,
}

impl Flat {
    /// Location of the flat across its axis.
    pub fn location(&self) -> Fixed {
        let (a, b) = (self.axis.across(self.start), self.axis.across(self.end));
        Fixed::from_bits(((a.to_bits() as i64 + b.to_bits() as i64) / 2) as i32)
    }

    /// Ordered extent of the flat along its axis.
    pub fn span(&self) -> (Fixed, Fixed) {
        let (a, b) = (self.axis.along(self.start), self.axis.along(self.end));
        (a.min(b), a.max(b))
    }

    /// Curve parameter midway through the flat.
    pub fn t_mid(&self) -> f64 {
        (self.t_start + self.t_end) * 0.5
    }

    /// True if the run is long enough and clear of the curve ends to
    /// produce a stem edge.
    pub fn is_interior(&self, p0: Point<Fixed>, p3: Point<Fixed>) -> bool {
        let (lo, hi) = self.span();
        if hi - lo <= SDELTA3 {
            return false;
        }
        let along = |p| self.axis.along(p);
        [self.start, self.end].iter().all(|&p| {
            (along(p) - along(p0)).abs() >= SDELTA && (along(p) - along(p3)).abs() >= SDELTA
        })
    }
}

#[derive(Copy, Clone, Debug)]
struct Run {
    start: (Point<Fixed>, f64),
    last_flat: (Point<Fixed>, f64),
    reversed: bool,
    lo: Fixed,
    hi: Fixed,
}

/// State machine for one axis.
#[derive(Clone, Debug)]
pub(crate) struct AxisClassifier {
    axis: Axis,
    start_dir: Direction,
    state: Direction,
    prev: Option<(Point<Fixed>, f64)>,
    run: Option<Run>,
    done: Option<Flat>,
}

impl AxisClassifier {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            start_dir: Direction::Starting,
            state: Direction::Starting,
            prev: None,
            run: None,
            done: None,
        }
    }

    pub fn visit(&mut self, p: Point<Fixed>, t: f64) {
        let Some(prev) = self.prev else {
            self.prev = Some((p, t));
            return;
        };
        if prev.0 == p || self.done.is_some() {
            self.prev = Some((p, t));
            return;
        }
        self.prev = Some((p, t));
        let across = self.axis.across(p) - self.axis.across(prev.0);
        let along = self.axis.along(p) - self.axis.along(prev.0);
        let step_dir = match across.signum() {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => self.state,
        };
        if self.start_dir == Direction::Starting && step_dir != Direction::Starting {
            self.start_dir = step_dir;
        }
        self.state = step_dir;
        let reversal = step_dir != Direction::Starting && step_dir != self.start_dir;
        let flat = is_flat_step(across, along);
        let across_p = self.axis.across(p);
        match self.run.as_mut() {
            None => {
                if flat || reversal {
                    let across_prev = self.axis.across(prev.0);
                    self.run = Some(Run {
                        start: prev,
                        last_flat: if flat { (p, t) } else { prev },
                        reversed: reversal,
                        lo: across_prev.min(across_p),
                        hi: across_prev.max(across_p),
                    });
                }
            }
            Some(run) => {
                run.lo = run.lo.min(across_p);
                run.hi = run.hi.max(across_p);
                if flat {
                    run.last_flat = (p, t);
                    run.reversed |= reversal;
                } else if reversal {
                    run.reversed = true;
                } else {
                    // Steep again in the starting direction
                    self.close_run();
                }
            }
        }
    }

    /// Completes the analysis, returning the first flat found.
    pub fn finish(mut self) -> Option<Flat> {
        if self.done.is_none() {
            self.close_run();
        }
        self.done
    }

    fn close_run(&mut self) {
        if let Some(run) = self.run.take() {
            self.done = Some(Flat {
                axis: self.axis,
                start: run.start.0,
                end: run.last_flat.0,
                t_start: run.start.1,
                t_end: run.last_flat.1,
                reversed: run.reversed,
                extent: run.hi - run.lo,
            });
        }
    }
}

/// Flats found on each axis of a curve.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub(crate) struct CurveFlats {
    /// Flat in y, producing a horizontal edge.
    pub horizontal: Option<Flat>,
    /// Flat in x, producing a vertical edge.
    pub vertical: Option<Flat>,
}

/// Runs both axis machines over a curve.
pub(crate) fn classify_curve(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
) -> CurveFlats {
    let mut y = AxisClassifier::new(Axis::Y);
    let mut x = AxisClassifier::new(Axis::X);
    flatten_curve(p0, c1, c2, p3, |p, t| {
        y.visit(p, t);
        x.visit(p, t);
    });
    CurveFlats {
        horizontal: y.finish(),
        vertical: x.finish(),
    }
}

/// Turning signs of the two halves of the control polygon.
///
/// Each value is the sign of the cross product of consecutive control
/// polygon edges: `(P0, C1, C2)` and `(C1, C2, P3)`.
pub(crate) fn s_curve_signs(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
) -> (i32, i32) {
    fn turn(a: Point<Fixed>, b: Point<Fixed>, c: Point<Fixed>) -> i32 {
        let (abx, aby) = (
            (b.x - a.x).to_bits() as i64,
            (b.y - a.y).to_bits() as i64,
        );
        let (bcx, bcy) = (
            (c.x - b.x).to_bits() as i64,
            (c.y - b.y).to_bits() as i64,
        );
        (abx * bcy - aby * bcx).signum() as i32
    }
    (turn(p0, c1, c2), turn(c1, c2, p3))
}

/// True if the control polygon turns both ways.
pub(crate) fn is_s_curve(p0: Point<Fixed>, c1: Point<Fixed>, c2: Point<Fixed>, p3: Point<Fixed>) -> bool {
    let (d0, d1) = s_curve_signs(p0, c1, c2, p3);
    d0 * d1 < 0
}

/// Returns a flat whose reversal is deep enough that the curve should be
/// split through it.
pub(crate) fn split_candidate(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
) -> Option<Flat> {
    if !is_s_curve(p0, c1, c2, p3) {
        return None;
    }
    let flats = classify_curve(p0, c1, c2, p3);
    [flats.horizontal, flats.vertical]
        .into_iter()
        .flatten()
        .find(|flat| flat.reversed && flat.extent > SDELTA && flat.t_start < flat.t_end)
}

/// Locates the flat of a curve on the requested axis without producing
/// any segments.
pub fn inflection_point(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
    axis: Axis,
) -> Result<Fixed, HintError> {
    let flats = classify_curve(p0, c1, c2, p3);
    let flat = match axis {
        Axis::X => flats.vertical,
        Axis::Y => flats.horizontal,
    };
    flat.filter(|flat| flat.is_interior(p0, p3))
        .map(|flat| flat.location())
        .ok_or(HintError::InflectionFindFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: [i32; 8]) -> [Point<Fixed>; 4] {
        [
            Point::from_i32(coords[0], coords[1]),
            Point::from_i32(coords[2], coords[3]),
            Point::from_i32(coords[4], coords[5]),
            Point::from_i32(coords[6], coords[7]),
        ]
    }

    const S5: [i32; 8] = [0, 0, 50, 100, 50, -100, 100, 0];
    const ARCH: [i32; 8] = [0, 0, 0, 400, 400, 400, 400, 0];

    #[test]
    fn s_curve_detection() {
        let [p0, c1, c2, p3] = pts(S5);
        assert!(is_s_curve(p0, c1, c2, p3));
        let [p0, c1, c2, p3] = pts(ARCH);
        assert!(!is_s_curve(p0, c1, c2, p3));
        // The relative form of the same offsets is also an S
        let [p0, c1, c2, p3] = pts([0, 0, 50, 100, 100, 0, 200, 0]);
        assert!(is_s_curve(p0, c1, c2, p3));
    }

    #[test]
    fn reversed_curve_negates_signs() {
        for coords in [S5, ARCH, [0, 0, 10, 30, 70, -20, 90, 5]] {
            let [p0, c1, c2, p3] = pts(coords);
            let (d0, d1) = s_curve_signs(p0, c1, c2, p3);
            assert_eq!(s_curve_signs(p3, c2, c1, p0), (-d1, -d0));
        }
    }

    #[test]
    fn arch_has_interior_flat() {
        let [p0, c1, c2, p3] = pts(ARCH);
        let flats = classify_curve(p0, c1, c2, p3);
        let flat = flats.horizontal.unwrap();
        assert!(flat.reversed);
        assert!(flat.is_interior(p0, p3));
        // Peak of the arch is at y = 300
        let location = flat.location().to_f64();
        assert!((285.0..=300.0).contains(&location), "{location}");
        let (lo, hi) = flat.span();
        assert!(lo < Fixed::from_i32(200) && hi > Fixed::from_i32(200));
    }

    #[test]
    fn quarter_ellipse_flat_touches_the_end() {
        let [p0, c1, c2, p3] = pts([350, 0, 543, 0, 700, 157, 700, 350]);
        let flats = classify_curve(p0, c1, c2, p3);
        let flat = flats.horizontal.unwrap();
        assert_eq!(flat.start, p0);
        assert!(!flat.is_interior(p0, p3));
    }

    #[test]
    fn s_curve_split_at_middle() {
        let [p0, c1, c2, p3] = pts(S5);
        let flat = split_candidate(p0, c1, c2, p3).unwrap();
        assert_eq!(flat.axis, Axis::Y);
        assert!((flat.t_mid() - 0.5).abs() < 0.02, "{}", flat.t_mid());
        assert!(flat.extent > SDELTA);
    }

    #[test]
    fn inflection_probe() {
        let [p0, c1, c2, p3] = pts(S5);
        let location = inflection_point(p0, c1, c2, p3, Axis::Y).unwrap();
        assert!(location.abs() < Fixed::from_i32(2), "{location}");
        let [p0, c1, c2, p3] = pts([0, 0, 100, 0, 200, 0, 300, 0]);
        assert_eq!(
            inflection_point(p0, c1, c2, p3, Axis::X),
            Err(HintError::InflectionFindFailed)
        );
    }

    #[test]
    fn flat_steps() {
        assert!(is_flat_step(Fixed::from_i32(1), Fixed::from_i32(5)));
        assert!(!is_flat_step(Fixed::from_i32(1), Fixed::from_i32(4)));
        assert!(!is_flat_step(Fixed::ZERO, Fixed::ZERO));
    }
}
