//! Adaptive subdivision of cubic curves into polylines.

use bez_types::{Fixed, Point};

/// Minimum subdivision depth.
const MIN_DEPTH: u32 = 3;

/// Maximum subdivision depth.
const MAX_DEPTH: u32 = 10;

/// Capacity of the explicit subdivision stack.
///
/// Depth first subdivision keeps at most one pending piece per level.
const STACK_SIZE: usize = 32;

/// Maximum deviation of a piece from its chord, in design units.
const TOLERANCE: Fixed = Fixed::HALF;

#[derive(Copy, Clone, Default)]
struct Piece {
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
    t0: f64,
    t1: f64,
    depth: u32,
}

impl Piece {
    fn is_flat(&self) -> bool {
        // Control points against the points a third of the way along the
        // chord
        let third = |a: Fixed, b: Fixed| a + (b - a).mul_div(Fixed::ONE, Fixed::from_i32(3));
        let q1 = Point::new(third(self.p0.x, self.p3.x), third(self.p0.y, self.p3.y));
        let q2 = Point::new(third(self.p3.x, self.p0.x), third(self.p3.y, self.p0.y));
        let deviation = |p: Point<Fixed>, q: Point<Fixed>| (p.x - q.x).abs().max((p.y - q.y).abs());
        deviation(self.c1, q1) <= TOLERANCE && deviation(self.c2, q2) <= TOLERANCE
    }

    fn split(&self) -> (Self, Self) {
        let p01 = self.p0.midpoint(self.c1);
        let p12 = self.c1.midpoint(self.c2);
        let p23 = self.c2.midpoint(self.p3);
        let p012 = p01.midpoint(p12);
        let p123 = p12.midpoint(p23);
        let mid = p012.midpoint(p123);
        let t_mid = (self.t0 + self.t1) * 0.5;
        let depth = self.depth + 1;
        (
            Self {
                p0: self.p0,
                c1: p01,
                c2: p012,
                p3: mid,
                t0: self.t0,
                t1: t_mid,
                depth,
            },
            Self {
                p0: mid,
                c1: p123,
                c2: p23,
                p3: self.p3,
                t0: t_mid,
                t1: self.t1,
                depth,
            },
        )
    }
}

/// Flattens a cubic curve, calling `visit` with each polyline vertex and
/// its curve parameter.
///
/// The first call is always the start point with `t = 0` and the last is the
/// end point with `t = 1`.
pub(crate) fn flatten_curve(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
    mut visit: impl FnMut(Point<Fixed>, f64),
) {
    visit(p0, 0.0);
    let mut stack = [Piece::default(); STACK_SIZE];
    stack[0] = Piece {
        p0,
        c1,
        c2,
        p3,
        t0: 0.0,
        t1: 1.0,
        depth: 0,
    };
    let mut top = 1;
    while top > 0 {
        top -= 1;
        let piece = stack[top];
        if piece.depth >= MAX_DEPTH || (piece.depth >= MIN_DEPTH && piece.is_flat()) {
            visit(piece.p3, piece.t1);
            continue;
        }
        let (left, right) = piece.split();
        // Left is processed first
        stack[top] = right;
        stack[top + 1] = left;
        top += 2;
    }
}

/// Returns the flattened vertices of a cubic curve.
#[cfg(test)]
pub(crate) fn flatten_to_vec(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
) -> Vec<(Point<Fixed>, f64)> {
    let mut points = Vec::new();
    flatten_curve(p0, c1, c2, p3, |p, t| points.push((p, t)));
    points
}

/// Evaluates a cubic curve at `t`.
pub(crate) fn eval_cubic(
    p0: Point<Fixed>,
    c1: Point<Fixed>,
    c2: Point<Fixed>,
    p3: Point<Fixed>,
    t: f64,
) -> Point<Fixed> {
    let mt = 1.0 - t;
    let [a, b, c, d] = [mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t];
    let coord = |p0: Fixed, c1: Fixed, c2: Fixed, p3: Fixed| {
        Fixed::from_f64(
            a * p0.to_f64() + b * c1.to_f64() + c * c2.to_f64() + d * p3.to_f64(),
        )
    };
    Point::new(
        coord(p0.x, c1.x, c2.x, p3.x),
        coord(p0.y, c1.y, c2.y, p3.y),
    )
}
