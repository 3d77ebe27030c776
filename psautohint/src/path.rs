//! Index linked glyph outline.
//!
//! Elements live in the per-glyph [`Arena`] and are chained through
//! `prev`/`next` indices, so splicing, splitting and reordering only rewrite
//! links.

use std::collections::HashMap;

use bez_types::{BoundingBox, Fixed, Point};
use read_bez::HintKind;

use crate::{arena::Arena, error::HintError, flatten};

/// Index of an element in the arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct ElementIx(pub(crate) u32);

/// Index of a hint record in the arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) struct HintIx(pub(crate) u32);

/// Kind of a path element.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum ElementKind {
    MoveTo,
    LineTo,
    CurveTo,
    ClosePath,
}

/// A single path element.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct PathElement {
    pub kind: ElementKind,
    /// Absolute end point. A close path repeats the start of its subpath.
    pub end: Point<Fixed>,
    /// First control point of a curve.
    pub c1: Point<Fixed>,
    /// Second control point of a curve.
    pub c2: Point<Fixed>,
    /// Set on the second curve of a flex pair.
    pub is_flex: bool,
    pub prev: Option<ElementIx>,
    pub next: Option<ElementIx>,
    /// The move that starts the subpath ended by this close path.
    pub close_partner: Option<ElementIx>,
    /// Head of the local hints attached to this element.
    pub hints: Option<HintIx>,
}

impl PathElement {
    pub fn new(kind: ElementKind, end: Point<Fixed>) -> Self {
        Self {
            kind,
            end,
            c1: end,
            c2: end,
            is_flex: false,
            prev: None,
            next: None,
            close_partner: None,
            hints: None,
        }
    }

    pub fn curve(c1: Point<Fixed>, c2: Point<Fixed>, end: Point<Fixed>) -> Self {
        Self {
            c1,
            c2,
            ..Self::new(ElementKind::CurveTo, end)
        }
    }

    pub fn is_curve(&self) -> bool {
        self.kind == ElementKind::CurveTo
    }
}

/// Selects a point of an element for [`Path::move_point`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ControlPoint {
    Curve1,
    Curve2,
    End,
}

/// An emitted stem hint.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hint {
    pub kind: HintKind,
    /// Lower edge.
    pub lo: Fixed,
    /// Upper edge. Equal to `lo` for ghost hints.
    pub hi: Fixed,
    /// Ordinal of the element that produced the lower edge.
    pub path_ix1: usize,
    /// Ordinal of the element that produced the upper edge.
    pub path_ix2: usize,
    /// True for one sided hints anchoring an alignment zone edge.
    pub ghost: bool,
}

impl Hint {
    /// Distance between the edges.
    pub fn width(&self) -> Fixed {
        self.hi - self.lo
    }

    /// Location and width as delivered to a report sink.
    pub fn reported(&self) -> (Fixed, Fixed) {
        if self.ghost {
            let width = match self.kind {
                HintKind::Top => -20,
                _ => -21,
            };
            (self.lo, Fixed::from_i32(width))
        } else {
            (self.lo, self.width())
        }
    }
}

/// Node of a singly linked hint list.
#[derive(Clone, Debug)]
pub(crate) struct HintNode {
    pub hint: Hint,
    pub next: Option<HintIx>,
}

/// A glyph outline.
#[derive(Clone, Debug)]
pub(crate) struct Path {
    arena: Arena,
    head: Option<ElementIx>,
    tail: Option<ElementIx>,
    len: usize,
    main_hints: Option<HintIx>,
}

impl Path {
    pub fn new(arena_capacity: usize) -> Self {
        Self {
            arena: Arena::new(arena_capacity),
            head: None,
            tail: None,
            len: 0,
            main_hints: None,
        }
    }

    /// Empties the path and releases the arena.
    pub fn reset(&mut self) {
        self.arena.reset();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.main_hints = None;
    }

    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn head(&self) -> Option<ElementIx> {
        self.head
    }

    pub fn tail(&self) -> Option<ElementIx> {
        self.tail
    }

    pub fn get(&self, ix: ElementIx) -> &PathElement {
        self.arena.element(ix)
    }

    pub fn get_mut(&mut self, ix: ElementIx) -> &mut PathElement {
        self.arena.element_mut(ix)
    }

    pub fn next(&self, ix: ElementIx) -> Option<ElementIx> {
        self.get(ix).next
    }

    pub fn prev(&self, ix: ElementIx) -> Option<ElementIx> {
        self.get(ix).prev
    }

    /// Iterates the linked elements in order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementIx, &PathElement)> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let ix = cursor?;
            let element = self.get(ix);
            cursor = element.next;
            Some((ix, element))
        })
    }

    /// Returns the element indices in path order.
    pub fn indices(&self) -> Vec<ElementIx> {
        self.iter().map(|(ix, _)| ix).collect()
    }

    /// Maps each linked element to its position in the path.
    pub fn ordinals(&self) -> HashMap<ElementIx, usize> {
        self.iter()
            .enumerate()
            .map(|(ordinal, (ix, _))| (ix, ordinal))
            .collect()
    }

    /// Appends an element to the end of the path.
    pub fn push(&mut self, element: PathElement) -> Result<ElementIx, HintError> {
        let ix = self.arena.alloc_element(element)?;
        let tail = self.tail;
        {
            let element = self.get_mut(ix);
            element.prev = tail;
            element.next = None;
        }
        match tail {
            Some(tail) => self.get_mut(tail).next = Some(ix),
            None => self.head = Some(ix),
        }
        self.tail = Some(ix);
        self.len += 1;
        Ok(ix)
    }

    /// Links a new element directly after `after`.
    pub fn insert_after(
        &mut self,
        after: ElementIx,
        element: PathElement,
    ) -> Result<ElementIx, HintError> {
        let ix = self.arena.alloc_element(element)?;
        let next = self.next(after);
        {
            let element = self.get_mut(ix);
            element.prev = Some(after);
            element.next = next;
        }
        self.get_mut(after).next = Some(ix);
        match next {
            Some(next) => self.get_mut(next).prev = Some(ix),
            None => self.tail = Some(ix),
        }
        self.len += 1;
        Ok(ix)
    }

    /// Unlinks an element from the path.
    pub fn remove(&mut self, ix: ElementIx) {
        let (prev, next) = {
            let element = self.get(ix);
            (element.prev, element.next)
        };
        match prev {
            Some(prev) => self.get_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.get_mut(next).prev = prev,
            None => self.tail = prev,
        }
        let element = self.get_mut(ix);
        element.prev = None;
        element.next = None;
        self.len -= 1;
    }

    /// Returns the current point before `ix` is drawn.
    pub fn start_point(&self, ix: ElementIx) -> Point<Fixed> {
        match self.prev(ix) {
            Some(prev) => self.get(prev).end,
            None => self.get(ix).end,
        }
    }

    /// Returns the four points of a curve element.
    pub fn curve_points(&self, ix: ElementIx) -> Option<[Point<Fixed>; 4]> {
        let element = self.get(ix);
        element
            .is_curve()
            .then(|| [self.start_point(ix), element.c1, element.c2, element.end])
    }

    /// Points every close path at the move starting its subpath.
    pub fn link_close_partners(&mut self) {
        let mut current_move = None;
        for ix in self.indices() {
            match self.get(ix).kind {
                ElementKind::MoveTo => current_move = Some(ix),
                ElementKind::ClosePath => {
                    let start = current_move.map(|mv| self.get(mv).end);
                    let element = self.get_mut(ix);
                    element.close_partner = current_move;
                    if let Some(start) = start {
                        element.end = start;
                    }
                    current_move = None;
                }
                _ => {}
            }
        }
    }

    /// Returns (move, close) pairs for each subpath.
    pub fn subpaths(&self) -> Vec<(ElementIx, ElementIx)> {
        let mut subpaths = Vec::new();
        let mut current_move = None;
        for (ix, element) in self.iter() {
            match element.kind {
                ElementKind::MoveTo => current_move = Some(ix),
                ElementKind::ClosePath => {
                    if let Some(mv) = current_move.take() {
                        subpaths.push((mv, ix));
                    }
                }
                _ => {}
            }
        }
        subpaths
    }

    /// Moves the point selected by `which`.
    ///
    /// Selecting a control point of anything but a curve is an error.
    pub fn move_point(
        &mut self,
        ix: ElementIx,
        which: ControlPoint,
        to: Point<Fixed>,
    ) -> Result<(), HintError> {
        let element = self.get_mut(ix);
        match which {
            ControlPoint::End => element.end = to,
            ControlPoint::Curve1 | ControlPoint::Curve2 if !element.is_curve() => {
                return Err(HintError::MalformedPath(format!(
                    "cannot move a control point of a {:?} element",
                    element.kind
                )));
            }
            ControlPoint::Curve1 => element.c1 = to,
            ControlPoint::Curve2 => element.c2 = to,
        }
        Ok(())
    }

    /// Splits a curve at parameter `t`, returning the index of the new
    /// second half.
    pub fn split_curve(&mut self, ix: ElementIx, t: f64) -> Result<ElementIx, HintError> {
        let [p0, c1, c2, p3] = self.curve_points(ix).ok_or_else(|| {
            HintError::MalformedPath("cannot split a non-curve element".into())
        })?;
        let lerp = |a: Point<Fixed>, b: Point<Fixed>| {
            let (ax, ay) = a.to_f64();
            let (bx, by) = b.to_f64();
            (ax + (bx - ax) * t, ay + (by - ay) * t)
        };
        let to_point = |(x, y): (f64, f64)| Point::new(Fixed::from_f64(x), Fixed::from_f64(y));
        let lerp_f = |a: (f64, f64), b: (f64, f64)| (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
        let p01 = lerp(p0, c1);
        let p12 = lerp(c1, c2);
        let p23 = lerp(c2, p3);
        let p012 = lerp_f(p01, p12);
        let p123 = lerp_f(p12, p23);
        let is_flex = self.get(ix).is_flex;
        {
            let first = self.get_mut(ix);
            first.c1 = to_point(p01);
            first.c2 = to_point(p012);
            first.end = flatten::eval_cubic(p0, c1, c2, p3, t);
            first.is_flex = false;
        }
        let mut second = PathElement::curve(to_point(p123), to_point(p23), p3);
        second.is_flex = is_flex;
        self.insert_after(ix, second)
    }

    /// Relinks the subpath starting at `move_ix` to the end of the path.
    pub fn move_subpath_to_end(&mut self, move_ix: ElementIx) -> Result<(), HintError> {
        let mut close_ix = move_ix;
        while self.get(close_ix).kind != ElementKind::ClosePath {
            close_ix = self.next(close_ix).ok_or_else(|| {
                HintError::MalformedPath("subpath is missing its closepath".into())
            })?;
        }
        if self.tail == Some(close_ix) {
            return Ok(());
        }
        let before = self.prev(move_ix);
        let after = self.next(close_ix);
        match before {
            Some(before) => self.get_mut(before).next = after,
            None => self.head = after,
        }
        if let Some(after) = after {
            self.get_mut(after).prev = before;
        }
        if let Some(tail) = self.tail {
            self.get_mut(tail).next = Some(move_ix);
        }
        self.get_mut(move_ix).prev = self.tail;
        self.get_mut(close_ix).next = None;
        self.tail = Some(close_ix);
        Ok(())
    }

    /// Checks the structural invariants of the outline.
    pub fn validate(&self) -> Result<(), HintError> {
        let malformed = |reason: &str| Err(HintError::MalformedPath(reason.into()));
        let mut current_move = None;
        let mut prev_end = None;
        for (ix, element) in self.iter() {
            for point in [element.end, element.c1, element.c2] {
                if point.x.is_saturated() || point.y.is_saturated() {
                    return malformed("coordinate out of range");
                }
            }
            match element.kind {
                ElementKind::MoveTo => {
                    if current_move.is_some() {
                        return malformed("subpath is missing its closepath");
                    }
                    current_move = Some(ix);
                }
                ElementKind::ClosePath => {
                    if current_move.is_none() || element.close_partner != current_move {
                        return malformed("closepath without a matching moveto");
                    }
                    current_move = None;
                }
                ElementKind::LineTo | ElementKind::CurveTo => {
                    if current_move.is_none() {
                        return malformed("path does not start with a moveto");
                    }
                    if element.is_curve()
                        && Some(element.end) == prev_end
                        && (element.c1 != element.end || element.c2 != element.end)
                    {
                        return malformed("curve ends where it starts");
                    }
                }
            }
            prev_end = Some(element.end);
        }
        if current_move.is_some() {
            return malformed("subpath is missing its closepath");
        }
        Ok(())
    }

    /// Bounds of the elements from `first` through `last` inclusive, with
    /// curves flattened.
    pub fn bounds_of(&self, first: ElementIx, last: ElementIx) -> Option<BoundingBox<Fixed>> {
        let mut bounds: Option<BoundingBox<Fixed>> = None;
        let mut include = |p: Point<Fixed>| match bounds.as_mut() {
            Some(bounds) => bounds.include(p),
            None => bounds = Some(BoundingBox::from_point(p)),
        };
        let mut cursor = Some(first);
        while let Some(ix) = cursor {
            let element = self.get(ix);
            if let Some([p0, c1, c2, p3]) = self.curve_points(ix) {
                flatten::flatten_curve(p0, c1, c2, p3, |p, _| include(p));
            } else {
                include(element.end);
            }
            if ix == last {
                break;
            }
            cursor = element.next;
        }
        bounds
    }

    /// Bounds of the whole outline.
    pub fn bounds(&self) -> Option<BoundingBox<Fixed>> {
        self.bounds_of(self.head?, self.tail?)
    }

    /// Twice the signed area of a subpath, positive when counter-clockwise
    /// in a y-up system.
    pub fn signed_area(&self, move_ix: ElementIx, close_ix: ElementIx) -> f64 {
        let mut area = 0.0;
        let mut prev = self.get(move_ix).end.to_f64();
        let mut add = |p: Point<Fixed>| {
            let p = p.to_f64();
            area += prev.0 * p.1 - p.0 * prev.1;
            prev = p;
        };
        let mut cursor = self.next(move_ix);
        while let Some(ix) = cursor {
            let element = self.get(ix);
            if let Some([p0, c1, c2, p3]) = self.curve_points(ix) {
                flatten::flatten_curve(p0, c1, c2, p3, |p, t| {
                    if t > 0.0 {
                        add(p)
                    }
                });
            } else {
                add(element.end);
            }
            if ix == close_ix {
                break;
            }
            cursor = element.next;
        }
        area
    }

    /// Appends to the main hint list.
    pub fn add_main_hint(&mut self, hint: Hint) -> Result<(), HintError> {
        let node = self.arena.alloc_hint(HintNode { hint, next: None })?;
        let mut head = self.main_hints;
        self.append_hint(&mut head, node);
        self.main_hints = head;
        Ok(())
    }

    /// Appends to the local hints of an element.
    pub fn add_local_hint(&mut self, ix: ElementIx, hint: Hint) -> Result<(), HintError> {
        let node = self.arena.alloc_hint(HintNode { hint, next: None })?;
        let mut head = self.get(ix).hints;
        self.append_hint(&mut head, node);
        self.get_mut(ix).hints = head;
        Ok(())
    }

    pub fn main_hints(&self) -> Vec<Hint> {
        self.collect_hints(self.main_hints)
    }

    pub fn local_hints(&self, ix: ElementIx) -> Vec<Hint> {
        self.collect_hints(self.get(ix).hints)
    }

    /// Drops all hints while keeping the outline.
    pub fn clear_hints(&mut self) {
        self.main_hints = None;
        for ix in self.indices() {
            self.get_mut(ix).hints = None;
        }
    }

    fn append_hint(&mut self, head: &mut Option<HintIx>, node: HintIx) {
        let Some(mut cursor) = *head else {
            *head = Some(node);
            return;
        };
        while let Some(next) = self.arena.hint(cursor).next {
            cursor = next;
        }
        self.arena.hint_mut(cursor).next = Some(node);
    }

    fn collect_hints(&self, head: Option<HintIx>) -> Vec<Hint> {
        let mut hints = Vec::new();
        let mut cursor = head;
        while let Some(ix) = cursor {
            let node = self.arena.hint(ix);
            hints.push(node.hint);
            cursor = node.next;
        }
        hints
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::arena::DEFAULT_ARENA_CAPACITY;

    /// Builds a path from a compact description.
    ///
    /// Each item is a kind tag followed by coordinates: `M x y`, `L x y`,
    /// `C x1 y1 x2 y2 x y` or `Z`.
    pub fn path_from(ops: &[(char, &[i32])]) -> Path {
        let mut path = Path::new(DEFAULT_ARENA_CAPACITY);
        for (op, coords) in ops {
            let p = |i: usize| Point::from_i32(coords[i], coords[i + 1]);
            let element = match op {
                'M' => PathElement::new(ElementKind::MoveTo, p(0)),
                'L' => PathElement::new(ElementKind::LineTo, p(0)),
                'C' => PathElement::curve(p(0), p(2), p(4)),
                _ => PathElement::new(ElementKind::ClosePath, Point::ZERO),
            };
            path.push(element).unwrap();
        }
        path.link_close_partners();
        path
    }

    /// Describes the path as (kind, end point) pairs.
    pub fn kinds_and_ends(path: &Path) -> Vec<(ElementKind, Point<Fixed>)> {
        path.iter().map(|(_, e)| (e.kind, e.end)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{testing::*, *};
    use ElementKind::*;

    fn square() -> Path {
        path_from(&[
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('L', &[100, 100]),
            ('L', &[0, 100]),
            ('Z', &[]),
        ])
    }

    #[test]
    fn push_links_and_closes() {
        let path = square();
        assert_eq!(path.len(), 5);
        path.validate().unwrap();
        let (mv, close) = path.subpaths()[0];
        assert_eq!(path.get(close).close_partner, Some(mv));
        assert_eq!(path.get(close).end, Point::ZERO);
        assert_eq!(path.start_point(close), Point::from_i32(0, 100));
    }

    #[test]
    fn remove_and_insert() {
        let mut path = square();
        let ixs = path.indices();
        path.remove(ixs[2]);
        assert_eq!(path.len(), 4);
        assert_eq!(path.next(ixs[1]), Some(ixs[3]));
        assert_eq!(path.prev(ixs[3]), Some(ixs[1]));
        let new = path
            .insert_after(
                ixs[1],
                PathElement::new(LineTo, Point::from_i32(100, 50)),
            )
            .unwrap();
        assert_eq!(path.next(ixs[1]), Some(new));
        assert_eq!(path.prev(ixs[3]), Some(new));
        path.remove(ixs[4]);
        assert_eq!(path.tail(), Some(ixs[3]));
    }

    #[test]
    fn split_matches_kurbo() {
        use kurbo::ParamCurve;
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('C', &[0, 400, 400, 400, 400, 0]),
            ('Z', &[]),
        ]);
        let curve = path.indices()[1];
        let second = path.split_curve(curve, 0.25).unwrap();
        let cubic = kurbo::CubicBez::new((0.0, 0.0), (0.0, 400.0), (400.0, 400.0), (400.0, 0.0));
        let (left, right) = (cubic.subsegment(0.0..0.25), cubic.subsegment(0.25..1.0));
        let close = |a: Point<Fixed>, b: kurbo::Point| {
            let (x, y) = a.to_f64();
            (x - b.x).abs() < 0.01 && (y - b.y).abs() < 0.01
        };
        let first = path.get(curve);
        assert!(close(first.c1, left.p1));
        assert!(close(first.c2, left.p2));
        assert!(close(first.end, left.p3));
        let second = path.get(second);
        assert!(close(second.c1, right.p1));
        assert!(close(second.c2, right.p2));
        assert!(close(second.end, right.p3));
        assert_eq!(path.len(), 4);
        path.validate().unwrap();
    }

    #[test]
    fn move_subpath() {
        let mut path = path_from(&[
            ('M', &[10, 10]),
            ('L', &[20, 10]),
            ('Z', &[]),
            ('M', &[0, 0]),
            ('L', &[100, 0]),
            ('Z', &[]),
        ]);
        let first = path.head().unwrap();
        path.move_subpath_to_end(first).unwrap();
        assert_eq!(
            kinds_and_ends(&path),
            [
                (MoveTo, Point::from_i32(0, 0)),
                (LineTo, Point::from_i32(100, 0)),
                (ClosePath, Point::from_i32(0, 0)),
                (MoveTo, Point::from_i32(10, 10)),
                (LineTo, Point::from_i32(20, 10)),
                (ClosePath, Point::from_i32(10, 10)),
            ]
        );
        // Backward links agree with forward links
        let forward = path.indices();
        let mut backward = vec![path.tail().unwrap()];
        while let Some(prev) = path.prev(*backward.last().unwrap()) {
            backward.push(prev);
        }
        backward.reverse();
        assert_eq!(forward, backward);
        path.validate().unwrap();
    }

    #[test]
    fn move_point_selectors() {
        let mut path = path_from(&[
            ('M', &[0, 0]),
            ('L', &[10, 0]),
            ('C', &[20, 0, 30, 10, 30, 20]),
            ('Z', &[]),
        ]);
        let ixs = path.indices();
        assert!(matches!(
            path.move_point(ixs[1], ControlPoint::Curve2, Point::ZERO),
            Err(HintError::MalformedPath(_))
        ));
        path.move_point(ixs[2], ControlPoint::Curve1, Point::from_i32(21, 0))
            .unwrap();
        assert_eq!(path.get(ixs[2]).c1, Point::from_i32(21, 0));
        path.move_point(ixs[1], ControlPoint::End, Point::from_i32(11, 0))
            .unwrap();
        assert_eq!(path.get(ixs[1]).end, Point::from_i32(11, 0));
    }

    #[test]
    fn validation_failures() {
        let open = path_from(&[('M', &[0, 0]), ('L', &[10, 0])]);
        assert!(open.validate().is_err());
        let no_move = path_from(&[('L', &[10, 0]), ('Z', &[])]);
        assert!(no_move.validate().is_err());
    }

    #[test]
    fn area_sign_and_bounds() {
        let path = square();
        let (mv, close) = path.subpaths()[0];
        assert!(path.signed_area(mv, close) > 0.0);
        let bounds = path.bounds().unwrap();
        assert_eq!(bounds.x_max, Fixed::from_i32(100));
        assert_eq!(bounds.y_max, Fixed::from_i32(100));
    }

    #[test]
    fn hint_lists_keep_order() {
        let mut path = square();
        let hint = |lo: i32| Hint {
            kind: HintKind::Bottom,
            lo: Fixed::from_i32(lo),
            hi: Fixed::from_i32(lo + 10),
            path_ix1: 0,
            path_ix2: 1,
            ghost: false,
        };
        path.add_main_hint(hint(1)).unwrap();
        path.add_main_hint(hint(2)).unwrap();
        let ix = path.indices()[2];
        path.add_local_hint(ix, hint(3)).unwrap();
        assert_eq!(path.main_hints(), [hint(1), hint(2)]);
        assert_eq!(path.local_hints(ix), [hint(3)]);
        let used = path.arena_used();
        assert!(used > 0);
        path.reset();
        assert_eq!(path.arena_used(), 0);
        assert!(path.is_empty());
    }
}
