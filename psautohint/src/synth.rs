//! Stem hint synthesis.
//!
//! Segments are gathered from lines, curve flats, flex pairs and alignment
//! zone points, then opposite sides are paired into stems. Stems that do not
//! conflict become main hints; conflicting ones are attached to the element
//! where they apply as local hint groups.

use std::collections::HashMap;

use bez_types::{Fixed, Point};
use read_bez::HintKind;

use crate::{
    builder::Transform,
    classify::{self, Flat},
    error::HintError,
    font::{AlignmentZone, FontContext},
    path::{ElementIx, ElementKind, Hint, Path},
    report::Reporter,
    segments::{HintSegment, Orientation, Reason, SegmentLists, Side},
};

/// Operand limit of a hint group in the rasteriser.
pub const MAX_HINT_OPERANDS: usize = 22;

const MAX_STEMS: usize = MAX_HINT_OPERANDS / 2;

/// Initial ceiling on stem widths, in design units.
const MAX_STEM_DIST: i32 = 150;

/// Length of the synthetic segment placed for a ghost.
const GHOST_LENGTH: i32 = 4;

/// Largest flex depth, in design units.
const FLEX_CAND: i32 = 4;

/// Tangent of the bend limit for straight segments, times 1000.
const BEND_TAN: i64 = 577;

/// Font values mapped into the internal coordinate system.
struct Metrics {
    sx: i32,
    sy: i32,
    top_zones: Vec<AlignmentZone>,
    bottom_zones: Vec<AlignmentZone>,
    serif_y: Vec<Fixed>,
    h_widths: Vec<Fixed>,
    v_widths: Vec<Fixed>,
    fuzz: Fixed,
    ghost_length: Fixed,
    flex_cand: Fixed,
    h_ceiling: Fixed,
    v_ceiling: Fixed,
}

impl Metrics {
    fn new(font: &FontContext, transform: &Transform) -> Self {
        let (ax, ay) = (transform.tfmx.abs(), transform.tfmy.abs());
        let map_zones = |zones: &[AlignmentZone]| {
            zones
                .iter()
                .map(|z| AlignmentZone::new(z.bottom * transform.tfmy, z.top * transform.tfmy))
                .collect::<Vec<_>>()
        };
        let fuzz = font.blue_fuzz * ay;
        let h_widths = font
            .preferred_widths(true)
            .map(|w| w * ay)
            .collect::<Vec<_>>();
        let v_widths = font
            .preferred_widths(false)
            .map(|w| w * ax)
            .collect::<Vec<_>>();
        let ceiling = |widths: &[Fixed], scale: Fixed| {
            let widest = widths.iter().copied().max().unwrap_or_default();
            (font.ps_dist(MAX_STEM_DIST) * scale).max(widest + fuzz)
        };
        Self {
            sx: transform.tfmx.signum(),
            sy: transform.tfmy.signum(),
            top_zones: map_zones(&font.top_zones),
            bottom_zones: map_zones(&font.bottom_zones),
            serif_y: font.serif_y.iter().map(|y| *y * transform.tfmy).collect(),
            h_ceiling: ceiling(&h_widths, ay),
            v_ceiling: ceiling(&v_widths, ax),
            h_widths,
            v_widths,
            fuzz,
            ghost_length: font.ps_dist(GHOST_LENGTH) * ax,
            flex_cand: font.ps_dist(FLEX_CAND) * ay.max(ax),
        }
    }

    fn in_zone(&self, y: Fixed) -> bool {
        self.top_zones
            .iter()
            .chain(&self.bottom_zones)
            .any(|zone| zone.contains(y, self.fuzz))
    }

    fn is_band(&self, y: Fixed) -> bool {
        self.in_zone(y) || self.serif_y.iter().any(|s| (*s - y).abs() <= self.fuzz)
    }

    /// Coordinate as seen in design space, where only the sign differs.
    fn design(&self, value: Fixed, orientation: Orientation) -> Fixed {
        let sign = match orientation {
            Orientation::H => self.sy,
            Orientation::V => self.sx,
        };
        if sign < 0 {
            -value
        } else {
            value
        }
    }
}

/// Assigns sides to edges from the direction of travel.
struct Orienter {
    /// True if the outline winds counter-clockwise in design space.
    ccw: bool,
    sx: i32,
    sy: i32,
}

impl Orienter {
    fn new(path: &Path, metrics: &Metrics) -> Self {
        let area = path
            .subpaths()
            .into_iter()
            .map(|(mv, close)| path.signed_area(mv, close))
            .fold(0.0f64, |best, area| if area.abs() > best.abs() { area } else { best });
        let sign = if area < 0.0 { -1 } else { 1 };
        Self {
            ccw: sign * metrics.sx * metrics.sy > 0,
            sx: metrics.sx,
            sy: metrics.sy,
        }
    }

    /// Side of a horizontal edge travelled by `dx`.
    fn h_side(&self, dx: Fixed) -> Side {
        if (dx.signum() * self.sx > 0) == self.ccw {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    /// Side of a vertical edge travelled by `dy`.
    fn v_side(&self, dy: Fixed) -> Side {
        if (dy.signum() * self.sy > 0) == self.ccw {
            Side::Right
        } else {
            Side::Left
        }
    }
}

/// Collects segments from the outline.
struct SegmentCollector<'a> {
    font: &'a FontContext,
    metrics: &'a Metrics,
    orient: &'a Orienter,
    lists: SegmentLists,
}

impl SegmentCollector<'_> {
    fn collect(mut self, path: &mut Path) -> SegmentLists {
        let flex = self.find_flex(path);
        for (mv, close) in path.subpaths() {
            let mut cursor = path.next(mv);
            while let Some(ix) = cursor {
                let element = path.get(ix);
                let start = path.start_point(ix);
                match element.kind {
                    ElementKind::LineTo | ElementKind::ClosePath => {
                        self.line(ix, start, element.end);
                    }
                    ElementKind::CurveTo if !flex.contains(&ix) => {
                        self.curve(ix, [start, element.c1, element.c2, element.end]);
                    }
                    _ => {}
                }
                self.ghosts(ix, element.end);
                if ix == close {
                    break;
                }
                cursor = element.next;
            }
        }
        self.lists
    }

    fn line(&mut self, ix: ElementIx, start: Point<Fixed>, end: Point<Fixed>) {
        let (dx, dy) = (end.x - start.x, end.y - start.y);
        let (adx, ady) = (dx.to_bits().unsigned_abs() as i64, dy.to_bits().unsigned_abs() as i64);
        if dx != Fixed::ZERO && ady * 1000 <= adx * BEND_TAN {
            let y = mid(start.y, end.y);
            let segment =
                HintSegment::new(Orientation::H, y, start.x, end.x, Reason::Straight, Some(ix));
            self.lists.add(self.orient.h_side(dx), segment);
        }
        if dy != Fixed::ZERO && adx * 1000 <= ady * BEND_TAN {
            let x = mid(start.x, end.x);
            let segment =
                HintSegment::new(Orientation::V, x, start.y, end.y, Reason::Straight, Some(ix));
            self.lists.add(self.orient.v_side(dy), segment);
        }
    }

    fn curve(&mut self, ix: ElementIx, [p0, c1, c2, p3]: [Point<Fixed>; 4]) {
        let flats = classify::classify_curve(p0, c1, c2, p3);
        let is_s = classify::is_s_curve(p0, c1, c2, p3);
        for flat in [flats.horizontal, flats.vertical].into_iter().flatten() {
            if flat.is_interior(p0, p3) {
                let reason = if is_s { Reason::SCurve } else { Reason::Curve };
                self.flat_segment(ix, &flat, flat.location(), reason);
            } else if flat.start == p0 || flat.end == p3 {
                // A flat run reaching the junction is an edge at the end point
                let at = if flat.start == p0 { p0 } else { p3 };
                let location = flat.axis.across(at);
                let reason = match flat.axis {
                    classify::Axis::Y if self.metrics.is_band(location) => Reason::Band,
                    _ => Reason::Curve,
                };
                self.flat_segment(ix, &flat, location, reason);
            }
        }
    }

    fn flat_segment(&mut self, ix: ElementIx, flat: &Flat, location: Fixed, reason: Reason) {
        let (lo, hi) = flat.span();
        let travel = flat.axis.along(flat.end) - flat.axis.along(flat.start);
        if lo == hi {
            return;
        }
        let (orientation, side) = match flat.axis {
            classify::Axis::Y => (Orientation::H, self.orient.h_side(travel)),
            classify::Axis::X => (Orientation::V, self.orient.v_side(travel)),
        };
        self.lists.add(
            side,
            HintSegment::new(orientation, location, lo, hi, reason, Some(ix)),
        );
    }

    fn ghosts(&mut self, ix: ElementIx, point: Point<Fixed>) {
        let fuzz = self.metrics.fuzz;
        let zones = [
            (Side::Top, &self.metrics.top_zones, true),
            (Side::Bottom, &self.metrics.bottom_zones, false),
        ];
        let mut found = Vec::new();
        for (side, zones, is_top) in zones {
            for zone in zones {
                // The flat edge of a zone is tried before its overshoot edge
                let edges = if is_top == (self.metrics.sy > 0) {
                    [zone.bottom, zone.top]
                } else {
                    [zone.top, zone.bottom]
                };
                if let Some(edge) = edges.into_iter().find(|e| (*e - point.y).abs() <= fuzz) {
                    found.push((side, edge));
                    break;
                }
            }
        }
        for (side, edge) in found {
            let segment = HintSegment::new(
                Orientation::H,
                edge,
                point.x,
                point.x + self.metrics.ghost_length,
                Reason::Ghost,
                Some(ix),
            );
            self.lists.add(side, segment);
        }
    }

    /// Finds flex pairs, marking detected ones and adding a segment along
    /// each chord. Returns the curves of every pair.
    fn find_flex(&mut self, path: &mut Path) -> Vec<ElementIx> {
        let mut pairs = Vec::new();
        for ix in path.indices() {
            let Some(first) = path.prev(ix) else {
                continue;
            };
            let (Some([p0, ..]), Some([_, _, _, p3])) =
                (path.curve_points(first), path.curve_points(ix))
            else {
                continue;
            };
            if pairs.contains(&first) {
                continue;
            }
            let join = path.get(first).end;
            let marked = path.get(ix).is_flex;
            let horizontal = (p3.y - p0.y).abs() <= (p3.x - p0.x).abs();
            if marked && flex_depth(p0, join, horizontal) > self.metrics.flex_cand {
                log::debug!("flex ending at ({}, {}) is too deep", p3.x, p3.y);
                path.get_mut(ix).is_flex = false;
                continue;
            }
            let detected = !marked && self.font.flex_ok && self.is_flex_shape(p0, join, p3, horizontal);
            if !(marked || detected) {
                continue;
            }
            if detected {
                log::debug!("detected flex ending at ({}, {})", p3.x, p3.y);
                path.get_mut(ix).is_flex = true;
            }
            pairs.extend([first, ix]);
            let segment = if horizontal {
                let side = self.orient.h_side(p3.x - p0.x);
                (side, HintSegment::new(Orientation::H, p0.y, p0.x, p3.x, Reason::Flex, Some(first)))
            } else {
                let side = self.orient.v_side(p3.y - p0.y);
                (side, HintSegment::new(Orientation::V, p0.x, p0.y, p3.y, Reason::Flex, Some(first)))
            };
            self.lists.add(segment.0, segment.1);
        }
        pairs
    }

    fn is_flex_shape(
        &self,
        p0: Point<Fixed>,
        join: Point<Fixed>,
        p3: Point<Fixed>,
        horizontal: bool,
    ) -> bool {
        let chord_skew = if horizontal {
            (p3.y - p0.y).abs()
        } else {
            (p3.x - p0.x).abs()
        };
        let depth = flex_depth(p0, join, horizontal);
        let aligned = if self.font.flex_strict {
            chord_skew == Fixed::ZERO
        } else {
            chord_skew <= self.metrics.fuzz
        };
        aligned && depth > Fixed::ZERO && depth <= self.metrics.flex_cand
    }
}

/// Distance of the join of a flex pair from its chord.
fn flex_depth(p0: Point<Fixed>, join: Point<Fixed>, horizontal: bool) -> Fixed {
    if horizontal {
        (join.y - p0.y).abs()
    } else {
        (join.x - p0.x).abs()
    }
}

fn mid(a: Fixed, b: Fixed) -> Fixed {
    Fixed::from_bits(((a.to_bits() as i64 + b.to_bits() as i64) >> 1) as i32)
}

/// A pairing of two opposite segments.
#[derive(Copy, Clone, Debug)]
struct Candidate {
    lo_side: Side,
    lo_ix: usize,
    hi_side: Side,
    hi_ix: usize,
    lo: Fixed,
    hi: Fixed,
    overlap: Fixed,
    exact: bool,
    near: bool,
}

impl Candidate {
    fn width(&self) -> Fixed {
        self.hi - self.lo
    }

    fn rank(&self) -> (bool, bool, Fixed, Fixed) {
        (!self.exact, !self.near, self.width(), -self.overlap)
    }
}

/// A chosen stem before kinds and ordinals are assigned.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Stem {
    lo: Fixed,
    hi: Fixed,
    lo_ref: Option<ElementIx>,
    hi_ref: Option<ElementIx>,
}

#[derive(Default, Debug)]
struct Pairing {
    main: Vec<Stem>,
    local: Vec<Stem>,
    too_wide: usize,
}

/// Pairs the segments of one orientation.
struct StemPairer<'a> {
    lists: &'a mut SegmentLists,
    metrics: &'a Metrics,
    report_curve_stems: bool,
    orientation: Orientation,
}

impl StemPairer<'_> {
    fn sides(&self) -> (Side, Side) {
        match self.orientation {
            Orientation::H => (Side::Bottom, Side::Top),
            Orientation::V => (Side::Left, Side::Right),
        }
    }

    fn widths(&self) -> &[Fixed] {
        match self.orientation {
            Orientation::H => &self.metrics.h_widths,
            Orientation::V => &self.metrics.v_widths,
        }
    }

    fn pair(&mut self, ceiling: Fixed) -> Pairing {
        let (low_side, high_side) = self.sides();
        for side in [low_side, high_side] {
            for segment in self.lists.list_mut(side) {
                segment.sibling = None;
            }
        }
        let (low, high) = (self.lists.list(low_side), self.lists.list(high_side));
        let fuzz = self.metrics.fuzz;
        let mut pairing = Pairing::default();
        let mut candidates = Vec::new();
        for (i, a) in low.iter().enumerate() {
            for (j, b) in high.iter().enumerate() {
                if a.is_ghost() || b.is_ghost() {
                    continue;
                }
                let separation = self.metrics.design(b.location, self.orientation)
                    - self.metrics.design(a.location, self.orientation);
                let overlap = a.overlap(b);
                if separation <= Fixed::ZERO || overlap <= Fixed::ZERO {
                    continue;
                }
                if !self.report_curve_stems && a.reason == Reason::Curve && b.reason == Reason::Curve {
                    continue;
                }
                if separation > ceiling {
                    pairing.too_wide += 1;
                    continue;
                }
                let (lo_pick, hi_pick) = if a.location < b.location {
                    ((low_side, i), (high_side, j))
                } else {
                    ((high_side, j), (low_side, i))
                };
                let candidate_lo = a.location.min(b.location);
                let candidate_hi = a.location.max(b.location);
                let width = candidate_hi - candidate_lo;
                candidates.push(Candidate {
                    lo_side: lo_pick.0,
                    lo_ix: lo_pick.1,
                    hi_side: hi_pick.0,
                    hi_ix: hi_pick.1,
                    lo: candidate_lo,
                    hi: candidate_hi,
                    overlap,
                    exact: self.widths().contains(&width),
                    near: self.widths().iter().any(|w| (*w - width).abs() <= fuzz),
                });
            }
        }
        candidates.sort_by_key(Candidate::rank);
        for candidate in candidates {
            let lo_segment = self.lists.list(candidate.lo_side)[candidate.lo_ix];
            let hi_segment = self.lists.list(candidate.hi_side)[candidate.hi_ix];
            if lo_segment.sibling.is_some() || hi_segment.sibling.is_some() {
                continue;
            }
            self.lists.list_mut(candidate.lo_side)[candidate.lo_ix].sibling = Some(candidate.hi_ix);
            self.lists.list_mut(candidate.hi_side)[candidate.hi_ix].sibling = Some(candidate.lo_ix);
            let stem = Stem {
                lo: candidate.lo,
                hi: candidate.hi,
                lo_ref: lo_segment.path_ref,
                hi_ref: hi_segment.path_ref,
            };
            let same = |s: &Stem| s.lo == stem.lo && s.hi == stem.hi;
            if pairing.main.iter().chain(&pairing.local).any(same) {
                continue;
            }
            let conflicts = pairing
                .main
                .iter()
                .any(|m| stem.lo <= m.hi && m.lo <= stem.hi);
            log::trace!(
                "{:?} stem {}..{} ({})",
                self.orientation,
                stem.lo,
                stem.hi,
                if conflicts { "local" } else { "main" }
            );
            if conflicts {
                pairing.local.push(stem);
            } else {
                pairing.main.push(stem);
            }
        }
        pairing
    }
}

/// Generates hints for the outline and stores them on the path.
pub(crate) fn synthesize(
    path: &mut Path,
    font: &FontContext,
    transform: &Transform,
    reporter: &mut Reporter,
) -> Result<(), HintError> {
    path.clear_hints();
    let metrics = Metrics::new(font, transform);
    let orient = Orienter::new(path, &metrics);
    let collector = SegmentCollector {
        font,
        metrics: &metrics,
        orient: &orient,
        lists: SegmentLists::default(),
    };
    let mut lists = collector.collect(path);
    log::debug!("collected {} segments", lists.len());
    let ordinals = path.ordinals();
    let Some(bounds) = path.bounds() else {
        return Ok(());
    };
    let mut main = Vec::new();
    let mut locals: Vec<(ElementIx, Hint)> = Vec::new();
    let mut h_main = Vec::new();
    for (orientation, ceiling) in [
        (Orientation::H, metrics.h_ceiling),
        (Orientation::V, metrics.v_ceiling),
    ] {
        let mut pairer = StemPairer {
            lists: &mut lists,
            metrics: &metrics,
            report_curve_stems: font.report_curve_stems,
            orientation,
        };
        let mut pairing = pairer.pair(ceiling);
        if pairing.main.is_empty() && pairing.too_wide > 0 {
            reporter.info(format!(
                "{orientation:?} stems are all wider than {ceiling}; retrying"
            ));
            reporter.sink().retry();
            pairing = pairer.pair(ceiling + ceiling);
        }
        let hint = |stem: &Stem| {
            let kind = match orientation {
                Orientation::H => {
                    let upper = if metrics.sy > 0 { stem.hi } else { stem.lo };
                    if metrics.top_zones.iter().any(|z| z.contains(upper, metrics.fuzz)) {
                        HintKind::Top
                    } else {
                        HintKind::Bottom
                    }
                }
                Orientation::V => {
                    let center = mid(stem.lo, stem.hi);
                    let glyph_center = mid(bounds.x_min, bounds.x_max);
                    if metrics.design(center, Orientation::V)
                        > metrics.design(glyph_center, Orientation::V)
                    {
                        HintKind::Right
                    } else {
                        HintKind::Left
                    }
                }
            };
            let ordinal = |r: Option<ElementIx>| {
                r.and_then(|ix| ordinals.get(&ix).copied()).unwrap_or_default()
            };
            Hint {
                kind,
                lo: stem.lo,
                hi: stem.hi,
                path_ix1: ordinal(stem.lo_ref),
                path_ix2: ordinal(stem.hi_ref),
                ghost: false,
            }
        };
        let chosen = pairing.main.iter().map(hint).collect::<Vec<_>>();
        if orientation == Orientation::H {
            h_main = chosen.clone();
        }
        main.extend(chosen);
        for stem in &pairing.local {
            let at = [stem.lo_ref, stem.hi_ref]
                .into_iter()
                .flatten()
                .min_by_key(|ix| ordinals.get(ix).copied().unwrap_or(usize::MAX));
            if let Some(at) = at {
                locals.push((at, hint(stem)));
            }
        }
    }
    main.extend(ghost_hints(&lists, &metrics, &h_main, &ordinals));
    trim_group(&mut main, 0, reporter)?;
    for hint in &main {
        path.add_main_hint(*hint)?;
    }
    let mut groups: Vec<(ElementIx, Vec<Hint>)> = Vec::new();
    for (ix, hint) in locals {
        match groups.iter_mut().find(|(at, _)| *at == ix) {
            Some((_, hints)) => hints.push(hint),
            None => groups.push((ix, vec![hint])),
        }
    }
    for (ix, mut hints) in groups {
        trim_group(&mut hints, main.len(), reporter)?;
        for hint in hints {
            path.add_local_hint(ix, hint)?;
        }
    }
    Ok(())
}

/// Ghost hints for zone edges that no horizontal stem already covers.
fn ghost_hints(
    lists: &SegmentLists,
    metrics: &Metrics,
    h_stems: &[Hint],
    ordinals: &HashMap<ElementIx, usize>,
) -> Vec<Hint> {
    let mut ghosts: Vec<Hint> = Vec::new();
    for (side, kind) in [(Side::Bottom, HintKind::Bottom), (Side::Top, HintKind::Top)] {
        for segment in lists.list(side).iter().filter(|s| s.is_ghost()) {
            let edge = segment.location;
            let covered = h_stems.iter().any(|h| {
                (h.lo - edge).abs() <= metrics.fuzz || (h.hi - edge).abs() <= metrics.fuzz
            });
            if covered || ghosts.iter().any(|g| g.lo == edge) {
                continue;
            }
            let ordinal = segment
                .path_ref
                .and_then(|ix| ordinals.get(&ix).copied())
                .unwrap_or_default();
            log::trace!("ghost {kind:?} hint at {edge}");
            ghosts.push(Hint {
                kind,
                lo: edge,
                hi: edge,
                path_ix1: ordinal,
                path_ix2: ordinal,
                ghost: true,
            });
        }
    }
    ghosts
}

/// Drops the last ranked hints of a group that would not fit on the
/// rasteriser's stack alongside `active` other hints.
fn trim_group(hints: &mut Vec<Hint>, active: usize, reporter: &mut Reporter) -> Result<(), HintError> {
    let room = MAX_STEMS.saturating_sub(active);
    if hints.len() <= room {
        return Ok(());
    }
    let operands = (hints.len() + active) * 2;
    reporter.check(HintError::HintStackExceeded { operands })?;
    // Remove from whichever orientation has more hints
    while hints.len() > room {
        let horizontal = hints.iter().filter(|h| h.kind.is_horizontal()).count();
        let drop_horizontal = horizontal >= hints.len() - horizontal;
        match hints
            .iter()
            .rposition(|h| h.kind.is_horizontal() == drop_horizontal)
        {
            Some(pos) => {
                hints.remove(pos);
            }
            None => {
                hints.pop();
            }
        }
    }
    Ok(())
}

/// Delivers the main hints and extremes to the report sink.
pub(crate) fn report_hints(path: &Path, transform: &Transform, reporter: &mut Reporter) {
    let main = path.main_hints();
    let mut hstems = Vec::new();
    let mut vstems = Vec::new();
    for hint in &main {
        match hint.kind {
            HintKind::Bottom | HintKind::Top => hstems.push(hint.reported()),
            HintKind::Left | HintKind::Right => vstems.push(hint.reported()),
        }
    }
    for stems in [&mut hstems, &mut vstems] {
        stems.sort();
        stems.dedup();
    }
    let sink = reporter.sink();
    for (location, width) in hstems {
        sink.hstem(location, width);
    }
    for (location, width) in vstems {
        sink.vstem(location, width);
    }
    if let Some(bounds) = path.bounds() {
        let (top, bottom) = if transform.y_goes_up() {
            (bounds.y_max, bounds.y_min)
        } else {
            (bounds.y_min, bounds.y_max)
        };
        sink.glyph_extremes(top, bottom);
    }
    let h = main.iter().filter(|h| h.kind.is_horizontal());
    let low = h.clone().map(|h| h.lo).min();
    let high = h.map(|h| h.hi).max();
    if let (Some(low), Some(high)) = (low, high) {
        sink.stem_extremes(low, high);
    }
}
