//! Hint segments: single stem edges collected from the outline.

use bez_types::Fixed;

use crate::path::ElementIx;

/// Orientation of a segment and of the stem it may become part of.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Orientation {
    /// Horizontal edge, located at a y coordinate.
    H,
    /// Vertical edge, located at an x coordinate.
    V,
}

/// What produced a segment, weakest first.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) enum Reason {
    Curve,
    SCurve,
    Band,
    Flex,
    Straight,
    Ghost,
}

/// Which list a segment belongs to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Top | Self::Bottom => Orientation::H,
            Self::Left | Self::Right => Orientation::V,
        }
    }
}

/// One edge of a potential stem.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct HintSegment {
    pub orientation: Orientation,
    /// Coordinate across the edge: y for H, x for V.
    pub location: Fixed,
    /// Lower extent along the edge.
    pub start: Fixed,
    /// Upper extent along the edge.
    pub end: Fixed,
    pub reason: Reason,
    pub path_ref: Option<ElementIx>,
    /// Index of the segment this one was paired with.
    pub sibling: Option<usize>,
}

impl HintSegment {
    pub fn new(
        orientation: Orientation,
        location: Fixed,
        a: Fixed,
        b: Fixed,
        reason: Reason,
        path_ref: Option<ElementIx>,
    ) -> Self {
        Self {
            orientation,
            location,
            start: a.min(b),
            end: a.max(b),
            reason,
            path_ref,
            sibling: None,
        }
    }

    pub fn is_ghost(&self) -> bool {
        self.reason == Reason::Ghost
    }

    /// Length of the shared extent of two segments, negative when they are
    /// disjoint.
    pub fn overlap(&self, other: &Self) -> Fixed {
        self.end.min(other.end) - self.start.max(other.start)
    }

    fn merge(&mut self, other: &Self) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
        if other.reason > self.reason {
            self.reason = other.reason;
            self.path_ref = other.path_ref.or(self.path_ref);
        }
    }
}

/// Segments gathered from a glyph, one list per side.
#[derive(Clone, Default, Debug)]
pub(crate) struct SegmentLists {
    pub top: Vec<HintSegment>,
    pub bottom: Vec<HintSegment>,
    pub left: Vec<HintSegment>,
    pub right: Vec<HintSegment>,
}

impl SegmentLists {
    pub fn list(&self, side: Side) -> &[HintSegment] {
        match side {
            Side::Top => &self.top,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn list_mut(&mut self, side: Side) -> &mut Vec<HintSegment> {
        match side {
            Side::Top => &mut self.top,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Adds a segment, merging it into a coincident one that it touches.
    ///
    /// Ghosts only merge with ghosts.
    pub fn add(&mut self, side: Side, segment: HintSegment) {
        debug_assert_eq!(side.orientation(), segment.orientation);
        let list = self.list_mut(side);
        if let Some(existing) = list.iter_mut().find(|existing| {
            existing.location == segment.location
                && existing.is_ghost() == segment.is_ghost()
                && existing.overlap(&segment) >= Fixed::ZERO
        }) {
            log::trace!(
                "merging {:?} segment at {} into {:?}",
                segment.reason,
                segment.location,
                existing.reason
            );
            existing.merge(&segment);
            return;
        }
        log::trace!(
            "{side:?} {:?} segment at {} spanning {}..{}",
            segment.reason,
            segment.location,
            segment.start,
            segment.end
        );
        list.push(segment);
    }

    pub fn len(&self) -> usize {
        self.top.len() + self.bottom.len() + self.left.len() + self.right.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(location: i32, a: i32, b: i32, reason: Reason) -> HintSegment {
        HintSegment::new(
            Orientation::H,
            Fixed::from_i32(location),
            Fixed::from_i32(a),
            Fixed::from_i32(b),
            reason,
            None,
        )
    }

    #[test]
    fn extents_are_ordered() {
        let s = seg(0, 50, 10, Reason::Straight);
        assert_eq!((s.start, s.end), (Fixed::from_i32(10), Fixed::from_i32(50)));
        assert_eq!(s.overlap(&seg(5, 40, 100, Reason::Curve)), Fixed::from_i32(10));
        assert!(s.overlap(&seg(5, 60, 100, Reason::Curve)) < Fixed::ZERO);
    }

    #[test]
    fn coincident_segments_merge() {
        let mut lists = SegmentLists::default();
        lists.add(Side::Bottom, seg(0, 0, 100, Reason::Curve));
        lists.add(Side::Bottom, seg(0, 80, 200, Reason::Straight));
        lists.add(Side::Bottom, seg(0, 300, 400, Reason::Straight));
        lists.add(Side::Bottom, seg(0, 0, 4, Reason::Ghost));
        lists.add(Side::Bottom, seg(10, 0, 100, Reason::Straight));
        assert_eq!(lists.bottom.len(), 4);
        let merged = lists.bottom[0];
        assert_eq!((merged.start, merged.end), (Fixed::ZERO, Fixed::from_i32(200)));
        assert_eq!(merged.reason, Reason::Straight);
        assert_eq!(lists.len(), 4);
    }
}
