use crate::{Fixed, Point};

/// Minimum and maximum extents of a rectangular region.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T> {
    /// Minimum extent in the x direction-- the left side of a region.
    pub x_min: T,
    /// Minimum extent in the y direction. In a Y-up coordinate system
    /// this represents the bottom of a region.
    pub y_min: T,
    /// Maximum extent in the x direction-- the right side of a region.
    pub x_max: T,
    /// Maximum extent in the y direction. In a Y-up coordinate system
    /// this represents the top of the region.
    pub y_max: T,
}

impl BoundingBox<Fixed> {
    /// Creates a degenerate box containing a single point.
    pub fn from_point(point: Point<Fixed>) -> Self {
        Self {
            x_min: point.x,
            y_min: point.y,
            x_max: point.x,
            y_max: point.y,
        }
    }

    /// Grows the box to include the given point.
    pub fn include(&mut self, point: Point<Fixed>) {
        self.x_min = self.x_min.min(point.x);
        self.y_min = self.y_min.min(point.y);
        self.x_max = self.x_max.max(point.x);
        self.y_max = self.y_max.max(point.y);
    }

    /// Returns the union of two boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Returns true if `other` lies entirely within this box and does not
    /// share all four edges with it.
    pub fn strictly_contains(&self, other: &Self) -> bool {
        other.x_min >= self.x_min
            && other.y_min >= self.y_min
            && other.x_max <= self.x_max
            && other.y_max <= self.y_max
            && other != self
    }

    /// Width of the box.
    pub fn width(&self) -> Fixed {
        self.x_max - self.x_min
    }

    /// Height of the box.
    pub fn height(&self) -> Fixed {
        self.y_max - self.y_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_and_contain() {
        let mut outer = BoundingBox::from_point(Point::from_i32(0, 0));
        outer.include(Point::from_i32(500, 700));
        let mut inner = BoundingBox::from_point(Point::from_i32(100, 100));
        inner.include(Point::from_i32(400, 600));
        assert!(outer.strictly_contains(&inner));
        assert!(!inner.strictly_contains(&outer));
        assert!(!outer.strictly_contains(&outer));
        assert_eq!(outer.width(), Fixed::from_i32(500));
        assert_eq!(outer.height(), Fixed::from_i32(700));
        assert_eq!(inner.union(&outer), outer);
    }
}
