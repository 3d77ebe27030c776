use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::Fixed;

/// Two dimensional point with a generic coordinate type.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
}

impl<T> Point<T> {
    /// Creates a new point with the given x and y coordinates.
    #[inline(always)]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Maps `Point<T>` to `Point<U>` by applying a function to each coordinate.
    #[inline(always)]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Point<U> {
        Point {
            x: f(self.x),
            y: f(self.y),
        }
    }
}

impl Point<Fixed> {
    /// The origin.
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO);

    /// Creates a point from integer design-space coordinates.
    pub const fn from_i32(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_i32(x), Fixed::from_i32(y))
    }

    /// Returns the midpoint between `self` and `other`.
    pub fn midpoint(self, other: Self) -> Self {
        let mid = |a: Fixed, b: Fixed| {
            Fixed::from_bits(((a.to_bits() as i64 + b.to_bits() as i64) >> 1) as i32)
        };
        Self::new(mid(self.x, other.x), mid(self.y, other.y))
    }

    /// Returns the sum of the absolute coordinate differences.
    pub fn manhattan_distance(self, other: Self) -> Fixed {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Returns the point as a pair of f64 values.
    pub fn to_f64(self) -> (f64, f64) {
        (self.x.to_f64(), self.y.to_f64())
    }
}

impl<T> Add for Point<T>
where
    T: Add<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T> AddAssign for Point<T>
where
    T: AddAssign,
{
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T> Sub for Point<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<T> SubAssign for Point<T>
where
    T: SubAssign,
{
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl<T> Neg for Point<T>
where
    T: Neg<Output = T>,
{
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_ops() {
        let a = Point::from_i32(10, -4);
        let b = Point::from_i32(3, 7);
        assert_eq!(a + b, Point::from_i32(13, 3));
        assert_eq!(a - b, Point::from_i32(7, -11));
        assert_eq!(-a, Point::from_i32(-10, 4));
        assert_eq!(a.midpoint(b), Point::new(Fixed::from_f64(6.5), Fixed::from_f64(1.5)));
        assert_eq!(a.manhattan_distance(b), Fixed::from_i32(18));
    }

    #[test]
    fn map() {
        let p = Point::new(1, 2).map(|v| v * 10);
        assert_eq!(p, Point::new(10, 20));
    }
}
