//! fixed-point numerical type

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 32-bit signed fixed point number with 8 bits of fraction (24.8).
///
/// Every arithmetic operation saturates at [`Fixed::MIN`] and
/// [`Fixed::MAX`] rather than wrapping.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Minimum value.
    pub const MIN: Self = Self(i32::MIN);

    /// Maximum value.
    pub const MAX: Self = Self(i32::MAX);

    /// This type's smallest representable value
    pub const EPSILON: Self = Self(1);

    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One.
    pub const ONE: Self = Self(Self::ONE_BITS);

    /// One half.
    pub const HALF: Self = Self(Self::ROUND);

    const FRACT_BITS: u32 = 8;
    const ONE_BITS: i32 = 1 << Self::FRACT_BITS;
    const INT_MASK: i32 = !0 << Self::FRACT_BITS;
    const ROUND: i32 = 1 << (Self::FRACT_BITS - 1);

    /// Creates a value from its raw bit representation.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns the raw bit representation.
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Creates a value from an integer, saturating if it does not fit in
    /// the 24 integral bits.
    pub const fn from_i32(value: i32) -> Self {
        if value > (i32::MAX >> Self::FRACT_BITS) {
            Self::MAX
        } else if value < (i32::MIN >> Self::FRACT_BITS) {
            Self::MIN
        } else {
            Self(value << Self::FRACT_BITS)
        }
    }

    /// Creates a value from a count of hundredths, rounding to the
    /// nearest representable value.
    ///
    /// This is how decimal operands of the form `12.34` are lifted.
    pub fn from_hundredths(hundredths: i64) -> Self {
        let scaled = hundredths.saturating_mul(Self::ONE_BITS as i64);
        let bits = if scaled >= 0 {
            scaled.saturating_add(50) / 100
        } else {
            scaled.saturating_sub(50) / 100
        };
        Self::saturate(bits)
    }

    /// Returns the value rounded to the nearest integer.
    pub fn to_i32(self) -> i32 {
        self.0.saturating_add(Self::ROUND) >> Self::FRACT_BITS
    }

    /// Returns the nearest integer value.
    pub fn round(self) -> Self {
        Self(self.0.saturating_add(Self::ROUND) & Self::INT_MASK)
    }

    /// Returns the nearest multiple of one half.
    pub fn half_round(self) -> Self {
        const HALF_MASK: i32 = !0 << (Fixed::FRACT_BITS - 1);
        Self(self.0.saturating_add(Self::ROUND >> 1) & HALF_MASK)
    }

    /// Returns the absolute value of the number.
    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Returns the largest integer less than or equal to the number.
    pub fn floor(self) -> Self {
        Self(self.0 & Self::INT_MASK)
    }

    /// Returns the fractional part of the number.
    pub fn fract(self) -> Self {
        Self(self.0 - self.floor().0)
    }

    /// Returns -1, 0 or 1 according to the sign of the number.
    pub fn signum(self) -> i32 {
        self.0.signum()
    }

    /// Returns true if the value is pinned at either extreme.
    pub fn is_saturated(self) -> bool {
        self == Self::MIN || self == Self::MAX
    }

    /// Returns the reciprocal.
    pub fn recip(self) -> Self {
        Self::ONE / self
    }

    /// Computes `self * a / b` with a single rounding step.
    pub fn mul_div(self, a: Self, b: Self) -> Self {
        let numerator = self.0 as i64 * a.0 as i64;
        Self::saturate(div_round(numerator, b.0 as i64))
    }

    /// Creates a fixed point value from an f64.
    ///
    /// This operation is lossy; the float will be rounded to the nearest
    /// representable value.
    pub fn from_f64(x: f64) -> Self {
        // NaN becomes zero and infinities saturate through the cast
        Self::saturate((x * Self::ONE_BITS as f64).round() as i64)
    }

    /// Returns the value as an f64.
    ///
    /// This operation is lossless: all representable values can be
    /// round-tripped.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::ONE_BITS as f64
    }

    /// Saturating addition.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    fn saturate(bits: i64) -> Self {
        Self(bits.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }
}

/// Integer division rounding half away from zero.
///
/// A zero divisor saturates toward the sign of the dividend.
fn div_round(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return match numerator.signum() {
            1 => i64::MAX,
            -1 => i64::MIN,
            _ => 0,
        };
    }
    let (n, d) = (numerator.unsigned_abs(), denominator.unsigned_abs());
    let quotient = ((n + d / 2) / d).min(i64::MAX as u64) as i64;
    if (numerator < 0) != (denominator < 0) {
        -quotient
    } else {
        quotient
    }
}

impl Add for Fixed {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Fixed {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        self.saturating_sub(other)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul for Fixed {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        let product = self.0 as i64 * other.0 as i64;
        Self::saturate((product + Self::ROUND as i64) >> Self::FRACT_BITS)
    }
}

impl Div for Fixed {
    type Output = Self;
    #[inline(always)]
    fn div(self, other: Self) -> Self {
        let numerator = (self.0 as i64) << Self::FRACT_BITS;
        Self::saturate(div_round(numerator, other.0 as i64))
    }
}

impl Neg for Fixed {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

//hack: we can losslessly go to float, so use those fmt impls
impl core::fmt::Display for Fixed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.to_f64().fmt(f)
    }
}

impl core::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.to_f64().fmt(f)
    }
}
