/// 16.16 fixed-point arithmetic.
///
/// Values are stored as raw 32-bit words and every operation wraps, so a
/// computation that overflows or goes negative behaves exactly like the
/// unsigned register math the card-flip curve was tuned against.
/// Integer extraction truncates toward negative infinity (arithmetic shift)
/// and keeps the low 16 bits, which is what a 16-bit scanline register sees.

use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Fixed16(u32);

impl Fixed16 {
    pub const FRAC_BITS: u32 = 16;
    pub const ZERO: Fixed16 = Fixed16(0);
    pub const ONE: Fixed16 = Fixed16(1 << Self::FRAC_BITS);

    pub const fn from_raw(raw: u32) -> Self {
        Fixed16(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Integer `n` as a 16.16 value. The fractional part is zero.
    pub const fn from_int(n: i32) -> Self {
        Fixed16((n as u32) << Self::FRAC_BITS)
    }

    /// Integer part, truncated to a signed 16-bit word.
    pub const fn trunc(self) -> i16 {
        (self.0 >> Self::FRAC_BITS) as u16 as i16
    }
}

impl Add for Fixed16 {
    type Output = Fixed16;
    fn add(self, rhs: Fixed16) -> Fixed16 {
        Fixed16(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Fixed16 {
    type Output = Fixed16;
    fn sub(self, rhs: Fixed16) -> Fixed16 {
        Fixed16(self.0.wrapping_sub(rhs.0))
    }
}

impl AddAssign for Fixed16 {
    fn add_assign(&mut self, rhs: Fixed16) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed16 {
    fn sub_assign(&mut self, rhs: Fixed16) {
        *self = *self - rhs;
    }
}

/// Scale by an integer count (wrapping).
impl Mul<u32> for Fixed16 {
    type Output = Fixed16;
    fn mul(self, rhs: u32) -> Fixed16 {
        Fixed16(self.0.wrapping_mul(rhs))
    }
}

/// Divide by an integer count. Unsigned division of the raw word; panics on
/// a zero divisor like any integer division.
impl Div<u32> for Fixed16 {
    type Output = Fixed16;
    fn div(self, rhs: u32) -> Fixed16 {
        Fixed16(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_int_places_value_in_high_word() {
        assert_eq!(Fixed16::from_int(160).raw(), 0x00A0_0000);
        assert_eq!(Fixed16::from_int(-1).raw(), 0xFFFF_0000);
        assert_eq!(Fixed16::from_int(-7).trunc(), -7);
    }

    #[test]
    fn trunc_rounds_toward_negative_infinity() {
        // -0.5 → -1, +1.5 → 1
        assert_eq!(Fixed16::from_raw(0xFFFF_8000).trunc(), -1);
        assert_eq!(Fixed16::from_raw(0x0001_8000).trunc(), 1);
    }

    #[test]
    fn subtraction_wraps_through_zero() {
        let x = Fixed16::ZERO - Fixed16::ONE;
        assert_eq!(x, Fixed16::from_int(-1));
        assert_eq!(x + Fixed16::ONE, Fixed16::ZERO);
    }

    #[test]
    fn integer_divide_truncates() {
        // 160 / 146 = 1.0958... → raw 0x11886 (truncated)
        let q = Fixed16::from_int(160) / 146;
        assert_eq!(q.raw(), 0x00A0_0000 / 146);
        assert_eq!(q.trunc(), 1);
    }

    #[test]
    fn mul_scales_raw_word() {
        assert_eq!((Fixed16::ONE * 3).trunc(), 3);
        assert_eq!((Fixed16::from_raw(0x8000) * 3).raw(), 0x18000);
    }
}
