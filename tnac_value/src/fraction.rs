//! Exact rationals with an explicit sign and an infinity marker
//!
//! Invariant: the denominator is always >= 1 unless the infinity
//! marker is set (denominator 0). A zero numerator with the marker set
//! denotes the NaN-tagged fraction produced by `0/0`.

use num_integer::Integer;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: u64,
    den: u64,
    sign: i8,
}

impl Fraction {
    /// Builds a normalised fraction from signed parts.
    /// A zero denominator sets the infinity marker.
    pub fn new(num: i64, den: i64) -> Self {
        let sign = if (num < 0) != (den < 0) { -1 } else { 1 };
        let num = num.unsigned_abs();
        let den = den.unsigned_abs();
        Self { num, den, sign }.normalised()
    }

    pub fn zero() -> Self {
        Self { num: 0, den: 1, sign: 1 }
    }

    pub fn num(&self) -> u64 {
        self.num
    }

    pub fn denom(&self) -> u64 {
        self.den
    }

    pub fn sign(&self) -> i8 {
        self.sign
    }

    pub fn signed_num(&self) -> i64 {
        self.sign as i64 * self.num as i64
    }

    /// True when the denominator collapsed to zero
    pub fn is_infinity(&self) -> bool {
        self.den == 0
    }

    /// The `0/0` case
    pub fn is_nan(&self) -> bool {
        self.den == 0 && self.num == 0
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0 && !self.is_infinity()
    }

    pub fn to_f64(&self) -> f64 {
        if self.is_nan() {
            return f64::NAN;
        }
        if self.is_infinity() {
            return self.sign as f64 * f64::INFINITY;
        }
        self.sign as f64 * (self.num as f64 / self.den as f64)
    }

    pub fn abs(&self) -> Self {
        Self { sign: 1, ..*self }
    }

    pub fn neg(&self) -> Self {
        Self { sign: -self.sign, ..*self }
    }

    pub fn recip(&self) -> Self {
        Self { num: self.den, den: self.num, sign: self.sign }.normalised()
    }

    pub fn add(&self, rhs: &Self) -> Self {
        if self.is_infinity() || rhs.is_infinity() {
            return self.combine_inf(rhs);
        }
        let l = self.signed_num() * rhs.den as i64;
        let r = rhs.signed_num() * self.den as i64;
        Self::new(l + r, (self.den * rhs.den) as i64)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        if self.is_infinity() || rhs.is_infinity() {
            return self.combine_inf(rhs);
        }
        Self::new(self.signed_num() * rhs.num as i64, (self.den * rhs.den) as i64)
    }

    /// Division by a zero fraction sets the infinity marker
    pub fn div(&self, rhs: &Self) -> Self {
        if self.is_infinity() || rhs.is_infinity() {
            return self.combine_inf(rhs);
        }
        Self::new(self.signed_num() * rhs.den as i64, (self.den * rhs.num) as i64 * rhs.sign as i64)
    }

    pub fn eq_value(&self, rhs: &Self) -> bool {
        if self.is_nan() || rhs.is_nan() {
            return false;
        }
        // normalised, so structural equality is value equality,
        // modulo the sign of zero
        (self.is_zero() && rhs.is_zero())
            || (self.sign == rhs.sign && self.num == rhs.num && self.den == rhs.den)
    }

    pub fn less(&self, rhs: &Self) -> bool {
        self.to_f64() < rhs.to_f64()
    }

    fn combine_inf(&self, rhs: &Self) -> Self {
        // any arithmetic touching an infinity-marked fraction stays marked
        let sign = self.sign * rhs.sign;
        let num = if self.is_nan() || rhs.is_nan() { 0 } else { 1 };
        Self { num, den: 0, sign }
    }

    fn normalised(self) -> Self {
        if self.den == 0 {
            let num = if self.num == 0 { 0 } else { 1 };
            return Self { num, den: 0, sign: self.sign };
        }
        if self.num == 0 {
            return Self { num: 0, den: 1, sign: 1 };
        }
        let g = self.num.gcd(&self.den);
        Self { num: self.num / g, den: self.den / g, sign: self.sign }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            return write!(f, "0/0");
        }
        if self.sign < 0 {
            write!(f, "-")?;
        }
        if self.is_infinity() {
            return write!(f, "inf");
        }
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalises_on_construction() {
        let f = Fraction::new(2, 4);
        assert_eq!((f.num(), f.denom(), f.sign()), (1, 2, 1));
        let g = Fraction::new(-3, 6);
        assert_eq!((g.num(), g.denom(), g.sign()), (1, 2, -1));
        let h = Fraction::new(3, -6);
        assert_eq!(h.sign(), -1);
    }

    #[test]
    fn arithmetic() {
        let half = Fraction::new(1, 2);
        let third = Fraction::new(1, 3);
        assert!(half.add(&third).eq_value(&Fraction::new(5, 6)));
        assert!(half.sub(&third).eq_value(&Fraction::new(1, 6)));
        assert!(half.mul(&third).eq_value(&Fraction::new(1, 6)));
        assert!(half.div(&third).eq_value(&Fraction::new(3, 2)));
    }

    #[test]
    fn division_by_zero_marks_infinity() {
        let f = Fraction::new(1, 2).div(&Fraction::zero());
        assert!(f.is_infinity());
        assert!(!f.is_nan());
        assert_eq!(f.to_f64(), f64::INFINITY);

        let nan = Fraction::zero().div(&Fraction::zero());
        assert!(nan.is_nan());
        assert!(nan.to_f64().is_nan());
    }

    #[test]
    fn denominator_at_least_one_unless_infinite() {
        let cases = [Fraction::new(0, 5), Fraction::new(7, 3), Fraction::new(-7, 3)];
        for c in cases {
            assert!(c.denom() >= 1);
        }
    }

    #[test]
    fn ordering_matches_float_value() {
        assert!(Fraction::new(1, 3).less(&Fraction::new(1, 2)));
        assert!(Fraction::new(-1, 2).less(&Fraction::new(1, 3)));
    }
}
