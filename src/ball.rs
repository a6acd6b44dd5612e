//!
//! Certified real arithmetic. A `CertifiedReal` is a ball: an exact dyadic
//! midpoint together with an upper bound on the distance to the true value.
//! Every operation takes the working precision in bits; the exact result is
//! rounded to that many significant bits and the rounding error is folded
//! into the radius. Radius arithmetic is carried out in `f64` rounding
//! towards +inf, so radii below 2^-1074 are represented by the smallest
//! subnormal.
//!
use std::cmp::Ordering;
use std::fmt::Display;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::errors::{GKError, Result};

/// Upward rounded radius arithmetic.
pub(crate) mod mag
{
    use num_rational::BigRational;
    use num_traits::{Signed, ToPrimitive, Zero};

    pub const TINY: f64 = 4.940_656_458_412_465_4e-324;

    #[inline]
    pub fn next_up(x: f64) -> f64
    {
        if x.is_nan() || x == f64::INFINITY
        {
            f64::INFINITY
        }
        else if x == 0.0
        {
            TINY
        }
        else if x > 0.0
        {
            f64::from_bits(x.to_bits() + 1)
        }
        else
        {
            f64::from_bits(x.to_bits() - 1)
        }
    }

    /// Only meaningful for non-negative `x`.
    #[inline]
    pub fn next_down(x: f64) -> f64
    {
        if x <= TINY
        {
            0.0
        }
        else if x == f64::INFINITY
        {
            f64::MAX
        }
        else
        {
            f64::from_bits(x.to_bits() - 1)
        }
    }

    #[inline]
    pub fn add_up(a: f64, b: f64) -> f64
    {
        if a == 0.0 && b == 0.0 { 0.0 } else { next_up(a + b) }
    }

    #[inline]
    pub fn mul_up(a: f64, b: f64) -> f64
    {
        if a == 0.0 || b == 0.0 { 0.0 } else { next_up(a * b) }
    }

    /// `b` must be positive.
    #[inline]
    pub fn div_up(a: f64, b: f64) -> f64
    {
        if a == 0.0 { 0.0 } else { next_up(a / b) }
    }

    #[inline]
    pub fn sub_down(a: f64, b: f64) -> f64
    {
        if a <= b { 0.0 } else { next_down(a - b) }
    }

    /// Upper bound of 2^e.
    pub fn pow2(e: i64) -> f64
    {
        if e > 1023
        {
            f64::INFINITY
        }
        else if e >= -1022
        {
            f64::from_bits(((e + 1023) as u64) << 52)
        }
        else if e >= -1074
        {
            f64::from_bits(1_u64 << (e + 1074))
        }
        else
        {
            TINY
        }
    }

    /// Upper bound of |q|.
    pub fn abs_up(q: &BigRational) -> f64
    {
        if q.is_zero()
        {
            return 0.0;
        }
        let f = q.abs().to_f64().unwrap_or(f64::INFINITY);
        next_up(f)
    }

    /// Lower bound of |q|.
    pub fn abs_down(q: &BigRational) -> f64
    {
        if q.is_zero()
        {
            return 0.0;
        }
        let f = q.abs().to_f64().unwrap_or(0.0);
        next_down(f)
    }
}

///
/// Round `q` to `prec` significant bits. Returns the rounded dyadic value and
/// an upper bound for the rounding error.
///
pub(crate) fn round_to_prec(q: BigRational, prec: u32) -> (BigRational, f64)
{
    if q.is_zero()
    {
        return (q, 0.0);
    }
    let numer = q.numer();
    let denom = q.denom();
    let numer_bits = numer.bits() as i64;
    let denom_bits = denom.bits() as i64;
    let dyadic = denom.trailing_zeros() == Some(denom.bits() - 1);
    if dyadic && numer_bits <= prec as i64
    {
        return (q, 0.0);
    }
    // |q| / 2^e lies in [2^prec, 2^(prec + 2))
    let e = numer_bits - denom_bits - 1 - prec as i64;
    let (num, den) = if e >= 0
    {
        (numer.clone(), denom.clone() << (e as usize))
    }
    else
    {
        (numer.clone() << ((-e) as usize), denom.clone())
    };
    let (mut m, r) = num.div_rem(&den);
    let err = if r.is_zero()
    {
        0.0
    }
    else
    {
        if (r.abs() << 1_usize) >= den
        {
            if num.is_negative() { m -= 1 } else { m += 1 }
        }
        mag::pow2(e - 1)
    };
    let rounded = if e >= 0
    {
        BigRational::from_integer(m << (e as usize))
    }
    else
    {
        BigRational::new(m, BigInt::one() << ((-e) as usize))
    };
    (rounded, err)
}

fn radius_as_rational(rad: f64) -> Option<BigRational>
{
    BigRational::from_float(rad)
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CertifiedReal
{
    #[serde_as(as = "DisplayFromStr")]
    mid: BigRational,
    rad: f64,
}

impl Default for CertifiedReal
{
    fn default() -> Self {
        Self::zero()
    }
}

impl CertifiedReal
{
    pub fn zero() -> Self
    {
        Self { mid: BigRational::zero(), rad: 0.0 }
    }

    pub fn one() -> Self
    {
        Self { mid: BigRational::one(), rad: 0.0 }
    }

    /// Exact ball around an integer.
    pub fn from_integer<I: Into<BigInt>>(value: I) -> Self
    {
        Self { mid: BigRational::from_integer(value.into()), rad: 0.0 }
    }

    /// Exact ball around a rational, no rounding.
    pub fn exact(value: BigRational) -> Self
    {
        Self { mid: value, rad: 0.0 }
    }

    /// Ball around `value` rounded to `prec` bits.
    pub fn from_rational(value: &BigRational, prec: u32) -> Self
    {
        let (mid, rad) = round_to_prec(value.clone(), prec);
        Self { mid, rad }
    }

    ///
    /// Ball with an explicit midpoint and radius. The midpoint is stored as
    /// given; a negative or NaN radius is widened to +inf.
    ///
    pub fn with_radius(mid: BigRational, rad: f64) -> Self
    {
        let rad = if rad >= 0.0 { rad } else { f64::INFINITY };
        Self { mid, rad }
    }

    pub fn midpoint(&self) -> &BigRational
    {
        &self.mid
    }

    pub fn radius(&self) -> f64
    {
        self.rad
    }

    /// Midpoint rounded to the nearest double.
    pub fn to_f64(&self) -> f64
    {
        self.mid.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_exact(&self) -> bool
    {
        self.rad == 0.0
    }

    pub fn add(&self, other: &Self, prec: u32) -> Self
    {
        let (mid, err) = round_to_prec(&self.mid + &other.mid, prec);
        Self { mid, rad: mag::add_up(mag::add_up(self.rad, other.rad), err) }
    }

    pub fn sub(&self, other: &Self, prec: u32) -> Self
    {
        let (mid, err) = round_to_prec(&self.mid - &other.mid, prec);
        Self { mid, rad: mag::add_up(mag::add_up(self.rad, other.rad), err) }
    }

    pub fn neg(&self) -> Self
    {
        Self { mid: -self.mid.clone(), rad: self.rad }
    }

    pub fn mul(&self, other: &Self, prec: u32) -> Self
    {
        let (mid, err) = round_to_prec(&self.mid * &other.mid, prec);
        // |a| rb + |b| ra + ra rb
        let propagated = mag::add_up(
            mag::add_up(mag::mul_up(mag::abs_up(&self.mid), other.rad), mag::mul_up(mag::abs_up(&other.mid), self.rad)),
            mag::mul_up(self.rad, other.rad));
        Self { mid, rad: mag::add_up(propagated, err) }
    }

    pub fn sqr(&self, prec: u32) -> Self
    {
        self.mul(self, prec)
    }

    pub fn pow_ui(&self, exponent: u32, prec: u32) -> Self
    {
        let mut result = Self::one();
        for _ in 0..exponent
        {
            result = result.mul(self, prec);
        }
        result
    }

    ///
    /// Divide by `other`. Fails with `DivisionByZero` when the divisor ball
    /// contains zero.
    ///
    pub fn div(&self, other: &Self, prec: u32) -> Result<Self>
    {
        if other.contains_zero()
        {
            return Err(GKError::DivisionByZero);
        }
        let quotient = &self.mid / &other.mid;
        // (ra + |q| rb) / (|b| - rb)
        let lower = mag::sub_down(mag::abs_down(&other.mid), other.rad);
        if lower == 0.0
        {
            return Err(GKError::DivisionByZero);
        }
        let numerator = mag::add_up(self.rad, mag::mul_up(mag::abs_up(&quotient), other.rad));
        let propagated = mag::div_up(numerator, lower);
        let (mid, err) = round_to_prec(quotient, prec);
        Ok(Self { mid, rad: mag::add_up(propagated, err) })
    }

    pub fn div_ui(&self, divisor: u64, prec: u32) -> Self
    {
        let (mid, err) = round_to_prec(&self.mid / BigRational::from_integer(BigInt::from(divisor)), prec);
        let rad = mag::div_up(self.rad, mag::next_down(divisor as f64));
        Self { mid, rad: mag::add_up(rad, err) }
    }

    /// Multiply by 2^`exponent` (exact on the midpoint).
    pub fn mul_2exp(&self, exponent: i64) -> Self
    {
        let scale = if exponent >= 0
        {
            BigRational::from_integer(BigInt::one() << (exponent as usize))
        }
        else
        {
            BigRational::new(BigInt::one(), BigInt::one() << ((-exponent) as usize))
        };
        Self { mid: &self.mid * scale, rad: mag::mul_up(self.rad, mag::pow2(exponent)) }
    }

    pub fn sqrt(&self, prec: u32) -> Result<Self>
    {
        if !self.is_positive()
        {
            return Err(GKError::NegativeSquareRoot);
        }
        let half = prec as usize + 4;
        let scaled = (&self.mid * BigRational::from_integer(BigInt::one() << (2 * half))).floor().to_integer();
        let root = scaled.sqrt();
        // sqrt(mid) lies in [root, root + 1] / 2^half
        let approx = BigRational::new((root << 1_usize) + 1, BigInt::one() << (half + 1));
        let approx_err = mag::pow2(-(half as i64) - 1);
        let propagated = if self.rad == 0.0
        {
            0.0
        }
        else
        {
            let lower = mag::next_down(mag::sub_down(mag::abs_down(&self.mid), self.rad).sqrt());
            if lower == 0.0 { f64::INFINITY } else { mag::div_up(self.rad, lower) }
        };
        let (mid, err) = round_to_prec(approx, prec);
        Ok(Self { mid, rad: mag::add_up(mag::add_up(approx_err, propagated), err) })
    }

    /// Enclosure of pi via Machin's formula.
    pub fn pi(prec: u32) -> Self
    {
        let (s5, t5) = arctan_inverse(5, prec + 8);
        let (s239, t239) = arctan_inverse(239, prec + 8);
        let sixteen = BigRational::from_integer(BigInt::from(16));
        let four = BigRational::from_integer(BigInt::from(4));
        let exact = &sixteen * s5 - &four * s239;
        let tail = sixteen * t5 + four * t239;
        let (mid, err) = round_to_prec(exact, prec);
        Self { mid, rad: mag::add_up(mag::abs_up(&tail), err) }
    }

    pub fn mid_is_zero(&self) -> bool
    {
        self.mid.is_zero()
    }

    pub fn contains_zero(&self) -> bool
    {
        match radius_as_rational(self.rad)
        {
            Some(rad) => self.mid.abs() <= rad,
            None => true,
        }
    }

    /// Every point of the ball is >= 0.
    pub fn is_nonnegative(&self) -> bool
    {
        match radius_as_rational(self.rad)
        {
            Some(rad) => self.mid >= rad,
            None => false,
        }
    }

    /// Every point of the ball is > 0.
    pub fn is_positive(&self) -> bool
    {
        match radius_as_rational(self.rad)
        {
            Some(rad) => self.mid > rad,
            None => false,
        }
    }

    pub fn lower(&self) -> Option<BigRational>
    {
        radius_as_rational(self.rad).map(|rad| &self.mid - rad)
    }

    pub fn upper(&self) -> Option<BigRational>
    {
        radius_as_rational(self.rad).map(|rad| &self.mid + rad)
    }

    /// True if the radius is strictly smaller than 2^`exponent`.
    pub fn radius_below_2exp(&self, exponent: i64) -> bool
    {
        if exponent < -1074
        {
            self.rad == 0.0
        }
        else
        {
            self.rad < mag::pow2(exponent)
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool
    {
        match (radius_as_rational(self.rad), radius_as_rational(other.rad))
        {
            (Some(a), Some(b)) => (&self.mid - &other.mid).abs() <= a + b,
            _ => true,
        }
    }

    pub fn cmp_mid(&self, other: &Self) -> Ordering
    {
        self.mid.cmp(&other.mid)
    }
}

/// Partial sum of atan(1/x) and a bound on the omitted tail.
fn arctan_inverse(x: u32, bits: u32) -> (BigRational, BigRational)
{
    let x2 = BigInt::from(x) * BigInt::from(x);
    let threshold = BigRational::new(BigInt::one(), BigInt::one() << (bits as usize));
    let mut power = BigInt::from(x);
    let mut sum = BigRational::zero();
    let mut k: u64 = 0;
    loop
    {
        let term = BigRational::new(BigInt::one(), &power * BigInt::from(2 * k + 1));
        // alternating with decreasing terms: the first omitted term bounds the tail
        if term < threshold
        {
            return (sum, term);
        }
        if k % 2 == 0 { sum += term } else { sum -= term }
        power *= &x2;
        k += 1;
    }
}

impl Display for CertifiedReal
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = f.precision().unwrap_or(17);
        write!(f, "[{:.*e} +/- {:.3e}]", digits, self.to_f64(), self.rad)
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CertifiedComplex
{
    pub re: CertifiedReal,
    pub im: CertifiedReal,
}

impl CertifiedComplex
{
    pub fn real(re: CertifiedReal) -> Self
    {
        Self { re, im: CertifiedReal::zero() }
    }

    /// The imaginary part is certified to be exactly zero.
    pub fn is_certified_real(&self) -> bool
    {
        self.im.mid_is_zero() && self.im.is_exact()
    }

    pub fn may_be_real(&self) -> bool
    {
        self.im.contains_zero()
    }
}

#[cfg(test)]
fn rational(n: i64, d: i64) -> BigRational
{
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

#[test]
fn test_rounding_is_enclosing()
{
    let third = rational(1, 3);
    let ball = CertifiedReal::from_rational(&third, 64);
    assert!(!ball.is_exact());
    assert!(ball.radius_below_2exp(-64));
    let lower = ball.lower().unwrap();
    let upper = ball.upper().unwrap();
    assert!(lower <= third && third <= upper);
}

#[test]
fn test_dyadic_values_stay_exact()
{
    let ball = CertifiedReal::from_rational(&rational(3, 8), 16);
    assert!(ball.is_exact());
    let sum = ball.add(&CertifiedReal::from_integer(5), 16);
    assert!(sum.is_exact());
    assert_eq!(sum.midpoint(), &rational(43, 8));
}

#[test]
fn test_division_encloses_quotient()
{
    let prec = 80;
    let a = CertifiedReal::from_rational(&rational(2, 7), prec);
    let b = CertifiedReal::from_rational(&rational(-5, 11), prec);
    let q = a.div(&b, prec).unwrap();
    let exact = rational(-22, 35);
    assert!(q.lower().unwrap() <= exact && exact <= q.upper().unwrap());
    assert!(q.radius_below_2exp(-70));
}

#[test]
fn test_division_by_ball_containing_zero()
{
    let zero = CertifiedReal::with_radius(BigRational::zero(), 1e-30);
    assert_eq!(CertifiedReal::one().div(&zero, 64), Err(GKError::DivisionByZero));
    let exact_zero = CertifiedReal::zero();
    assert_eq!(CertifiedReal::one().div(&exact_zero, 64), Err(GKError::DivisionByZero));
}

#[test]
fn test_pi_and_sqrt()
{
    let prec = 128;
    let pi = CertifiedReal::pi(prec);
    assert!((pi.to_f64() - std::f64::consts::PI).abs() < 1e-15);
    assert!(pi.radius_below_2exp(-120));
    let root = pi.sqrt(prec).unwrap();
    assert!((root.to_f64() - std::f64::consts::PI.sqrt()).abs() < 1e-15);
    // squaring back must overlap the original enclosure
    assert!(root.sqr(prec).overlaps(&pi));
    assert_eq!(CertifiedReal::from_integer(-1).sqrt(prec), Err(GKError::NegativeSquareRoot));
}

#[test]
fn test_sign_predicates()
{
    let ball = CertifiedReal::with_radius(rational(1, 4), 0.5);
    assert!(ball.contains_zero());
    assert!(!ball.is_nonnegative());
    let tight = CertifiedReal::with_radius(rational(1, 4), 0.25);
    assert!(tight.is_nonnegative());
    assert!(!tight.is_positive());
    assert!(CertifiedReal::zero().is_nonnegative());
}

#[test]
fn test_serde_keeps_exact_midpoint()
{
    let ball = CertifiedReal::from_rational(&rational(1, 3), 100);
    let text = serde_json::to_string(&ball).unwrap();
    let back: CertifiedReal = serde_json::from_str(&text).unwrap();
    assert_eq!(ball, back);
}
