use std::fmt::Display;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

///
/// Univariate polynomial with exact rational coefficients, stored from the
/// constant term upwards. The zero polynomial has no coefficients.
///
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RationalPolynomial
{
    #[serde_as(as = "Vec<DisplayFromStr>")]
    coeffs: Vec<BigRational>,
}

impl RationalPolynomial
{
    pub fn new(coeffs: Vec<BigRational>) -> Self
    {
        let mut r = Self { coeffs };
        r.trim();
        r
    }

    pub fn from_integers(coeffs: &[i64]) -> Self
    {
        Self::new(coeffs.iter().map(|&c| BigRational::from_integer(BigInt::from(c))).collect())
    }

    pub fn zero() -> Self
    {
        Self { coeffs: Vec::new() }
    }

    pub fn one() -> Self
    {
        Self { coeffs: vec![BigRational::one()] }
    }

    /// The polynomial `x`.
    pub fn x() -> Self
    {
        Self { coeffs: vec![BigRational::zero(), BigRational::one()] }
    }

    fn trim(&mut self)
    {
        while self.coeffs.last().is_some_and(|c| c.is_zero())
        {
            self.coeffs.pop();
        }
    }

    pub fn is_zero(&self) -> bool
    {
        self.coeffs.is_empty()
    }

    /// Degree; the zero polynomial reports 0.
    pub fn degree(&self) -> usize
    {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn coeff(&self, i: usize) -> BigRational
    {
        self.coeffs.get(i).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn coefficients(&self) -> &[BigRational]
    {
        &self.coeffs
    }

    pub fn leading_coefficient(&self) -> BigRational
    {
        self.coeffs.last().cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn add(&self, other: &Self) -> Self
    {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i) + other.coeff(i)).collect())
    }

    pub fn sub(&self, other: &Self) -> Self
    {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new((0..n).map(|i| self.coeff(i) - other.coeff(i)).collect())
    }

    pub fn mul(&self, other: &Self) -> Self
    {
        if self.is_zero() || other.is_zero()
        {
            return Self::zero();
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate()
        {
            if a.is_zero()
            {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate()
            {
                coeffs[i + j] += a * b;
            }
        }
        Self::new(coeffs)
    }

    pub fn scale(&self, factor: &BigRational) -> Self
    {
        Self::new(self.coeffs.iter().map(|c| c * factor).collect())
    }

    /// Multiply by `x^k`.
    pub fn shift(&self, k: usize) -> Self
    {
        if self.is_zero()
        {
            return Self::zero();
        }
        let mut coeffs = vec![BigRational::zero(); k];
        coeffs.extend(self.coeffs.iter().cloned());
        Self { coeffs }
    }

    pub fn evaluate(&self, x: &BigRational) -> BigRational
    {
        let mut r = BigRational::zero();
        for c in self.coeffs.iter().rev()
        {
            r = r * x + c;
        }
        r
    }

    pub fn derivative(&self) -> Self
    {
        Self::new(self.coeffs.iter().enumerate().skip(1)
            .map(|(i, c)| c * BigRational::from_integer(BigInt::from(i))).collect())
    }

    ///
    /// Reduce to lowest terms: trailing zeros removed and the leading
    /// coefficient scaled to one. The roots are unchanged.
    ///
    pub fn canonicalise(&mut self)
    {
        self.trim();
        let lead = self.leading_coefficient();
        if !lead.is_zero() && !lead.is_one()
        {
            self.coeffs.iter_mut().for_each(|c| *c /= &lead);
        }
    }

    /// Multiplicity of the root at zero.
    pub fn zero_root_multiplicity(&self) -> usize
    {
        self.coeffs.iter().take_while(|c| c.is_zero()).count()
    }

    /// Divide by `x^k`; the lowest `k` coefficients are dropped.
    pub fn deflate_zero_roots(&self, k: usize) -> Self
    {
        Self::new(self.coeffs.iter().skip(k).cloned().collect())
    }

    ///
    /// Quotient and remainder of the division by `divisor`. Returns `None`
    /// for a zero divisor.
    ///
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)>
    {
        if divisor.is_zero()
        {
            return None;
        }
        if self.coeffs.len() < divisor.coeffs.len()
        {
            return Some((Self::zero(), self.clone()));
        }
        let dd = divisor.degree();
        let lead = divisor.leading_coefficient();
        let mut rem = self.coeffs.clone();
        let mut quot = vec![BigRational::zero(); self.coeffs.len() - dd];
        for k in (0..quot.len()).rev()
        {
            let q = &rem[k + dd] / &lead;
            if !q.is_zero()
            {
                for (j, c) in divisor.coeffs.iter().enumerate()
                {
                    rem[k + j] -= &q * c;
                }
            }
            quot[k] = q;
        }
        rem.truncate(dd);
        Some((Self::new(quot), Self::new(rem)))
    }

    /// Divide by the absolute value of the leading coefficient.
    pub fn scale_to_unit_lead(&self) -> Self
    {
        let lead = self.leading_coefficient().abs();
        if lead.is_zero() || lead.is_one()
        {
            return self.clone();
        }
        Self::new(self.coeffs.iter().map(|c| c / &lead).collect())
    }

    ///
    /// Coefficients multiplied by the least common multiple of their
    /// denominators. The factor is positive, so signs are preserved.
    ///
    pub fn integer_coefficients(&self) -> Vec<BigInt>
    {
        let lcm = self.coeffs.iter().fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        self.coeffs.iter().map(|c| c.numer() * (&lcm / c.denom())).collect()
    }

    /// Sign of the polynomial at `x`: -1, 0 or 1.
    pub fn sign_at(&self, x: &BigRational) -> i32
    {
        let v = self.evaluate(x);
        if v.is_zero() { 0 } else if v.is_positive() { 1 } else { -1 }
    }

    ///
    /// Coefficients of the monic polynomial in double precision. Returns
    /// `None` if any coefficient is not finite.
    ///
    pub fn monic_f64(&self) -> Option<Vec<f64>>
    {
        let lead = self.leading_coefficient();
        if lead.is_zero()
        {
            return None;
        }
        let r: Vec<f64> = self.coeffs.iter().map(|c| (c / &lead).to_f64().unwrap_or(f64::NAN)).collect();
        r.iter().all(|c| c.is_finite()).then_some(r)
    }
}

impl Display for RationalPolynomial
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero()
        {
            return write!(f, "0");
        }
        let mut first = true;
        for (i, c) in self.coeffs.iter().enumerate().rev()
        {
            if c.is_zero()
            {
                continue;
            }
            if !first
            {
                write!(f, " + ")?;
            }
            first = false;
            match i
            {
                0 => write!(f, "{c}")?,
                1 => write!(f, "({c})*x")?,
                _ => write!(f, "({c})*x^{i}")?,
            }
        }
        Ok(())
    }
}

#[test]
fn test_mul_and_evaluate()
{
    // (x - 1)(x + 2) = x^2 + x - 2
    let p = RationalPolynomial::from_integers(&[-1, 1]).mul(&RationalPolynomial::from_integers(&[2, 1]));
    assert_eq!(p, RationalPolynomial::from_integers(&[-2, 1, 1]));
    assert_eq!(p.degree(), 2);
    assert_eq!(p.evaluate(&BigRational::from_integer(BigInt::from(3))), BigRational::from_integer(BigInt::from(10)));
    assert_eq!(p.sign_at(&BigRational::one()), 0);
    assert_eq!(p.derivative(), RationalPolynomial::from_integers(&[1, 2]));
}

#[test]
fn test_canonicalise_and_deflate()
{
    let mut p = RationalPolynomial::from_integers(&[0, 0, -6, 0, 2]);
    p.canonicalise();
    assert_eq!(p, RationalPolynomial::from_integers(&[0, 0, -3, 0, 1]));
    assert_eq!(p.zero_root_multiplicity(), 2);
    assert_eq!(p.deflate_zero_roots(2), RationalPolynomial::from_integers(&[-3, 0, 1]));
    assert!(RationalPolynomial::zero().mul(&p).is_zero());
}

#[test]
fn test_div_rem_and_integer_coefficients()
{
    // x^3 - 2x + 5 = (x - 1)(x^2 + x - 1) + 4
    let p = RationalPolynomial::from_integers(&[5, -2, 0, 1]);
    let (q, r) = p.div_rem(&RationalPolynomial::from_integers(&[-1, 1])).unwrap();
    assert_eq!(q, RationalPolynomial::from_integers(&[-1, 1, 1]));
    assert_eq!(r, RationalPolynomial::from_integers(&[4]));
    assert!(p.div_rem(&RationalPolynomial::zero()).is_none());

    let half = RationalPolynomial::new(vec![BigRational::new(BigInt::from(-1), BigInt::from(2)), BigRational::new(BigInt::from(1), BigInt::from(3))]);
    assert_eq!(half.integer_coefficients(), vec![BigInt::from(-3), BigInt::from(2)]);
    assert_eq!(half.scale(&BigRational::from_integer(BigInt::from(-3))).scale_to_unit_lead().leading_coefficient(), BigRational::from_integer(BigInt::from(-1)));
}
