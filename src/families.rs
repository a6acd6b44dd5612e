use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::{ball::CertifiedReal, errors::Result, polynomial::RationalPolynomial};

/// Region of the real line that holds the roots of a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootDomain
{
    /// Anywhere on the real line.
    Real,
    /// Inside [-1, 1].
    UnitInterval,
    /// On [0, inf).
    NonNegative,
}

///
/// Orthogonal polynomial family with its weight function. Moments are split
/// into an exact rational part and a shared transcendental factor, so the
/// k-th moment of the weight function is `moment(k) * transcendental_factor()`.
///
pub trait PolynomialFamilyBackend
{
    /// Degree `n` member of the family.
    fn polynomial(&self, n: usize) -> RationalPolynomial;
    /// Rational part of the `k`-th moment.
    fn moment(&self, k: usize) -> BigRational;
    /// Transcendental normalization of the weight function.
    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>;
    fn root_domain(&self) -> RootDomain;
    /// The weight function is even, so odd moments vanish.
    fn is_symmetric(&self) -> bool;

    /// Moment of the weight function normalized to unit mass.
    fn normalized_moment(&self, k: usize) -> BigRational
    {
        self.moment(k) / self.moment(0)
    }

    fn normalized_moments(&self, count: usize) -> Vec<BigRational>
    {
        let m0 = self.moment(0);
        (0..count).map(|k| self.moment(k) / &m0).collect()
    }
}

fn integer(v: u64) -> BigRational
{
    BigRational::from_integer(BigInt::from(v))
}

/// (2m - 1)!!, with (-1)!! = 1.
fn double_factorial_odd(m: usize) -> BigInt
{
    (1..=m).fold(BigInt::one(), |acc, j| acc * BigInt::from(2 * j - 1))
}

fn central_binomial(m: usize) -> BigInt
{
    // C(2m, m) = prod_{j=1..m} (m + j) / j, exact at every step
    (1..=m).fold(BigInt::one(), |acc, j| acc * BigInt::from(m + j) / BigInt::from(j))
}

///
/// Build p_0..p_n from a three-term recurrence
/// `p_{k+1} = (a_k x + b_k) p_k - c_k p_{k-1}`.
///
fn three_term(n: usize, p1: RationalPolynomial, step: impl Fn(usize) -> (BigRational, BigRational, BigRational)) -> RationalPolynomial
{
    if n == 0
    {
        return RationalPolynomial::one();
    }
    let mut previous = RationalPolynomial::one();
    let mut current = p1;
    for k in 1..n
    {
        let (a, b, c) = step(k);
        let next = current.shift(1).scale(&a)
            .add(&current.scale(&b))
            .sub(&previous.scale(&c));
        previous = current;
        current = next;
    }
    current
}

#[derive(Clone, Copy, Debug)]
pub struct Legendre;

impl PolynomialFamilyBackend for Legendre
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        // (k + 1) P_{k+1} = (2k + 1) x P_k - k P_{k-1}
        three_term(n, RationalPolynomial::x(), |k| {
            let k1 = integer(k as u64 + 1);
            (integer(2 * k as u64 + 1) / &k1, BigRational::zero(), integer(k as u64) / k1)
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        if k % 2 == 1 { BigRational::zero() } else { BigRational::new(BigInt::from(2), BigInt::from(k + 1)) }
    }

    fn transcendental_factor(&self, _prec: u32) -> Result<CertifiedReal>
    {
        Ok(CertifiedReal::one())
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::UnitInterval
    }

    fn is_symmetric(&self) -> bool
    {
        true
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Laguerre;

impl PolynomialFamilyBackend for Laguerre
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        // (k + 1) L_{k+1} = (2k + 1 - x) L_k - k L_{k-1}
        three_term(n, RationalPolynomial::from_integers(&[1, -1]), |k| {
            let k1 = integer(k as u64 + 1);
            (-BigRational::one() / &k1, integer(2 * k as u64 + 1) / &k1, integer(k as u64) / k1)
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        BigRational::from_integer((1..=k).fold(BigInt::one(), |acc, j| acc * BigInt::from(j)))
    }

    fn transcendental_factor(&self, _prec: u32) -> Result<CertifiedReal>
    {
        Ok(CertifiedReal::one())
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::NonNegative
    }

    fn is_symmetric(&self) -> bool
    {
        false
    }
}

/// Hermite polynomials for the weight `exp(-x^2)`.
#[derive(Clone, Copy, Debug)]
pub struct HermitePhysicist;

impl PolynomialFamilyBackend for HermitePhysicist
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        // H_{k+1} = 2x H_k - 2k H_{k-1}
        three_term(n, RationalPolynomial::from_integers(&[0, 2]), |k| {
            (integer(2), BigRational::zero(), integer(2 * k as u64))
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        if k % 2 == 1
        {
            return BigRational::zero();
        }
        let m = k / 2;
        BigRational::new(double_factorial_odd(m), BigInt::one() << m)
    }

    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>
    {
        CertifiedReal::pi(prec + 8).sqrt(prec)
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::Real
    }

    fn is_symmetric(&self) -> bool
    {
        true
    }
}

/// Hermite polynomials for the Gaussian weight `exp(-x^2 / 2)`.
#[derive(Clone, Copy, Debug)]
pub struct HermiteProbabilist;

impl PolynomialFamilyBackend for HermiteProbabilist
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        // He_{k+1} = x He_k - k He_{k-1}
        three_term(n, RationalPolynomial::x(), |k| {
            (BigRational::one(), BigRational::zero(), integer(k as u64))
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        if k % 2 == 1 { BigRational::zero() } else { BigRational::from_integer(double_factorial_odd(k / 2)) }
    }

    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>
    {
        CertifiedReal::pi(prec + 8).mul_2exp(1).sqrt(prec)
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::Real
    }

    fn is_symmetric(&self) -> bool
    {
        true
    }
}

/// Chebyshev polynomials of the first kind, weight `1 / sqrt(1 - x^2)`.
#[derive(Clone, Copy, Debug)]
pub struct ChebyshevT;

impl PolynomialFamilyBackend for ChebyshevT
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        three_term(n, RationalPolynomial::x(), |_| {
            (integer(2), BigRational::zero(), BigRational::one())
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        if k % 2 == 1
        {
            return BigRational::zero();
        }
        let m = k / 2;
        BigRational::new(central_binomial(m), BigInt::one() << (2 * m))
    }

    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>
    {
        Ok(CertifiedReal::pi(prec))
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::UnitInterval
    }

    fn is_symmetric(&self) -> bool
    {
        true
    }
}

/// Chebyshev polynomials of the second kind, weight `sqrt(1 - x^2)`.
#[derive(Clone, Copy, Debug)]
pub struct ChebyshevU;

impl PolynomialFamilyBackend for ChebyshevU
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        three_term(n, RationalPolynomial::from_integers(&[0, 2]), |_| {
            (integer(2), BigRational::zero(), BigRational::one())
        })
    }

    fn moment(&self, k: usize) -> BigRational
    {
        if k % 2 == 1
        {
            return BigRational::zero();
        }
        let m = k / 2;
        BigRational::new(central_binomial(m), (BigInt::one() << (2 * m + 1)) * BigInt::from(m + 1))
    }

    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>
    {
        Ok(CertifiedReal::pi(prec))
    }

    fn root_domain(&self) -> RootDomain
    {
        RootDomain::UnitInterval
    }

    fn is_symmetric(&self) -> bool
    {
        true
    }
}

static LEGENDRE: Legendre = Legendre;
static LAGUERRE: Laguerre = Laguerre;
static HERMITE_PHYSICIST: HermitePhysicist = HermitePhysicist;
static HERMITE_PROBABILIST: HermiteProbabilist = HermiteProbabilist;
static CHEBYSHEV_T: ChebyshevT = ChebyshevT;
static CHEBYSHEV_U: ChebyshevU = ChebyshevU;

///
/// Selects one of the polynomial families at runtime.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolynomialFamily
{
    Legendre,
    Laguerre,
    HermitePhysicist,
    #[default]
    HermiteProbabilist,
    ChebyshevT,
    ChebyshevU,
}

impl PolynomialFamily
{
    pub fn backend(&self) -> &'static dyn PolynomialFamilyBackend
    {
        match self
        {
            PolynomialFamily::Legendre => &LEGENDRE,
            PolynomialFamily::Laguerre => &LAGUERRE,
            PolynomialFamily::HermitePhysicist => &HERMITE_PHYSICIST,
            PolynomialFamily::HermiteProbabilist => &HERMITE_PROBABILIST,
            PolynomialFamily::ChebyshevT => &CHEBYSHEV_T,
            PolynomialFamily::ChebyshevU => &CHEBYSHEV_U,
        }
    }
}

impl PolynomialFamilyBackend for PolynomialFamily
{
    fn polynomial(&self, n: usize) -> RationalPolynomial
    {
        self.backend().polynomial(n)
    }

    fn moment(&self, k: usize) -> BigRational
    {
        self.backend().moment(k)
    }

    fn transcendental_factor(&self, prec: u32) -> Result<CertifiedReal>
    {
        self.backend().transcendental_factor(prec)
    }

    fn root_domain(&self) -> RootDomain
    {
        self.backend().root_domain()
    }

    fn is_symmetric(&self) -> bool
    {
        self.backend().is_symmetric()
    }
}

#[cfg(test)]
fn ints(coeffs: &[i64]) -> RationalPolynomial
{
    RationalPolynomial::from_integers(coeffs)
}

#[test]
fn test_recurrences()
{
    assert_eq!(HermiteProbabilist.polynomial(3), ints(&[0, -3, 0, 1]));
    assert_eq!(HermitePhysicist.polynomial(3), ints(&[0, -12, 0, 8]));
    assert_eq!(ChebyshevT.polynomial(4), ints(&[1, 0, -8, 0, 8]));
    assert_eq!(ChebyshevU.polynomial(2), ints(&[-1, 0, 4]));
    // P_2 = (3x^2 - 1) / 2
    let p2 = Legendre.polynomial(2);
    assert_eq!(p2.coeff(2), BigRational::new(BigInt::from(3), BigInt::from(2)));
    assert_eq!(p2.coeff(0), BigRational::new(BigInt::from(-1), BigInt::from(2)));
    // L_2 = (x^2 - 4x + 2) / 2
    let l2 = Laguerre.polynomial(2);
    assert_eq!(l2.coeff(1), BigRational::from_integer(BigInt::from(-2)));
    assert_eq!(l2.coeff(2), BigRational::new(BigInt::from(1), BigInt::from(2)));
    assert_eq!(Legendre.polynomial(0), RationalPolynomial::one());
}

#[test]
fn test_polynomials_are_orthogonal()
{
    for family in [PolynomialFamily::Legendre, PolynomialFamily::Laguerre, PolynomialFamily::HermitePhysicist,
        PolynomialFamily::HermiteProbabilist, PolynomialFamily::ChebyshevT, PolynomialFamily::ChebyshevU]
    {
        let p4 = family.polynomial(4);
        for k in 0..4
        {
            let integral = p4.shift(k).coefficients().iter().enumerate()
                .fold(BigRational::zero(), |acc, (i, c)| acc + c * family.moment(i));
            assert!(integral.is_zero(), "{family:?} not orthogonal to x^{k}");
        }
    }
}

#[test]
fn test_moments()
{
    assert_eq!(HermiteProbabilist.moment(6), integer(15));
    assert_eq!(HermitePhysicist.moment(4), BigRational::new(BigInt::from(3), BigInt::from(4)));
    assert_eq!(ChebyshevT.moment(2), BigRational::new(BigInt::from(1), BigInt::from(2)));
    assert_eq!(ChebyshevU.moment(0), BigRational::new(BigInt::from(1), BigInt::from(2)));
    assert_eq!(Laguerre.moment(4), integer(24));
    assert_eq!(Legendre.normalized_moment(2), BigRational::new(BigInt::from(1), BigInt::from(3)));
}

#[test]
fn test_transcendental_factors()
{
    let prec = 96;
    let f = HermiteProbabilist.transcendental_factor(prec).unwrap();
    assert!((f.to_f64() - (2.0 * std::f64::consts::PI).sqrt()).abs() < 1e-14);
    let f = HermitePhysicist.transcendental_factor(prec).unwrap();
    assert!((f.to_f64() - std::f64::consts::PI.sqrt()).abs() < 1e-14);
    assert!(Legendre.transcendental_factor(prec).unwrap().is_exact());
}
