//!
//! Certified root isolation for polynomials with exact rational
//! coefficients.
//!
//! The number of distinct real roots is counted exactly with a Sturm
//! sequence. Approximations for all roots come from the Aberth-Ehrlich
//! iteration in double precision; those close to the real axis are polished
//! with Newton steps in exact rational arithmetic and certified by a sign
//! change. The fast result is accepted only if it yields pairwise disjoint
//! balls, one per real root counted. Otherwise the real roots are isolated
//! and refined by exact bisection on the Sturm sequence.
//!
//! Non-real roots are reported as complex balls whose radius
//! `n |p(z) / p'(z)|` is bounded from exact rational evaluations.
//!
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use rustfft::num_complex::Complex;
use tracing::debug;

use crate::{ball::{mag, round_to_prec, CertifiedComplex, CertifiedReal}, errors::{GKError, Result}, polynomial::RationalPolynomial};

const MAX_ABERTH_ITERATIONS: usize = 500;
const MAX_NEWTON_STEPS: usize = 100;
/// Relative size of the imaginary part below which a root is tried as real.
const REAL_TOLERANCE: f64 = 1e-7;

#[inline]
fn horner(coeffs: &[f64], z: Complex<f64>) -> (Complex<f64>, Complex<f64>)
{
    let mut p = Complex::new(0.0, 0.0);
    let mut dp = Complex::new(0.0, 0.0);
    for &c in coeffs.iter().rev()
    {
        dp = dp * z + p;
        p = p * z + c;
    }
    (p, dp)
}

///
/// Simultaneous approximation of all roots of `poly` (which must not
/// vanish at zero).
///
fn aberth(poly: &RationalPolynomial) -> Result<(Vec<f64>, Vec<Complex<f64>>)>
{
    let coeffs = poly.monic_f64().ok_or(GKError::NonFiniteCoefficients)?;
    let n = coeffs.len() - 1;
    // Fujiwara bound on the root moduli
    let mut radius = (1..=n)
        .map(|k| coeffs[n - k].abs().powf(1.0 / k as f64))
        .fold(0.0, f64::max);
    if !(radius > 0.0 && radius.is_finite())
    {
        radius = 1.0;
    }
    let mut z: Vec<Complex<f64>> = (0..n)
        .map(|k| Complex::from_polar(radius, 2.0 * std::f64::consts::PI * k as f64 / n as f64 + 0.4))
        .collect();
    for _ in 0..MAX_ABERTH_ITERATIONS
    {
        let mut max_step: f64 = 0.0;
        for i in 0..n
        {
            let (p, dp) = horner(&coeffs, z[i]);
            if p.norm() == 0.0 || dp.norm() == 0.0
            {
                continue;
            }
            let ratio = p / dp;
            let repulsion: Complex<f64> = (0..n).filter(|&j| j != i).map(|j| 1.0 / (z[i] - z[j])).sum();
            let step = ratio / (1.0 - ratio * repulsion);
            if !step.re.is_finite() || !step.im.is_finite()
            {
                continue;
            }
            z[i] -= step;
            max_step = max_step.max(step.norm() / z[i].norm().max(1.0));
        }
        if max_step < 4.0 * f64::EPSILON
        {
            break;
        }
    }
    Ok((coeffs, z))
}

fn pow2_rational(exponent: u32) -> BigRational
{
    BigRational::from_integer(BigInt::one() << (exponent as usize))
}

///
/// Polish `approximation` with exact Newton steps and certify a real root
/// near it by a sign change. Returns `None` if no sign change is found.
///
fn certify_real_root(poly: &RationalPolynomial, derivative: &RationalPolynomial, approximation: f64, prec: u32) -> Option<CertifiedReal>
{
    let working = prec + 16;
    let mut x = BigRational::from_float(approximation)?;
    for _ in 0..MAX_NEWTON_STEPS
    {
        let slope = derivative.evaluate(&x);
        if slope.is_zero()
        {
            break;
        }
        let step = poly.evaluate(&x) / slope;
        let scale = x.abs().max(BigRational::one());
        let converged = step.abs() * pow2_rational(working) < scale;
        x = round_to_prec(&x - step, working).0;
        if converged
        {
            break;
        }
    }
    let center = poly.sign_at(&x);
    if center == 0
    {
        return Some(CertifiedReal::exact(x));
    }
    let scale = x.abs().max(BigRational::one());
    let mut eps = scale / pow2_rational(prec + 1);
    for _ in 0..4
    {
        let left = poly.sign_at(&(&x - &eps));
        let right = poly.sign_at(&(&x + &eps));
        if left * right <= 0
        {
            return Some(CertifiedReal::with_radius(x, mag::abs_up(&eps)));
        }
        eps *= pow2_rational(8);
    }
    None
}

///
/// Sign of the integer polynomial `coeffs` (constant term first) at `x`,
/// computed without leaving the integers: with `x = a/b` and `b > 0` the
/// sign of `p(x)` is the sign of `sum c_i a^i b^(n-i)`.
///
fn integer_sign_at(coeffs: &[BigInt], x: &BigRational) -> i32
{
    let Some((lead, rest)) = coeffs.split_last() else
    {
        return 0;
    };
    let (a, b) = (x.numer(), x.denom());
    let mut r = lead.clone();
    let mut b_pow = BigInt::one();
    for c in rest.iter().rev()
    {
        b_pow *= b;
        r = r * a + c * &b_pow;
    }
    if r.is_zero() { 0 } else if r.is_positive() { 1 } else { -1 }
}

///
/// Sturm sequence `f_0 = p`, `f_1 = p'`, `f_{i+1} = -rem(f_{i-1}, f_i)`.
/// Members are scaled by positive factors to integer coefficients, which
/// leaves the sign variations unchanged.
///
#[derive(Clone, Debug)]
pub struct SturmSequence
{
    members: Vec<Vec<BigInt>>,
    /// Last nonzero remainder, `gcd(p, p')` up to a constant.
    gcd: RationalPolynomial,
}

impl SturmSequence
{
    pub fn new(poly: &RationalPolynomial) -> Self
    {
        let mut chain = vec![poly.scale_to_unit_lead()];
        let derivative = poly.derivative();
        if !derivative.is_zero()
        {
            chain.push(derivative.scale_to_unit_lead());
        }
        while chain.len() >= 2
        {
            let n = chain.len();
            let Some((_, rem)) = chain[n - 2].div_rem(&chain[n - 1]) else
            {
                break;
            };
            if rem.is_zero()
            {
                break;
            }
            chain.push(rem.scale(&-BigRational::one()).scale_to_unit_lead());
        }
        let gcd = chain.last().cloned().unwrap_or_else(RationalPolynomial::one);
        Self { members: chain.iter().map(RationalPolynomial::integer_coefficients).collect(), gcd }
    }

    pub fn len(&self) -> usize
    {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.members.is_empty()
    }

    /// `gcd(p, p')` up to a constant factor; of degree 0 iff `p` is squarefree.
    pub fn gcd(&self) -> &RationalPolynomial
    {
        &self.gcd
    }

    fn count_variations(signs: impl Iterator<Item = i32>) -> usize
    {
        let mut variations = 0;
        let mut last = 0;
        for s in signs.filter(|&s| s != 0)
        {
            if last != 0 && s != last
            {
                variations += 1;
            }
            last = s;
        }
        variations
    }

    /// Sign variations of the sequence evaluated at `x`.
    pub fn variations_at(&self, x: &BigRational) -> usize
    {
        Self::count_variations(self.members.iter().map(|m| integer_sign_at(m, x)))
    }

    fn variations_at_infinity(&self, positive: bool) -> usize
    {
        Self::count_variations(self.members.iter().map(|m| {
            let lead = m.last().map_or(0, |c| if c.is_positive() { 1 } else { -1 });
            if positive || m.len() % 2 == 1 { lead } else { -lead }
        }))
    }

    /// Number of distinct real roots in the half open interval `(lo, hi]`.
    pub fn count_roots_in(&self, lo: &BigRational, hi: &BigRational) -> usize
    {
        self.variations_at(lo).saturating_sub(self.variations_at(hi))
    }

    /// Number of distinct real roots.
    pub fn count_real_roots(&self) -> usize
    {
        self.variations_at_infinity(false).saturating_sub(self.variations_at_infinity(true))
    }
}

/// Power of two strictly above the Cauchy bound `1 + max |c_i / c_n|`.
fn root_bound(poly: &RationalPolynomial) -> BigRational
{
    let lead = poly.leading_coefficient().abs();
    let cauchy = poly.coefficients().iter().rev().skip(1)
        .map(|c| c.abs() / &lead)
        .fold(BigRational::zero(), |acc, c| if c > acc { c } else { acc })
        + BigRational::one();
    let mut bound = BigRational::from_integer(BigInt::from(2));
    while bound <= cauchy
    {
        bound *= BigRational::from_integer(BigInt::from(2));
    }
    bound
}

///
/// Split `(-B, B]` by bisection until every piece holds exactly one root of
/// the squarefree polynomial behind `sturm`.
///
fn isolating_intervals(sturm: &SturmSequence, bound: BigRational) -> Vec<(BigRational, BigRational)>
{
    let two = BigRational::from_integer(BigInt::from(2));
    let lo = -bound.clone();
    let (v_lo, v_hi) = (sturm.variations_at(&lo), sturm.variations_at(&bound));
    let mut pending = vec![(lo, v_lo, bound, v_hi)];
    let mut intervals = Vec::new();
    while let Some((lo, v_lo, hi, v_hi)) = pending.pop()
    {
        match v_lo.saturating_sub(v_hi)
        {
            0 => {}
            1 => intervals.push((lo, hi)),
            _ =>
            {
                let mid = (&lo + &hi) / &two;
                let v_mid = sturm.variations_at(&mid);
                pending.push((lo, v_lo, mid.clone(), v_mid));
                pending.push((mid, v_mid, hi, v_hi));
            }
        }
    }
    intervals
}

///
/// Shrink `(lo, hi]`, which holds exactly one simple root of `poly`, until
/// its half width is at most `max(1, |x|) 2^-(prec+1)`.
///
fn refine_root(poly: &[BigInt], mut lo: BigRational, mut hi: BigRational, prec: u32) -> CertifiedReal
{
    let sign_hi = integer_sign_at(poly, &hi);
    if sign_hi == 0
    {
        return CertifiedReal::exact(hi);
    }
    // sign just right of `lo`; `lo` itself may be a neighbouring root
    let sign_left = -sign_hi;
    let two = BigRational::from_integer(BigInt::from(2));
    let threshold = pow2_rational(prec);
    loop
    {
        let scale = hi.abs().max(lo.abs()).max(BigRational::one());
        if (&hi - &lo) * &threshold <= scale
        {
            break;
        }
        let mid = (&lo + &hi) / &two;
        match integer_sign_at(poly, &mid)
        {
            0 => return CertifiedReal::exact(mid),
            s if s == sign_left => lo = mid,
            _ => hi = mid,
        }
    }
    let radius = mag::abs_up(&((&hi - &lo) / &two));
    CertifiedReal::with_radius((lo + hi) / two, radius)
}

fn complex_mul(a: &(BigRational, BigRational), b: &(BigRational, BigRational)) -> (BigRational, BigRational)
{
    (&a.0 * &b.0 - &a.1 * &b.1, &a.0 * &b.1 + &a.1 * &b.0)
}

///
/// Ball around `z` of radius `n |p(z) / p'(z)|`, which always contains a
/// root of `poly`. The ratio is evaluated exactly at the double precision
/// point and only the final square root is rounded, upwards.
///
fn complex_enclosure(poly: &RationalPolynomial, z: Complex<f64>) -> CertifiedComplex
{
    let rational = |v: f64| BigRational::from_float(v).unwrap_or_else(BigRational::zero);
    let (re, im) = (rational(z.re), rational(z.im));
    let point = (re.clone(), im.clone());
    let mut p = (BigRational::zero(), BigRational::zero());
    let mut dp = (BigRational::zero(), BigRational::zero());
    for c in poly.coefficients().iter().rev()
    {
        let t = complex_mul(&dp, &point);
        dp = (t.0 + &p.0, t.1 + &p.1);
        let t = complex_mul(&p, &point);
        p = (t.0 + c, t.1);
    }
    let dp_norm = &dp.0 * &dp.0 + &dp.1 * &dp.1;
    let radius = if dp_norm.is_zero()
    {
        f64::INFINITY
    }
    else
    {
        let ratio = (&p.0 * &p.0 + &p.1 * &p.1) / dp_norm;
        mag::mul_up(poly.degree() as f64, mag::next_up(mag::abs_up(&ratio).sqrt()))
    };
    CertifiedComplex { re: CertifiedReal::with_radius(re, radius), im: CertifiedReal::with_radius(im, radius) }
}

///
/// Real roots of the squarefree polynomial `poly`, sorted and pairwise
/// disjoint. Tries the certified Aberth candidates first and falls back to
/// Sturm bisection when they do not account for every real root.
///
fn isolate_real_roots(poly: &RationalPolynomial, sturm: &SturmSequence, real_count: usize,
    approximations: Option<&[Complex<f64>]>, prec: u32) -> Vec<CertifiedReal>
{
    if let Some(approximations) = approximations
    {
        let derivative = poly.derivative();
        let mut roots: Vec<CertifiedReal> = approximations.iter()
            .filter(|z| z.im.abs() <= REAL_TOLERANCE * z.re.abs().max(1.0))
            .filter_map(|z| certify_real_root(poly, &derivative, z.re, prec))
            .collect();
        roots.sort_by(|a, b| a.cmp_mid(b));
        if roots.len() == real_count && !roots.windows(2).any(|w| w[0].overlaps(&w[1]))
        {
            return roots;
        }
        debug!(degree = poly.degree(), certified = roots.len(), real_count, "falling back to bisection");
    }
    let integer_poly = poly.integer_coefficients();
    let mut roots: Vec<CertifiedReal> = isolating_intervals(sturm, root_bound(poly)).into_iter()
        .map(|(lo, hi)| refine_root(&integer_poly, lo, hi, prec))
        .collect();
    roots.sort_by(|a, b| a.cmp_mid(b));
    roots
}

///
/// Isolate the complex roots of `poly` at working precision `prec`. Real
/// roots are certified and returned first in increasing order (roots at zero
/// are exact), followed by the non-real roots. Repeated non-zero roots are
/// reported once.
///
pub fn isolate_roots(poly: &RationalPolynomial, prec: u32) -> Result<Vec<CertifiedComplex>>
{
    let degree = poly.degree();
    if poly.is_zero() || degree == 0
    {
        return Ok(Vec::new());
    }
    let zeros = poly.zero_root_multiplicity();
    let mut reduced = poly.deflate_zero_roots(zeros);
    let mut real_roots: Vec<CertifiedReal> = vec![CertifiedReal::zero(); zeros];
    let mut complex_roots = Vec::new();
    if reduced.degree() > 0
    {
        let mut sturm = SturmSequence::new(&reduced);
        if sturm.gcd().degree() > 0
        {
            if let Some((squarefree, _)) = reduced.div_rem(sturm.gcd())
            {
                reduced = squarefree;
                sturm = SturmSequence::new(&reduced);
            }
        }
        let real_count = sturm.count_real_roots();
        let complex_count = reduced.degree() - real_count;
        let approximations = match aberth(&reduced)
        {
            Ok((_, z)) => Some(z),
            Err(_) if complex_count == 0 => None,
            Err(e) => return Err(e),
        };
        let reals = isolate_real_roots(&reduced, &sturm, real_count, approximations.as_deref(), prec);
        if reals.len() != real_count || reals.windows(2).any(|w| w[0].overlaps(&w[1]))
        {
            return Err(GKError::RootIsolationFailed { degree, isolated: zeros + reals.len() });
        }
        real_roots.extend(reals);
        if let Some(mut approximations) = approximations
        {
            approximations.sort_by(|a, b| b.im.abs().total_cmp(&a.im.abs()));
            complex_roots.extend(approximations.into_iter().take(complex_count).map(|z| complex_enclosure(&reduced, z)));
        }
    }
    debug!(degree, real = real_roots.len(), complex = complex_roots.len(), "isolated roots");
    Ok(real_roots.into_iter().map(CertifiedComplex::real).chain(complex_roots).collect())
}

#[cfg(test)]
fn contains(ball: &CertifiedReal, value: f64) -> bool
{
    (ball.to_f64() - value).abs() <= ball.radius() + 1e-15 * value.abs().max(1.0)
}

#[test]
fn test_hermite_roots()
{
    use crate::families::{HermiteProbabilist, PolynomialFamilyBackend};
    let roots = isolate_roots(&HermiteProbabilist.polynomial(3), 128).unwrap();
    assert_eq!(roots.len(), 3);
    assert!(roots.iter().all(|r| r.is_certified_real()));
    let expected = [-3.0_f64.sqrt(), 0.0, 3.0_f64.sqrt()];
    for (root, value) in roots.iter().zip(expected)
    {
        assert!(contains(&root.re, value));
        assert!(root.re.radius_below_2exp(-120));
    }
    assert!(roots[1].re.is_exact());
}

#[test]
fn test_exact_rational_root()
{
    // (2x - 1)(x + 3)
    let p = RationalPolynomial::from_integers(&[-3, 5, 2]);
    let roots = isolate_roots(&p, 64).unwrap();
    assert_eq!(roots.len(), 2);
    assert!(roots[1].re.is_exact());
    assert_eq!(roots[1].re.midpoint(), &BigRational::new(BigInt::from(1), BigInt::from(2)));
}

#[test]
fn test_non_real_roots()
{
    // x^2 + 1
    let roots = isolate_roots(&RationalPolynomial::from_integers(&[1, 0, 1]), 64).unwrap();
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|r| !r.is_certified_real()));
    assert!(roots.iter().all(|r| (r.im.to_f64().abs() - 1.0).abs() < 1e-10));
}

#[test]
fn test_constant_has_no_roots()
{
    assert!(isolate_roots(&RationalPolynomial::from_integers(&[4]), 64).unwrap().is_empty());
    assert!(isolate_roots(&RationalPolynomial::zero(), 64).unwrap().is_empty());
}

#[test]
fn test_sturm_counts()
{
    // x^3 - x has three real roots, x^2 + 1 none
    let cubic = SturmSequence::new(&RationalPolynomial::from_integers(&[0, -1, 0, 1]));
    assert_eq!(cubic.count_real_roots(), 3);
    let half = BigRational::new(BigInt::from(1), BigInt::from(2));
    assert_eq!(cubic.count_roots_in(&-half.clone(), &BigRational::one()), 2);
    assert_eq!(cubic.count_roots_in(&half, &BigRational::from_integer(BigInt::from(4))), 1);
    assert_eq!(SturmSequence::new(&RationalPolynomial::from_integers(&[1, 0, 1])).count_real_roots(), 0);

    // (x - 1)^2 (x + 2): two distinct roots, gcd x - 1
    let repeated = SturmSequence::new(&RationalPolynomial::from_integers(&[2, -3, 0, 1]));
    assert_eq!(repeated.count_real_roots(), 2);
    assert_eq!(repeated.gcd().degree(), 1);
}

#[test]
fn test_repeated_root_reported_once()
{
    // (x - 1)^2 (x + 2)
    let roots = isolate_roots(&RationalPolynomial::from_integers(&[2, -3, 0, 1]), 64).unwrap();
    assert_eq!(roots.len(), 2);
    assert!(contains(&roots[0].re, -2.0));
    assert!(contains(&roots[1].re, 1.0));
}

#[test]
fn test_bisection_refines_to_precision()
{
    // x^2 - 2 through the bisection path directly
    let poly = RationalPolynomial::from_integers(&[-2, 0, 1]);
    let sturm = SturmSequence::new(&poly);
    let roots = isolate_real_roots(&poly, &sturm, 2, None, 100);
    assert_eq!(roots.len(), 2);
    assert!(contains(&roots[0], -2.0_f64.sqrt()));
    assert!(roots[1].radius_below_2exp(-99));
    assert!(!roots[0].overlaps(&roots[1]));
}

#[test]
fn test_complex_enclosure_contains_root()
{
    // x^2 + 1 around an inexact guess for i
    let ball = complex_enclosure(&RationalPolynomial::from_integers(&[1, 0, 1]), Complex::new(1e-3, 1.01));
    assert!(ball.re.radius() >= (1e-6_f64 + 0.01 * 0.01).sqrt());
    assert!(ball.im.radius() < 0.1);
}

#[test]
fn test_high_degree_hermite_roots_are_all_real()
{
    use crate::families::{HermiteProbabilist, PolynomialFamilyBackend};
    for degree in [80, 100]
    {
        let roots = isolate_roots(&HermiteProbabilist.polynomial(degree), 128).unwrap();
        assert_eq!(roots.len(), degree);
        assert!(roots.iter().all(CertifiedComplex::is_certified_real));
        assert!(roots.windows(2).all(|w| w[0].re.cmp_mid(&w[1].re).is_lt() && !w[0].re.overlaps(&w[1].re)));
        assert!(roots.iter().all(|r| r.re.radius_below_2exp(-64)));
        // symmetric about the origin
        assert!(roots[0].re.neg().overlaps(&roots[degree - 1].re));
    }
}
