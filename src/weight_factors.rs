use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ball::CertifiedReal, errors::{GKError, Result}, generators::GeneratorSequence};

///
/// Moments of `exp(-x^2/2) / sqrt(2 pi)`: zero for odd indices and the
/// double factorial `(2j - 1)!!` at index `2j`.
///
pub fn gaussian_moments(count: usize) -> Vec<BigInt>
{
    let mut moments = Vec::with_capacity(count);
    let mut even = BigInt::from(1);
    for i in 0..count
    {
        if i % 2 == 0
        {
            moments.push(even.clone());
            even *= i + 1;
        }
        else
        {
            moments.push(BigInt::from(0));
        }
    }
    moments
}

///
/// Square table of precomputed weight contributions. Entry `(xi, theta)`
/// with `theta >= xi` is `a_theta / prod_{t != xi, t <= theta} (g_xi^2 - g_t^2)`.
/// Entries below the diagonal stay zero and are never read.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightFactorTable
{
    size: usize,
    /// Row major
    factors: Vec<CertifiedReal>,
    working_precision: u32,
}

impl WeightFactorTable
{
    /// Table for the Gaussian weight function.
    pub fn new(generators: &GeneratorSequence, working_prec: u32) -> Result<Self>
    {
        let moments: Vec<BigRational> = gaussian_moments(2 * generators.len() + 1)
            .into_iter().map(BigRational::from_integer).collect();
        Self::with_moments(generators, &moments, working_prec)
    }

    ///
    /// Table for an arbitrary weight function given by its normalized
    /// moments. At least `2 N - 1` moments are needed for `N` generators;
    /// missing moments count as zero.
    ///
    pub fn with_moments(generators: &GeneratorSequence, moments: &[BigRational], working_prec: u32) -> Result<Self>
    {
        let size = generators.len();
        let squares: Vec<CertifiedReal> = generators.iter().map(|g| g.sqr(working_prec)).collect();
        let a = moment_coefficients(&squares, moments, working_prec);

        let mut factors = vec![CertifiedReal::zero(); size * size];
        for xi in 0..size
        {
            let mut c = CertifiedReal::one();
            for theta in 0..size
            {
                if theta != xi
                {
                    c = c.mul(&squares[xi].sub(&squares[theta], working_prec), working_prec);
                }
                if theta >= xi
                {
                    factors[xi * size + theta] = a[theta].div(&c, working_prec)
                        .map_err(|_| GKError::DegenerateDenominator { row: xi, column: theta })?;
                }
            }
        }
        debug!(size, working_prec, "weight factor table");
        Ok(Self { size, factors, working_precision: working_prec })
    }

    pub fn size(&self) -> usize
    {
        self.size
    }

    pub fn working_precision(&self) -> u32
    {
        self.working_precision
    }

    #[inline]
    pub fn get(&self, xi: usize, theta: usize) -> &CertifiedReal
    {
        &self.factors[xi * self.size + theta]
    }

    /// Row `xi` from the diagonal onwards.
    pub fn row(&self, xi: usize) -> &[CertifiedReal]
    {
        &self.factors[xi * self.size + xi..(xi + 1) * self.size]
    }
}

///
/// `a_0 = 1` and `a_i = sum_d coeff_d(prod_{j < i} (x^2 - g_j^2)) m_d`, with the
/// product expanded one factor at a time in ball arithmetic.
///
fn moment_coefficients(squares: &[CertifiedReal], moments: &[BigRational], prec: u32) -> Vec<CertifiedReal>
{
    let moment = |d: usize| moments.get(d).map(|m| CertifiedReal::from_rational(m, prec)).unwrap_or_default();
    let mut a = Vec::with_capacity(squares.len());
    let mut poly = vec![CertifiedReal::one()];
    a.push(CertifiedReal::one());
    for g2 in squares.iter().take(squares.len().saturating_sub(1))
    {
        // poly *= x^2 - g^2
        let mut next = vec![CertifiedReal::zero(); poly.len() + 2];
        for (d, coeff) in poly.iter().enumerate()
        {
            next[d + 2] = next[d + 2].add(coeff, prec);
            next[d] = next[d].sub(&coeff.mul(g2, prec), prec);
        }
        poly = next;
        let mut ai = CertifiedReal::zero();
        for (d, coeff) in poly.iter().enumerate()
        {
            ai = ai.add(&coeff.mul(&moment(d), prec), prec);
        }
        if ai.mid_is_zero()
        {
            ai = CertifiedReal::zero();
        }
        a.push(ai);
    }
    a
}

#[cfg(test)]
fn sqrt3_generators(prec: u32) -> GeneratorSequence
{
    let sqrt3 = CertifiedReal::from_integer(3).sqrt(prec).unwrap();
    GeneratorSequence::from_generators(vec![CertifiedReal::zero(), sqrt3], prec)
}

#[cfg(test)]
fn close(ball: &CertifiedReal, value: f64) -> bool
{
    (ball.to_f64() - value).abs() < 1e-15
}

#[test]
fn test_gaussian_moments()
{
    let moments: Vec<i64> = gaussian_moments(9).iter().map(|m| i64::try_from(m).unwrap()).collect();
    assert_eq!(moments, vec![1, 0, 1, 0, 3, 0, 15, 0, 105]);
}

#[test]
fn test_two_generator_table()
{
    let table = WeightFactorTable::new(&sqrt3_generators(128), 128).unwrap();
    assert_eq!(table.size(), 2);
    assert!(close(table.get(0, 0), 1.0));
    assert!(close(table.get(0, 1), -1.0 / 3.0));
    assert!(close(table.get(1, 1), 1.0 / 3.0));
    assert!(table.get(1, 0).mid_is_zero());
    assert!(table.get(0, 1).radius_below_2exp(-110));
    assert_eq!(table.row(1).len(), 1);
}

#[test]
fn test_rebuild_is_bit_identical()
{
    let generators = sqrt3_generators(96);
    let first = WeightFactorTable::new(&generators, 96).unwrap();
    let second = WeightFactorTable::new(&generators, 96).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_coincident_generators_fail()
{
    let one = CertifiedReal::one();
    let generators = GeneratorSequence::from_generators(vec![CertifiedReal::zero(), one.clone(), one], 64);
    assert_eq!(WeightFactorTable::new(&generators, 64), Err(GKError::DegenerateDenominator { row: 1, column: 2 }));
}
