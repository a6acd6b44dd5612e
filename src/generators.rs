use std::cmp::Ordering;
use std::ops::Index;

use num_traits::Signed;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{ball::{CertifiedComplex, CertifiedReal}, errors::{GKError, Result}, extension::find_extension,
    families::PolynomialFamilyBackend, roots::isolate_roots, validation::validate_roots};

///
/// Ordered non-negative one dimensional node magnitudes. Each extension step
/// appends one block; the order inside a block follows the max-min
/// heuristic and is never changed afterwards.
///
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratorSequence
{
    generators: Vec<CertifiedReal>,
    /// (extension level, number of generators it contributed)
    blocks: Vec<(usize, usize)>,
    working_precision: u32,
}

impl GeneratorSequence
{
    pub fn new(working_precision: u32) -> Self
    {
        Self { generators: Vec::new(), blocks: Vec::new(), working_precision }
    }

    /// Sequence from already ordered generators, as a single block.
    pub fn from_generators(generators: Vec<CertifiedReal>, working_precision: u32) -> Self
    {
        let blocks = vec![(generators.len(), generators.len())];
        Self { generators, blocks, working_precision }
    }

    pub(crate) fn push_block(&mut self, level: usize, block: Vec<CertifiedReal>)
    {
        self.blocks.push((level, block.len()));
        self.generators.extend(block);
    }

    pub fn len(&self) -> usize
    {
        self.generators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertifiedReal>
    {
        self.generators.iter()
    }

    pub fn as_slice(&self) -> &[CertifiedReal]
    {
        &self.generators
    }

    pub fn blocks(&self) -> &[(usize, usize)]
    {
        &self.blocks
    }

    /// Extension levels that were actually applied.
    pub fn extension_levels(&self) -> Vec<usize>
    {
        self.blocks.iter().map(|&(level, _)| level).collect()
    }

    pub fn working_precision(&self) -> u32
    {
        self.working_precision
    }

    pub fn to_f64(&self) -> Vec<f64>
    {
        self.generators.iter().map(CertifiedReal::to_f64).collect()
    }
}

impl Index<usize> for GeneratorSequence
{
    type Output = CertifiedReal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.generators[index]
    }
}

///
/// Order the non-negative real roots by the max-min heuristic: take the
/// largest remaining midpoint, then the smallest, and alternate until none
/// are left. Ties go to the first candidate encountered.
///
pub fn max_min_sort(roots: &[CertifiedComplex]) -> Vec<CertifiedReal>
{
    let mut pool: Vec<CertifiedReal> = roots.iter()
        .filter(|z| z.is_certified_real() && !z.re.midpoint().is_negative())
        .map(|z| z.re.clone())
        .collect();
    let mut sorted = Vec::with_capacity(pool.len());
    let mut largest = true;
    while !pool.is_empty()
    {
        let wanted = if largest { Ordering::Greater } else { Ordering::Less };
        let mut best = 0;
        for (i, candidate) in pool.iter().enumerate().skip(1)
        {
            if candidate.cmp_mid(&pool[best]) == wanted
            {
                best = i;
            }
        }
        sorted.push(pool.remove(best));
        largest = !largest;
    }
    sorted
}

///
/// Compute the generators for the extension levels `p_0, ..., p_{k-1}`.
/// The roots of the degree `p_0` family polynomial form the first block;
/// every further level appends the roots of the Kronrod-type extension of
/// the product of all previous polynomials. Stops early (without error) when
/// an extension is not solvable.
///
pub fn compute_generators(family: &dyn PolynomialFamilyBackend, levels: &[usize], working_prec: u32) -> Result<GeneratorSequence>
{
    let (&first, rest) = levels.split_first().ok_or(GKError::EmptyExtensionLevels)?;
    let mut sequence = GeneratorSequence::new(working_prec);
    let mut product = family.polynomial(first);
    let roots = isolate_roots(&product, working_prec)?;
    validate_roots(&roots, family.root_domain());
    sequence.push_block(first, max_min_sort(&roots));
    debug!(level = first, generators = sequence.len(), "base generators");

    for &level in rest
    {
        let Some(extension) = find_extension(family, &product, level) else
        {
            warn!(level, generators = sequence.len(), "extension not solvable, stopping early");
            break;
        };
        let roots = isolate_roots(&extension, working_prec)?;
        validate_roots(&roots, family.root_domain());
        sequence.push_block(level, max_min_sort(&roots));
        debug!(level, generators = sequence.len(), "extended generators");

        product = product.mul(&extension);
        product.canonicalise();
    }
    Ok(sequence)
}

#[cfg(test)]
fn real(v: i64, d: i64) -> CertifiedComplex
{
    CertifiedComplex::real(CertifiedReal::exact(num_rational::BigRational::new(v.into(), d.into())))
}

#[test]
fn test_max_min_sort()
{
    let roots = vec![real(1, 1), real(-5, 1), real(4, 1), real(0, 1), real(3, 1), real(2, 1)];
    let sorted: Vec<f64> = max_min_sort(&roots).iter().map(CertifiedReal::to_f64).collect();
    assert_eq!(sorted, vec![4.0, 0.0, 3.0, 1.0, 2.0]);
}

#[test]
fn test_max_min_sort_ties_keep_first()
{
    let tagged = |v: i64, radius: f64| CertifiedComplex::real(CertifiedReal::with_radius(num_rational::BigRational::from_integer(v.into()), radius));
    let roots = vec![tagged(2, 1e-30), tagged(1, 2e-30), tagged(2, 3e-30), tagged(1, 4e-30)];
    let radii: Vec<f64> = max_min_sort(&roots).iter().map(CertifiedReal::radius).collect();
    assert_eq!(radii, vec![1e-30, 2e-30, 3e-30, 4e-30]);
}

#[test]
fn test_max_min_sort_skips_non_real()
{
    let mut complex = real(7, 1);
    complex.im = CertifiedReal::from_integer(1);
    let sorted = max_min_sort(&[complex, real(1, 2)]);
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].to_f64(), 0.5);
}

#[test]
fn test_hermite_generators()
{
    use crate::families::HermiteProbabilist;
    let generators = compute_generators(&HermiteProbabilist, &[1, 2], 96).unwrap();
    assert_eq!(generators.len(), 2);
    assert!(generators[0].mid_is_zero());
    assert!((generators[1].to_f64() - 3.0_f64.sqrt()).abs() < 1e-15);
    assert_eq!(generators.blocks(), &[(1, 1), (2, 1)]);
}

#[test]
fn test_unsolvable_extension_stops_early()
{
    use crate::families::HermiteProbabilist;
    let generators = compute_generators(&HermiteProbabilist, &[1, 1, 2], 64).unwrap();
    assert_eq!(generators.len(), 1);
    assert_eq!(generators.extension_levels(), vec![1]);
    assert_eq!(compute_generators(&HermiteProbabilist, &[], 64), Err(GKError::EmptyExtensionLevels));
}
