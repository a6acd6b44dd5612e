//!
//! Genz-Keister assembly of a multidimensional rule from the one
//! dimensional generators and the weight factor table.
//!
//! Every admissible partition `P` contributes its fully symmetric orbit: all
//! distinct rearrangements of `P` combined with all sign patterns of the
//! nonzero entries. The orbit shares a single weight, the sum over the
//! lattice points `Q` with `|Q| <= K - |P|` of `prod_d table(P_d, P_d + Q_d)`.
//!
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::{ball::CertifiedReal, errors::{GKError, Result}, generators::GeneratorSequence,
    iterators::{lattice_points::LatticePoints, partitions::Partitions, permutations::Permutations},
    rule::QuadratureRule, weight_factors::WeightFactorTable};

/// Admissibility offsets indexed by partition entry.
pub const Z_SEQUENCE: [usize; 27] = [
    0, 0,
    1, 0, 0,
    3, 2, 1, 0, 0,
    5, 4, 3, 2, 1, 0, 0, 0,
    8, 7, 6, 5, 4, 3, 2, 1, 0,
];

/// Highest level the offsets cover.
pub const MAX_SUPPORTED_LEVEL: usize = Z_SEQUENCE.len() - 1;

///
/// `sum_d (P_d + Z[P_d])`, or `None` if an entry lies beyond the offset
/// table.
///
pub fn admissibility_sum(partition: &[usize]) -> Option<usize>
{
    partition.iter().try_fold(0, |acc, &p| Z_SEQUENCE.get(p).map(|z| acc + p + z))
}

pub fn is_admissible(partition: &[usize], level: usize) -> bool
{
    admissibility_sum(partition).is_some_and(|s| s <= level)
}

/// Number of sign patterns: one per subset of the nonzero entries.
pub fn sign_flip_count(partition: &[usize]) -> usize
{
    1 << partition.iter().filter(|&&p| p != 0).count()
}

///
/// Highest level a rule can be built for with `num_generators` generators.
/// `None` if there are no generators at all.
///
pub fn max_level(num_generators: usize) -> Option<usize>
{
    num_generators.checked_sub(1).map(|l| l.min(MAX_SUPPORTED_LEVEL))
}

///
/// Lazily expands a partition into the nodes of its symmetric orbit. For
/// every rearrangement the sign patterns are enumerated in binary order, bit
/// `u` flipping the `u`-th nonzero coordinate.
///
pub struct NodeExpander<'a>
{
    generators: &'a GeneratorSequence,
    permutations: Permutations,
    current: Option<Vec<usize>>,
    variant: usize,
    sign_flips: usize,
}

impl<'a> NodeExpander<'a>
{
    pub fn new(partition: &[usize], generators: &'a GeneratorSequence) -> Self
    {
        Self { generators, permutations: Permutations::new(partition), current: None, variant: 0, sign_flips: sign_flip_count(partition) }
    }

    /// Size of the orbit.
    pub fn num_nodes(partition: &[usize]) -> usize
    {
        Permutations::num_permutations(partition) * sign_flip_count(partition)
    }

    fn build_node(&self, indices: &[usize], variant: usize) -> Vec<CertifiedReal>
    {
        let mut u = 0;
        indices.iter().map(|&i|
        {
            let magnitude = &self.generators[i];
            if i == 0
            {
                return magnitude.clone();
            }
            let flip = (variant >> u) & 1 == 1;
            u += 1;
            if flip { magnitude.neg() } else { magnitude.clone() }
        }).collect()
    }
}

impl Iterator for NodeExpander<'_>
{
    type Item = Vec<CertifiedReal>;

    fn next(&mut self) -> Option<Self::Item> {
        loop
        {
            if self.current.is_none()
            {
                self.current = Some(self.permutations.next()?);
                self.variant = 0;
            }
            if let Some(indices) = &self.current
            {
                if self.variant < self.sign_flips
                {
                    let node = self.build_node(indices, self.variant);
                    self.variant += 1;
                    return Some(node);
                }
            }
            self.current = None;
        }
    }
}

///
/// Shared weight of the orbit of `partition` in the level `level` rule; zero
/// when the partition exceeds the level.
///
pub fn partition_weight(partition: &[usize], level: usize, table: &WeightFactorTable, prec: u32) -> CertifiedReal
{
    let Some(budget) = level.checked_sub(partition.iter().sum::<usize>()) else
    {
        return CertifiedReal::zero();
    };
    let mut total = CertifiedReal::zero();
    for q in LatticePoints::new(partition.len(), budget)
    {
        let mut w = CertifiedReal::one();
        for (&p, &offset) in partition.iter().zip(&q)
        {
            w = w.mul(table.get(p, p + offset), prec);
        }
        total = total.add(&w, prec);
    }
    let nonzero = partition.iter().filter(|&&p| p != 0).count();
    total.mul_2exp(-(nonzero as i64))
}

fn check_level(ndim: usize, level: usize, generators: &GeneratorSequence, table: &WeightFactorTable) -> Result<()>
{
    if ndim == 0
    {
        return Ok(());
    }
    match max_level(generators.len().min(table.size()))
    {
        Some(max_level) if level <= max_level => Ok(()),
        max_level => Err(GKError::LevelOutOfRange { level, max_level: max_level.unwrap_or(0) }),
    }
}

fn admissible_partitions(ndim: usize, level: usize) -> impl Iterator<Item = Vec<usize>>
{
    Partitions::new(ndim, level).filter(move |p| is_admissible(p, level))
}

fn partition_rule(partition: &[usize], ndim: usize, level: usize, generators: &GeneratorSequence, table: &WeightFactorTable, prec: u32) -> QuadratureRule
{
    let mut rule = QuadratureRule::new(ndim, level);
    let weight = partition_weight(partition, level, table, prec);
    for node in NodeExpander::new(partition, generators)
    {
        rule.push(node, weight.clone());
    }
    rule
}

///
/// Build the level `level` rule in `ndim` dimensions. Partitions are
/// visited in enumeration order and their orbits are appended in that order.
///
pub fn genz_keister_construction(ndim: usize, level: usize, generators: &GeneratorSequence, table: &WeightFactorTable, prec: u32) -> Result<QuadratureRule>
{
    check_level(ndim, level, generators, table)?;
    let mut rule = QuadratureRule::new(ndim, level);
    let mut terms = 0;
    for partition in admissible_partitions(ndim, level)
    {
        rule.append(partition_rule(&partition, ndim, level, generators, table, prec));
        terms += 1;
    }
    debug!(ndim, level, partitions = terms, nodes = rule.len(), "assembled rule");
    Ok(rule)
}

///
/// Same as [`genz_keister_construction`] with the partitions processed in
/// parallel. The node order is identical.
///
pub fn genz_keister_construction_parallel(ndim: usize, level: usize, generators: &GeneratorSequence, table: &WeightFactorTable, prec: u32) -> Result<QuadratureRule>
{
    check_level(ndim, level, generators, table)?;
    let partitions: Vec<Vec<usize>> = admissible_partitions(ndim, level).collect();
    let terms = partitions.len();
    let pieces: Vec<QuadratureRule> = partitions.into_par_iter()
        .map(|partition| partition_rule(&partition, ndim, level, generators, table, prec))
        .collect();
    let mut rule = QuadratureRule::new(ndim, level);
    for piece in pieces
    {
        rule.append(piece);
    }
    debug!(ndim, level, partitions = terms, nodes = rule.len(), "assembled rule in parallel");
    Ok(rule)
}

#[cfg(test)]
fn sqrt3_setup(prec: u32) -> (GeneratorSequence, WeightFactorTable)
{
    let sqrt3 = CertifiedReal::from_integer(3).sqrt(prec).unwrap();
    let generators = GeneratorSequence::from_generators(vec![CertifiedReal::zero(), sqrt3], prec);
    let table = WeightFactorTable::new(&generators, prec).unwrap();
    (generators, table)
}

#[test]
fn test_admissibility()
{
    assert_eq!(admissibility_sum(&[2, 0]), Some(3));
    assert!(is_admissible(&[1, 1], 2));
    assert!(!is_admissible(&[2], 2));
    assert!(is_admissible(&[2], 3));
    assert!(!is_admissible(&[27], 100));
    assert_eq!(sign_flip_count(&[0, 0]), 1);
    assert_eq!(sign_flip_count(&[3, 0, 1]), 4);
    assert_eq!(sign_flip_count(&[]), 1);
    assert_eq!(max_level(2), Some(1));
    assert_eq!(max_level(100), Some(MAX_SUPPORTED_LEVEL));
    assert_eq!(max_level(0), None);
}

#[test]
fn test_node_expander_orbit()
{
    let (generators, _) = sqrt3_setup(64);
    let nodes: Vec<Vec<f64>> = NodeExpander::new(&[1, 0], &generators)
        .map(|n| n.iter().map(CertifiedReal::to_f64).collect())
        .collect();
    let g = generators[1].to_f64();
    assert_eq!(nodes, vec![vec![0.0, g], vec![0.0, -g], vec![g, 0.0], vec![-g, 0.0]]);
    assert_eq!(NodeExpander::num_nodes(&[1, 0]), 4);
    assert_eq!(NodeExpander::new(&[1, 1], &generators).count(), 4);
}

#[test]
fn test_one_dimensional_rules()
{
    let (generators, table) = sqrt3_setup(128);
    let rule = genz_keister_construction(1, 0, &generators, &table, 128).unwrap();
    assert_eq!(rule.len(), 1);
    assert!(rule.node(0)[0].mid_is_zero());
    assert_eq!(rule.weights()[0], *table.get(0, 0));

    let rule = genz_keister_construction(1, 1, &generators, &table, 128).unwrap();
    let weights = rule.weights_f64();
    assert_eq!(rule.len(), 3);
    assert!((weights[0] - 2.0 / 3.0).abs() < 1e-15);
    assert!((weights[1] - 1.0 / 6.0).abs() < 1e-15);
    assert_eq!(rule.weights()[1], rule.weights()[2]);
    assert!((rule.integrate(|x| x[0] * x[0]) - 1.0).abs() < 1e-14);
}

#[test]
fn test_level_out_of_range()
{
    let (generators, table) = sqrt3_setup(64);
    assert_eq!(genz_keister_construction(2, 2, &generators, &table, 64),
        Err(GKError::LevelOutOfRange { level: 2, max_level: 1 }));
    let rule = genz_keister_construction(0, 5, &generators, &table, 64).unwrap();
    assert_eq!(rule.len(), 1);
    assert_eq!(rule.weights()[0], CertifiedReal::one());
}

#[test]
fn test_parallel_matches_serial()
{
    let (generators, table) = sqrt3_setup(96);
    let serial = genz_keister_construction(3, 1, &generators, &table, 96).unwrap();
    let parallel = genz_keister_construction_parallel(3, 1, &generators, &table, 96).unwrap();
    assert_eq!(serial, parallel);
    assert_eq!(serial.len(), 7);
}

#[test]
fn test_partition_weight_beyond_level_is_zero()
{
    let (_, table) = sqrt3_setup(64);
    assert_eq!(partition_weight(&[1, 1], 1, &table, 64), CertifiedReal::zero());
    assert_eq!(partition_weight(&[2], 0, &table, 64), CertifiedReal::zero());
    assert!(!partition_weight(&[1, 0], 1, &table, 64).mid_is_zero());
}
