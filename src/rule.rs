use serde::{Deserialize, Serialize};

use crate::{ball::CertifiedReal, errors::GKError, serialization::SerializationFormat};

///
/// Nodes and weights of a sparse quadrature rule. Node coordinates are
/// stored flat, `ndim` consecutive entries per node; `weights[i]` belongs to
/// node `i`.
///
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadratureRule
{
    ndim: usize,
    level: usize,
    nodes: Vec<CertifiedReal>,
    weights: Vec<CertifiedReal>,
}

impl QuadratureRule
{
    pub fn new(ndim: usize, level: usize) -> Self
    {
        Self { ndim, level, nodes: Vec::new(), weights: Vec::new() }
    }

    pub(crate) fn push(&mut self, node: Vec<CertifiedReal>, weight: CertifiedReal)
    {
        debug_assert_eq!(node.len(), self.ndim);
        self.nodes.extend(node);
        self.weights.push(weight);
    }

    /// Append all nodes of `other`, which must have the same dimension.
    pub(crate) fn append(&mut self, other: QuadratureRule)
    {
        debug_assert_eq!(other.ndim, self.ndim);
        self.nodes.extend(other.nodes);
        self.weights.extend(other.weights);
    }

    pub fn ndim(&self) -> usize
    {
        self.ndim
    }

    pub fn level(&self) -> usize
    {
        self.level
    }

    pub fn len(&self) -> usize
    {
        self.weights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    #[inline]
    pub fn node(&self, i: usize) -> &[CertifiedReal]
    {
        &self.nodes[i * self.ndim..(i + 1) * self.ndim]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &[CertifiedReal]> + '_
    {
        (0..self.len()).map(|i| self.node(i))
    }

    /// All node coordinates, flat.
    pub fn coordinates(&self) -> &[CertifiedReal]
    {
        &self.nodes
    }

    pub fn weights(&self) -> &[CertifiedReal]
    {
        &self.weights
    }

    pub fn weight_sum(&self, prec: u32) -> CertifiedReal
    {
        self.weights.iter().fold(CertifiedReal::zero(), |acc, w| acc.add(w, prec))
    }

    /// Node coordinates rounded to doubles, flat.
    pub fn nodes_f64(&self) -> Vec<f64>
    {
        self.nodes.iter().map(CertifiedReal::to_f64).collect()
    }

    pub fn weights_f64(&self) -> Vec<f64>
    {
        self.weights.iter().map(CertifiedReal::to_f64).collect()
    }

    /// Flat node coordinates and weights rounded to doubles.
    pub fn to_f64(&self) -> (Vec<f64>, Vec<f64>)
    {
        (self.nodes_f64(), self.weights_f64())
    }

    ///
    /// Apply the rule to `f` in double precision.
    ///
    pub fn integrate<F: Fn(&[f64]) -> f64>(&self, f: F) -> f64
    {
        let nodes = self.nodes_f64();
        let mut point = vec![0.0; self.ndim];
        let mut sum = 0.0;
        for (i, w) in self.weights.iter().enumerate()
        {
            point.copy_from_slice(&nodes[i * self.ndim..(i + 1) * self.ndim]);
            sum += w.to_f64() * f(&point);
        }
        sum
    }

    ///
    /// Write rule to buffer with the specified serialization format.
    ///
    pub fn write_buffer(&self, format: SerializationFormat) -> Result<Vec<u8>, GKError>
    {
        crate::serialization::serialize(self, format)
    }

    ///
    /// Reads a rule from buffer.
    ///
    pub fn read_buffer(buffer: &[u8], format: SerializationFormat) -> Result<Self, GKError>
    {
        crate::serialization::deserialize(buffer, format)
    }

    pub fn write(&self, path: &str, format: SerializationFormat) -> Result<(), GKError>
    {
        crate::serialization::write(self, path, format)
    }

    pub fn read<Reader: std::io::Read>(reader: Reader, format: SerializationFormat) -> Result<Self, GKError>
    {
        crate::serialization::read(reader, format)
    }
}

#[test]
fn test_flat_storage()
{
    let mut rule = QuadratureRule::new(2, 1);
    rule.push(vec![CertifiedReal::zero(), CertifiedReal::one()], CertifiedReal::from_integer(3));
    rule.push(vec![CertifiedReal::from_integer(2), CertifiedReal::zero()], CertifiedReal::from_integer(5));
    assert_eq!(rule.len(), 2);
    assert_eq!(rule.node(1)[0].to_f64(), 2.0);
    assert_eq!(rule.nodes().count(), 2);
    assert_eq!(rule.weight_sum(64).to_f64(), 8.0);
    assert_eq!(rule.integrate(|x| x[0] + x[1]), 3.0 + 10.0);
}

#[test]
fn test_zero_dimensional_rule()
{
    let mut rule = QuadratureRule::new(0, 0);
    rule.push(Vec::new(), CertifiedReal::one());
    assert_eq!(rule.len(), 1);
    assert!(rule.node(0).is_empty());
    assert_eq!(rule.nodes().count(), 1);
    assert_eq!(rule.integrate(|_| 2.0), 2.0);
}

#[test]
fn test_buffer_roundtrip()
{
    let mut rule = QuadratureRule::new(1, 0);
    rule.push(vec![CertifiedReal::zero()], CertifiedReal::one());
    let bytes = rule.write_buffer(SerializationFormat::BincodeLz4).unwrap();
    assert_eq!(QuadratureRule::read_buffer(&bytes, SerializationFormat::BincodeLz4).unwrap(), rule);
}
