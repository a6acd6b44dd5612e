use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{accuracy::{is_accurate_with, AccuracyCriterion}, construction::{genz_keister_construction, genz_keister_construction_parallel, max_level},
    errors::{GKError, Result}, families::{PolynomialFamily, PolynomialFamilyBackend}, generators::{compute_generators, GeneratorSequence},
    rule::QuadratureRule, validation::{validate_weights, ValidationReport}, weight_factors::WeightFactorTable};

/// Largest supported working precision in bits.
pub const MAX_PRECISION: u32 = 1024;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerationOptions
{
    /// Orthogonal polynomial family providing the base rule and the moments.
    pub family: PolynomialFamily,
    /// Degrees of the base polynomial and of each successive extension.
    pub extension_levels: Vec<usize>,
    /// Initial working precision in bits.
    pub working_precision: u32,
    /// Precision in bits every node and weight must be certified to.
    pub target_precision: u32,
    /// Working precision beyond which `certified_rule` gives up.
    pub max_working_precision: u32,
    pub accuracy: AccuracyCriterion,
    /// Assemble partitions in parallel.
    pub parallel: bool,
}

impl Default for GenerationOptions
{
    fn default() -> Self {
        Self
        {
            family: PolynomialFamily::HermiteProbabilist,
            extension_levels: vec![1, 2, 6, 10, 16],
            working_precision: 128,
            target_precision: 64,
            max_working_precision: MAX_PRECISION,
            accuracy: AccuracyCriterion::Absolute,
            parallel: false,
        }
    }
}

impl GenerationOptions
{
    pub fn validate(&self) -> Result<()>
    {
        if self.extension_levels.is_empty()
        {
            return Err(GKError::EmptyExtensionLevels);
        }
        if self.extension_levels.contains(&0)
        {
            return Err(GKError::ZeroExtensionLevel);
        }
        for prec in [self.working_precision, self.target_precision, self.max_working_precision]
        {
            if prec == 0 || prec > MAX_PRECISION
            {
                return Err(GKError::InvalidPrecision(prec));
            }
        }
        if self.working_precision > self.max_working_precision
        {
            return Err(GKError::InvalidPrecision(self.working_precision));
        }
        if self.target_precision >= self.max_working_precision
        {
            return Err(GKError::InvalidPrecision(self.target_precision));
        }
        if !self.family.is_symmetric()
        {
            return Err(GKError::UnsupportedFamily(self.family));
        }
        Ok(())
    }
}

fn weight_factor_table(family: PolynomialFamily, generators: &GeneratorSequence, prec: u32) -> Result<WeightFactorTable>
{
    match family
    {
        PolynomialFamily::HermiteProbabilist => WeightFactorTable::new(generators, prec),
        _ => WeightFactorTable::with_moments(generators, &family.normalized_moments(2 * generators.len() + 1), prec),
    }
}

fn build_tables(family: PolynomialFamily, extension_levels: &[usize], prec: u32) -> Result<(GeneratorSequence, WeightFactorTable)>
{
    if !family.is_symmetric()
    {
        return Err(GKError::UnsupportedFamily(family));
    }
    let generators = compute_generators(family.backend(), extension_levels, prec)?;
    let table = weight_factor_table(family, &generators, prec)?;
    Ok((generators, table))
}

///
/// Build the level `level` rule in `ndim` dimensions from scratch.
///
pub fn build_rule(ndim: usize, level: usize, family: PolynomialFamily, extension_levels: &[usize], working_precision: u32) -> Result<QuadratureRule>
{
    let (generators, table) = build_tables(family, extension_levels, working_precision)?;
    genz_keister_construction(ndim, level, &generators, &table, working_precision)
}

///
/// Generator sequence and weight factor table for one family, with the
/// rules assembled from them memoized by `(ndim, level)`.
///
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenzKeister
{
    options: GenerationOptions,
    working_precision: u32,
    generators: GeneratorSequence,
    table: WeightFactorTable,
    #[serde(skip)]
    rules: FxHashMap<(usize, usize), QuadratureRule>,
}

impl GenzKeister
{
    pub fn new(options: GenerationOptions) -> Result<Self>
    {
        options.validate()?;
        let working_precision = options.working_precision;
        let (generators, table) = build_tables(options.family, &options.extension_levels, working_precision)?;
        Ok(Self { options, working_precision, generators, table, rules: FxHashMap::default() })
    }

    pub fn options(&self) -> &GenerationOptions
    {
        &self.options
    }

    pub fn generators(&self) -> &GeneratorSequence
    {
        &self.generators
    }

    pub fn table(&self) -> &WeightFactorTable
    {
        &self.table
    }

    /// Current working precision; grows when `certified_rule` retries.
    pub fn working_precision(&self) -> u32
    {
        self.working_precision
    }

    /// Highest level a rule in at least one dimension can be built for.
    pub fn max_level(&self) -> usize
    {
        max_level(self.generators.len().min(self.table.size())).unwrap_or(0)
    }

    fn assemble(&self, ndim: usize, level: usize) -> Result<QuadratureRule>
    {
        if self.options.parallel
        {
            genz_keister_construction_parallel(ndim, level, &self.generators, &self.table, self.working_precision)
        }
        else
        {
            genz_keister_construction(ndim, level, &self.generators, &self.table, self.working_precision)
        }
    }

    ///
    /// Rule at the current working precision, assembled on first request.
    ///
    pub fn rule(&mut self, ndim: usize, level: usize) -> Result<&QuadratureRule>
    {
        if !self.rules.contains_key(&(ndim, level))
        {
            let rule = self.assemble(ndim, level)?;
            self.rules.insert((ndim, level), rule);
        }
        Ok(&self.rules[&(ndim, level)])
    }

    /// Recompute generators and table at `working_precision`.
    fn rebuild(&mut self, working_precision: u32) -> Result<()>
    {
        let (generators, table) = build_tables(self.options.family, &self.options.extension_levels, working_precision)?;
        self.generators = generators;
        self.table = table;
        self.working_precision = working_precision;
        self.rules.clear();
        Ok(())
    }

    ///
    /// Rule whose nodes and weights meet the target precision. The working
    /// precision is doubled and everything rebuilt until the rule passes or
    /// the maximum working precision would be exceeded.
    ///
    pub fn certified_rule(&mut self, ndim: usize, level: usize) -> Result<QuadratureRule>
    {
        let target_precision = self.options.target_precision;
        loop
        {
            let criterion = self.options.accuracy;
            if is_accurate_with(self.rule(ndim, level)?, target_precision, criterion)
            {
                info!(ndim, level, working_precision = self.working_precision, target_precision, "rule certified");
                return Ok(self.rules[&(ndim, level)].clone());
            }
            let next = self.working_precision.saturating_mul(2);
            if next > self.options.max_working_precision
            {
                return Err(GKError::PrecisionExhausted { level, target_precision, working_precision: self.working_precision });
            }
            warn!(ndim, level, from = self.working_precision, to = next, "rule not accurate enough, raising working precision");
            self.rebuild(next)?;
        }
    }

    ///
    /// Check that the one dimensional rule of `level` has positive weights.
    ///
    pub fn validate(&mut self, level: usize) -> Result<ValidationReport>
    {
        Ok(validate_weights(self.rule(1, level)?.weights()))
    }
}

#[test]
fn test_default_options_are_valid()
{
    let options = GenerationOptions::default();
    assert_eq!(options.validate(), Ok(()));
    assert_eq!(options.extension_levels, vec![1, 2, 6, 10, 16]);
}

#[test]
fn test_invalid_options()
{
    let mut options = GenerationOptions { extension_levels: Vec::new(), ..Default::default() };
    assert_eq!(options.validate(), Err(GKError::EmptyExtensionLevels));
    options.extension_levels = vec![1, 0];
    assert_eq!(options.validate(), Err(GKError::ZeroExtensionLevel));
    options.extension_levels = vec![1, 2];
    options.working_precision = 0;
    assert_eq!(options.validate(), Err(GKError::InvalidPrecision(0)));
    options.working_precision = 128;
    options.target_precision = 1024;
    assert_eq!(options.validate(), Err(GKError::InvalidPrecision(1024)));
    options.target_precision = 64;
    options.family = PolynomialFamily::Laguerre;
    assert_eq!(options.validate(), Err(GKError::UnsupportedFamily(PolynomialFamily::Laguerre)));
}

#[test]
fn test_memoized_rule()
{
    let options = GenerationOptions { extension_levels: vec![1, 2, 6], ..Default::default() };
    let mut gk = GenzKeister::new(options).unwrap();
    assert_eq!(gk.generators().len(), 5);
    assert_eq!(gk.max_level(), 4);
    let first = gk.rule(2, 3).unwrap().clone();
    assert_eq!(gk.rule(2, 3).unwrap(), &first);
    assert!(matches!(gk.rule(2, 5), Err(GKError::LevelOutOfRange { level: 5, max_level: 4 })));
}

#[test]
fn test_certified_rule_raises_precision()
{
    let options = GenerationOptions
    {
        extension_levels: vec![1, 2],
        working_precision: 32,
        target_precision: 60,
        max_working_precision: 256,
        ..Default::default()
    };
    let mut gk = GenzKeister::new(options).unwrap();
    let rule = gk.certified_rule(1, 1).unwrap();
    assert!(gk.working_precision() > 32);
    assert!(crate::accuracy::is_accurate_enough(&rule, 60));
    assert!(gk.validate(1).unwrap().is_valid());
}

#[test]
fn test_certified_rule_gives_up()
{
    let options = GenerationOptions
    {
        extension_levels: vec![1, 2],
        working_precision: 16,
        target_precision: 30,
        max_working_precision: 31,
        ..Default::default()
    };
    let mut gk = GenzKeister::new(options).unwrap();
    assert_eq!(gk.certified_rule(1, 1), Err(GKError::PrecisionExhausted { level: 1, target_precision: 30, working_precision: 16 }));
}
