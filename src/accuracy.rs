use num_rational::BigRational;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::{ball::{mag, CertifiedReal}, rule::QuadratureRule};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyCriterion
{
    /// Radius below `2^-t`.
    #[default]
    Absolute,
    /// Radius below `2^-t |midpoint|`; exact values always pass.
    Relative,
}

/// The radius of `value` is strictly smaller than `2^-target_prec`.
pub fn check_accuracy(value: &CertifiedReal, target_prec: u32) -> bool
{
    value.radius_below_2exp(-(target_prec as i64))
}

pub fn check_relative_accuracy(value: &CertifiedReal, target_prec: u32) -> bool
{
    if value.is_exact()
    {
        return true;
    }
    let Some(radius) = BigRational::from_float(value.radius()) else
    {
        return false;
    };
    let scale = value.midpoint().abs() * BigRational::from_float(mag::pow2(-(target_prec as i64))).unwrap_or_else(BigRational::zero);
    radius < scale
}

///
/// Every node coordinate and every weight of `rule` satisfies `criterion`
/// at `target_prec` bits.
///
pub fn is_accurate_with(rule: &QuadratureRule, target_prec: u32, criterion: AccuracyCriterion) -> bool
{
    let check = |value: &CertifiedReal| match criterion
    {
        AccuracyCriterion::Absolute => check_accuracy(value, target_prec),
        AccuracyCriterion::Relative => check_relative_accuracy(value, target_prec),
    };
    rule.coordinates().iter().all(check) && rule.weights().iter().all(check)
}

/// Absolute accuracy check of all nodes and weights.
pub fn is_accurate_enough(rule: &QuadratureRule, target_prec: u32) -> bool
{
    is_accurate_with(rule, target_prec, AccuracyCriterion::Absolute)
}

#[test]
fn test_absolute_check()
{
    let ball = CertifiedReal::with_radius(BigRational::from_integer(1000.into()), mag::pow2(-60));
    assert!(check_accuracy(&ball, 59));
    assert!(!check_accuracy(&ball, 60));
    assert!(check_accuracy(&CertifiedReal::zero(), 2000));
}

#[test]
fn test_relative_check()
{
    let big = CertifiedReal::with_radius(BigRational::from_integer(1024.into()), mag::pow2(-60));
    assert!(check_relative_accuracy(&big, 65));
    assert!(!check_relative_accuracy(&big, 70));
    let tiny = CertifiedReal::with_radius(BigRational::new(1.into(), 1024.into()), mag::pow2(-60));
    assert!(!check_relative_accuracy(&tiny, 60));
    assert!(check_relative_accuracy(&CertifiedReal::zero(), 2000));
}

#[test]
fn test_rule_check()
{
    let mut rule = QuadratureRule::new(1, 0);
    rule.push(vec![CertifiedReal::zero()], CertifiedReal::with_radius(BigRational::from_integer(1.into()), 1e-30));
    assert!(is_accurate_enough(&rule, 64));
    assert!(!is_accurate_enough(&rule, 128));
    assert!(is_accurate_enough(&QuadratureRule::new(2, 0), 1000));
}
