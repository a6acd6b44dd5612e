//!
//! Advisory checks that certified roots lie in the domain of their
//! polynomial family and that quadrature weights are positive. Failures are
//! reported through `tracing`; construction does not depend on them.
//!
use num_bigint::BigInt;
use num_rational::BigRational;
use tracing::{debug, warn};

use crate::{ball::{CertifiedComplex, CertifiedReal}, families::RootDomain};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport
{
    pub checked: usize,
    pub failures: usize,
}

impl ValidationReport
{
    pub fn is_valid(&self) -> bool
    {
        self.failures == 0
    }
}

fn in_domain(root: &CertifiedComplex, domain: RootDomain) -> bool
{
    if !root.may_be_real()
    {
        return false;
    }
    match domain
    {
        RootDomain::Real => true,
        RootDomain::NonNegative => root.re.is_nonnegative(),
        RootDomain::UnitInterval =>
        {
            let one = BigRational::from_integer(BigInt::from(1));
            match (root.re.lower(), root.re.upper())
            {
                (Some(lower), Some(upper)) => lower >= -one.clone() && upper <= one,
                _ => false,
            }
        }
    }
}

pub fn validate_roots(roots: &[CertifiedComplex], domain: RootDomain) -> ValidationReport
{
    let mut report = ValidationReport { checked: roots.len(), failures: 0 };
    for (index, root) in roots.iter().enumerate()
    {
        if !in_domain(root, domain)
        {
            debug!(index, re = %root.re, im = %root.im, ?domain, "root outside the family domain");
            report.failures += 1;
        }
    }
    if !report.is_valid()
    {
        warn!(failures = report.failures, checked = report.checked, ?domain, "root validation failed");
    }
    report
}

pub fn validate_weights(weights: &[CertifiedReal]) -> ValidationReport
{
    let mut report = ValidationReport { checked: weights.len(), failures: 0 };
    for (index, weight) in weights.iter().enumerate()
    {
        if !weight.is_positive()
        {
            debug!(index, weight = %weight, "weight not certified positive");
            report.failures += 1;
        }
    }
    if !report.is_valid()
    {
        warn!(failures = report.failures, checked = report.checked, "weight validation failed");
    }
    report
}

#[test]
fn test_validate_roots()
{
    use crate::{families::{Legendre, PolynomialFamilyBackend}, roots::isolate_roots};
    let roots = isolate_roots(&Legendre.polynomial(5), 96).unwrap();
    assert_eq!(validate_roots(&roots, RootDomain::UnitInterval), ValidationReport { checked: 5, failures: 0 });
    // the negative roots are outside [0, inf)
    assert_eq!(validate_roots(&roots, RootDomain::NonNegative).failures, 2);
    let complex = isolate_roots(&crate::polynomial::RationalPolynomial::from_integers(&[1, 0, 1]), 64).unwrap();
    assert_eq!(validate_roots(&complex, RootDomain::Real).failures, 2);
}

#[test]
fn test_validate_weights()
{
    let weights = vec![CertifiedReal::from_integer(2), CertifiedReal::from_integer(-1), CertifiedReal::zero()];
    assert_eq!(validate_weights(&weights), ValidationReport { checked: 3, failures: 2 });
}
