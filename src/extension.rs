use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::{families::PolynomialFamilyBackend, polynomial::RationalPolynomial};

///
/// Solve a square linear system given as augmented rows `[A | b]` by
/// Gauss-Jordan elimination over the rationals. Returns `None` if the
/// system is singular.
///
fn solve_linear_system(mut rows: Vec<Vec<BigRational>>) -> Option<Vec<BigRational>>
{
    let n = rows.len();
    for col in 0..n
    {
        let pivot = (col..n).find(|&r| !rows[r][col].is_zero())?;
        rows.swap(col, pivot);
        let p = rows[col][col].clone();
        rows[col].iter_mut().for_each(|v| *v /= &p);
        let pivot_row = rows[col].clone();
        for (r, row) in rows.iter_mut().enumerate()
        {
            if r == col || row[col].is_zero()
            {
                continue;
            }
            let factor = row[col].clone();
            for (v, pv) in row.iter_mut().zip(&pivot_row)
            {
                *v -= &factor * pv;
            }
        }
    }
    Some(rows.into_iter().map(|row| row[n].clone()).collect())
}

///
/// Find the monic polynomial `E` of the given `degree` such that
/// `base * E` is orthogonal to `1, x, ..., x^(degree-1)` with respect to the
/// weight function of `family` (the Kronrod-type extension of the rule
/// whose nodes are the roots of `base`). Returns `None` if no such
/// extension exists.
///
pub fn find_extension(family: &dyn PolynomialFamilyBackend, base: &RationalPolynomial, degree: usize) -> Option<RationalPolynomial>
{
    if degree == 0
    {
        return Some(RationalPolynomial::one());
    }
    let moments = family.normalized_moments(base.degree() + 2 * degree);
    // values[j] = integral of base(x) x^j
    let values: Vec<BigRational> = (0..2 * degree).map(|j|
    {
        base.coefficients().iter().enumerate()
            .filter(|(i, _)| !moments[i + j].is_zero())
            .fold(BigRational::zero(), |acc, (i, c)| acc + c * &moments[i + j])
    }).collect();
    let rows: Vec<Vec<BigRational>> = (0..degree).map(|k|
    {
        let mut row: Vec<BigRational> = values[k..k + degree].to_vec();
        row.push(-values[degree + k].clone());
        row
    }).collect();
    let mut coeffs = solve_linear_system(rows)?;
    coeffs.push(BigRational::one());
    Some(RationalPolynomial::new(coeffs))
}

#[cfg(test)]
fn rational(n: i64, d: i64) -> BigRational
{
    BigRational::new(n.into(), d.into())
}

#[test]
fn test_gauss_hermite_from_origin()
{
    use crate::families::HermiteProbabilist;
    let extension = find_extension(&HermiteProbabilist, &RationalPolynomial::x(), 2).unwrap();
    assert_eq!(extension, RationalPolynomial::from_integers(&[-3, 0, 1]));
}

#[test]
fn test_gauss_legendre_from_origin()
{
    use crate::families::Legendre;
    let extension = find_extension(&Legendre, &RationalPolynomial::x(), 2).unwrap();
    assert_eq!(extension, RationalPolynomial::new(vec![rational(-3, 5), BigRational::zero(), BigRational::one()]));
}

#[test]
fn test_extension_is_orthogonal()
{
    use crate::families::{HermiteProbabilist, PolynomialFamilyBackend};
    let base = RationalPolynomial::from_integers(&[0, -3, 0, 1]);
    let extension = find_extension(&HermiteProbabilist, &base, 6).unwrap();
    assert_eq!(extension.degree(), 6);
    let product = base.mul(&extension);
    for k in 0..6
    {
        let integral = product.shift(k).coefficients().iter().enumerate()
            .fold(BigRational::zero(), |acc, (i, c)| acc + c * HermiteProbabilist.moment(i));
        assert!(integral.is_zero());
    }
}

#[test]
fn test_singular_system()
{
    use crate::families::HermiteProbabilist;
    // x has a vanishing first moment, so a linear extension of it is singular
    assert!(find_extension(&HermiteProbabilist, &RationalPolynomial::one(), 1).is_some());
    assert!(find_extension(&HermiteProbabilist, &RationalPolynomial::x(), 1).is_none());
}
