//! Roots of a single-unknown polynomial.
//!
//! Exact polynomials are first reduced to their square-free part, so every
//! root is simple. Degrees one and two are then solved in closed form from
//! the exact coefficients. Higher degrees go through the eigenvalues of the
//! companion matrix followed by a few Newton steps on the exact polynomial.
//! When the Schur iteration does not converge, Durand-Kerner iteration on the
//! polynomial itself takes over.

use nalgebra::{DMatrix, Schur};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{One, Signed, Zero};
use tracing::debug;

use crate::errors::SolveError;
use crate::expr::Rational;
use crate::poly::rational_to_f64;
use crate::solver::Budget;

const POLISH_ITERATIONS: usize = 8;
const DUPLICATE_TOLERANCE: f64 = 1e-9;
/// QR sweeps allowed per eigenvalue before the Schur form is abandoned.
const SCHUR_SWEEPS: usize = 30;
const DURAND_KERNER_ITERATIONS: usize = 500;

/// Distinct roots of `sum coeffs[k] * x^k`, real roots first in ascending
/// order, then complex roots ordered by real part.
///
/// A polynomial that is a non-zero constant has no roots.
pub fn polynomial_roots(coeffs: &[Rational], budget: &Budget) -> Result<Vec<Complex64>, SolveError> {
    let Some(top) = coeffs.iter().rposition(|c| !c.is_zero()) else {
        return Ok(Vec::new());
    };
    let coeffs = &coeffs[..=top];

    let zero_order = coeffs.iter().position(|c| !c.is_zero()).unwrap_or(0);
    let reduced = square_free(&coeffs[zero_order..], budget)?;

    let mut roots = match reduced.len() - 1 {
        0 => Vec::new(),
        1 => vec![real(&(-&reduced[0] / &reduced[1]))],
        2 => quadratic(&reduced[0], &reduced[1], &reduced[2]),
        _ => companion_roots(&reduced, budget)?,
    };
    if zero_order > 0 {
        roots.push(Complex64::new(0.0, 0.0));
    }

    order_roots(&mut roots);
    roots.dedup_by(|a, b| (*a - *b).norm() <= DUPLICATE_TOLERANCE * b.norm().max(1e-300));
    Ok(roots)
}

/// `p / gcd(p, p')`: the same roots, each with multiplicity one.
fn square_free(coeffs: &[Rational], budget: &Budget) -> Result<Vec<Rational>, SolveError> {
    if coeffs.len() < 3 {
        return Ok(coeffs.to_vec());
    }
    let derivative: Vec<Rational> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| c * Rational::from_integer(BigInt::from(k)))
        .collect();
    let common = gcd(coeffs.to_vec(), derivative, budget)?;
    if common.len() <= 1 {
        return Ok(coeffs.to_vec());
    }
    debug!(degree = coeffs.len() - 1, repeated = common.len() - 1, "removing repeated roots");
    Ok(div_rem(coeffs, &common).0)
}

fn trim(mut p: Vec<Rational>) -> Vec<Rational> {
    while p.last().is_some_and(Zero::is_zero) {
        p.pop();
    }
    p
}

/// Quotient and remainder; `den` must have a non-zero leading coefficient.
fn div_rem(num: &[Rational], den: &[Rational]) -> (Vec<Rational>, Vec<Rational>) {
    let shift = den.len() - 1;
    if num.len() < den.len() {
        return (Vec::new(), trim(num.to_vec()));
    }
    let lead = &den[shift];
    let mut rem = num.to_vec();
    let mut quot = vec![Rational::zero(); num.len() - shift];
    for k in (0..quot.len()).rev() {
        let factor = &rem[k + shift] / lead;
        if !factor.is_zero() {
            for (j, d) in den.iter().enumerate() {
                rem[k + j] -= &factor * d;
            }
        }
        quot[k] = factor;
    }
    rem.truncate(shift);
    (trim(quot), trim(rem))
}

/// Monic greatest common divisor by Euclid's algorithm.
fn gcd(a: Vec<Rational>, b: Vec<Rational>, budget: &Budget) -> Result<Vec<Rational>, SolveError> {
    let (mut a, mut b) = (trim(a), trim(b));
    while !b.is_empty() {
        budget.check()?;
        let rem = div_rem(&a, &b).1;
        a = b;
        b = monic(rem);
    }
    Ok(monic(a))
}

fn monic(p: Vec<Rational>) -> Vec<Rational> {
    match p.last() {
        Some(lead) if !lead.is_one() => {
            let lead = lead.clone();
            p.into_iter().map(|c| c / &lead).collect()
        }
        _ => p,
    }
}

fn real(value: &Rational) -> Complex64 {
    Complex64::new(rational_to_f64(value), 0.0)
}

fn quadratic(c: &Rational, b: &Rational, a: &Rational) -> Vec<Complex64> {
    let disc = b * b - Rational::from_integer(BigInt::from(4)) * a * c;
    let two_a = a * Rational::from_integer(BigInt::from(2));
    if disc.is_zero() {
        return vec![real(&(-b / &two_a))];
    }

    let (a_f, b_f, c_f) = (rational_to_f64(a), rational_to_f64(b), rational_to_f64(c));
    let sqrt_disc = rational_to_f64(&disc.abs()).sqrt();
    if disc.is_negative() {
        let re = rational_to_f64(&(-b / &two_a));
        let im = sqrt_disc / (2.0 * a_f.abs());
        return vec![Complex64::new(re, -im), Complex64::new(re, im)];
    }

    // Avoid cancellation between -b and sqrt(disc); q is non-zero here.
    let sign = if b_f >= 0.0 { 1.0 } else { -1.0 };
    let q = -0.5 * (b_f + sign * sqrt_disc);
    vec![Complex64::new(q / a_f, 0.0), Complex64::new(c_f / q, 0.0)]
}

fn companion_roots(coeffs: &[Rational], budget: &Budget) -> Result<Vec<Complex64>, SolveError> {
    let degree = coeffs.len() - 1;
    let lead = rational_to_f64(&coeffs[degree]);
    let monic: Vec<f64> = coeffs.iter().map(|c| rational_to_f64(c) / lead).collect();

    let mut companion = DMatrix::<f64>::zeros(degree, degree);
    for i in 1..degree {
        companion[(i, i - 1)] = 1.0;
    }
    for i in 0..degree {
        companion[(i, degree - 1)] = -monic[i];
    }
    budget.check()?;

    let exact: Vec<Complex64> = coeffs.iter().map(real).collect();
    let estimates: Vec<Complex64> = match Schur::try_new(companion, f64::EPSILON, SCHUR_SWEEPS * degree) {
        Some(schur) => schur.complex_eigenvalues().iter().copied().collect(),
        None => {
            debug!(degree, "schur iteration did not converge");
            durand_kerner(&exact, budget)?
        }
    };
    estimates.into_iter().map(|estimate| polish(&exact, estimate, budget)).collect()
}

/// Simultaneous iteration on every root; each step is checked against the
/// budget.
fn durand_kerner(coeffs: &[Complex64], budget: &Budget) -> Result<Vec<Complex64>, SolveError> {
    let degree = coeffs.len() - 1;
    let lead = coeffs[degree];
    let monic: Vec<Complex64> = coeffs.iter().map(|c| c / lead).collect();
    let radius = 1.0 + monic[..degree].iter().map(|c| c.norm()).fold(0.0, f64::max);
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree).map(|k| seed.powu(k as u32) * radius).collect();

    for _ in 0..DURAND_KERNER_ITERATIONS {
        budget.check()?;
        let mut largest_step: f64 = 0.0;
        for i in 0..degree {
            let (value, _) = horner(&monic, roots[i]);
            let mut spread = Complex64::new(1.0, 0.0);
            for j in (0..degree).filter(|&j| j != i) {
                spread *= roots[i] - roots[j];
            }
            if spread.norm() == 0.0 {
                continue;
            }
            let step = value / spread;
            roots[i] -= step;
            largest_step = largest_step.max(step.norm() / roots[i].norm().max(1.0));
        }
        if largest_step <= f64::EPSILON {
            break;
        }
    }
    Ok(roots)
}

fn polish(coeffs: &[Complex64], mut x: Complex64, budget: &Budget) -> Result<Complex64, SolveError> {
    for _ in 0..POLISH_ITERATIONS {
        budget.check()?;
        let (value, slope) = horner(coeffs, x);
        if slope.norm() == 0.0 {
            break;
        }
        let step = value / slope;
        x -= step;
        if step.norm() <= f64::EPSILON * x.norm() {
            break;
        }
    }
    Ok(x)
}

/// Value and first derivative at `x`.
pub(crate) fn horner(coeffs: &[Complex64], x: Complex64) -> (Complex64, Complex64) {
    let mut value = Complex64::new(0.0, 0.0);
    let mut slope = Complex64::new(0.0, 0.0);
    for c in coeffs.iter().rev() {
        slope = slope * x + value;
        value = value * x + c;
    }
    (value, slope)
}

/// Roots of a polynomial whose coefficients are already numeric.
pub(crate) fn numeric_roots(coeffs: &[Complex64], budget: &Budget) -> Result<Vec<Complex64>, SolveError> {
    let Some(top) = coeffs.iter().rposition(|c| c.norm() != 0.0) else {
        return Ok(Vec::new());
    };
    let coeffs = &coeffs[..=top];
    let mut roots = match coeffs.len() - 1 {
        0 => Vec::new(),
        1 => vec![-coeffs[0] / coeffs[1]],
        2 => {
            let (a, b, c) = (coeffs[2], coeffs[1], coeffs[0]);
            let sqrt_disc = (b * b - 4.0 * a * c).sqrt();
            vec![(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)]
        }
        degree => {
            let lead = coeffs[degree];
            let mut companion = DMatrix::<Complex64>::zeros(degree, degree);
            for i in 1..degree {
                companion[(i, i - 1)] = Complex64::new(1.0, 0.0);
            }
            for i in 0..degree {
                companion[(i, degree - 1)] = -coeffs[i] / lead;
            }
            budget.check()?;
            let estimates: Vec<Complex64> = match Schur::try_new(companion, f64::EPSILON, SCHUR_SWEEPS * degree)
                .and_then(|schur| schur.eigenvalues())
            {
                Some(eigenvalues) => eigenvalues.iter().copied().collect(),
                None => {
                    debug!(degree, "schur iteration did not converge");
                    durand_kerner(coeffs, budget)?
                }
            };
            estimates
                .into_iter()
                .map(|estimate| polish(coeffs, estimate, budget))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    order_roots(&mut roots);
    Ok(roots)
}

fn is_real(z: &Complex64) -> bool {
    z.im.abs() <= 1e-12 * z.norm()
}

fn order_roots(roots: &mut [Complex64]) {
    roots.sort_by(|a, b| {
        is_real(b)
            .cmp(&is_real(a))
            .then(a.re.total_cmp(&b.re))
            .then(a.im.total_cmp(&b.im))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Rational> {
        values.iter().map(|&v| Rational::from_integer(BigInt::from(v))).collect()
    }

    #[test]
    fn quadratic_roots_are_ascending() {
        // x^2 - x - 6 = (x - 3)(x + 2)
        let roots = polynomial_roots(&ints(&[-6, -1, 1]), &Budget::unlimited()).unwrap();
        assert_eq!(roots.len(), 2);
        assert!((roots[0].re + 2.0).abs() < 1e-12);
        assert!((roots[1].re - 3.0).abs() < 1e-12);
    }

    #[test]
    fn cubic_through_companion_matrix() {
        // (x - 1)(x - 2)(x - 4) = x^3 - 7x^2 + 14x - 8
        let roots = polynomial_roots(&ints(&[-8, 14, -7, 1]), &Budget::unlimited()).unwrap();
        let reals: Vec<f64> = roots.iter().map(|z| z.re).collect();
        assert_eq!(reals.len(), 3);
        for (got, want) in reals.iter().zip([1.0, 2.0, 4.0]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn zero_root_is_reported_once() {
        // x^3 - x^2 = x^2 (x - 1)
        let roots = polynomial_roots(&ints(&[0, 0, -1, 1]), &Budget::unlimited()).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0], Complex64::new(0.0, 0.0));
        assert!((roots[1].re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_roots_are_reported_once() {
        // (x^2 - 1)^2 = x^4 - 2x^2 + 1
        let roots = polynomial_roots(&ints(&[1, 0, -2, 0, 1]), &Budget::unlimited()).unwrap();
        assert_eq!(roots, vec![Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)]);

        // (x - 2)^3 (x + 1)
        let roots = polynomial_roots(&ints(&[-8, 4, 6, -5, 1]), &Budget::unlimited()).unwrap();
        assert_eq!(roots.len(), 2);
        assert!((roots[0].re + 1.0).abs() < 1e-12);
        assert!((roots[1].re - 2.0).abs() < 1e-12);
    }

    #[test]
    fn durand_kerner_finds_every_root() {
        // (x - 1)(x - 2)(x - 4)
        let coeffs: Vec<Complex64> = [-8.0, 14.0, -7.0, 1.0].iter().map(|&c| Complex64::new(c, 0.0)).collect();
        let mut roots = durand_kerner(&coeffs, &Budget::unlimited()).unwrap();
        order_roots(&mut roots);
        for (got, want) in roots.iter().zip([1.0, 2.0, 4.0]) {
            assert!((*got - want).norm() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn durand_kerner_respects_the_budget() {
        let coeffs: Vec<Complex64> = [-8.0, 14.0, -7.0, 1.0].iter().map(|&c| Complex64::new(c, 0.0)).collect();
        let budget = Budget::new(std::time::Duration::ZERO);
        assert_eq!(durand_kerner(&coeffs, &budget), Err(SolveError::Timeout(std::time::Duration::ZERO)));
    }
}
