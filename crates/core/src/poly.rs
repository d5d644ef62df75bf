//! Sparse multivariate polynomials and rational functions with exact
//! rational coefficients.
//!
//! Variables are positional: a polynomial over `n` unknowns stores one
//! exponent per unknown in every monomial.

use std::collections::BTreeMap;
use std::ops::{Add, Neg, Sub};

use num_complex::Complex64;
use num_traits::{One, ToPrimitive, Zero};

use crate::errors::SolveError;
use crate::expr::Rational;
use crate::solver::Budget;

type Monomial = Vec<u32>;

/// Highest power of any one unknown an equation may reach once lowered.
pub const MAX_DEGREE: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly {
    nvars: usize,
    terms: BTreeMap<Monomial, Rational>,
}

pub(crate) fn rational_to_f64(value: &Rational) -> f64 {
    value.to_f64().unwrap_or_else(|| {
        let numer = value.numer().to_f64().unwrap_or(f64::NAN);
        let denom = value.denom().to_f64().unwrap_or(f64::NAN);
        numer / denom
    })
}

impl Poly {
    pub fn zero(nvars: usize) -> Self {
        Self { nvars, terms: BTreeMap::new() }
    }

    pub fn constant(nvars: usize, value: Rational) -> Self {
        let mut poly = Self::zero(nvars);
        if !value.is_zero() {
            poly.terms.insert(vec![0; nvars], value);
        }
        poly
    }

    pub fn var(nvars: usize, index: usize) -> Self {
        debug_assert!(index < nvars);
        let mut exponents = vec![0; nvars];
        exponents[index] = 1;
        let mut poly = Self::zero(nvars);
        poly.terms.insert(exponents, Rational::one());
        poly
    }

    pub fn nvars(&self) -> usize {
        self.nvars
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// The constant value, if no unknown appears.
    pub fn as_constant(&self) -> Option<Rational> {
        match self.terms.len() {
            0 => Some(Rational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(mono, _)| mono.iter().all(|&e| e == 0))
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    pub fn degree_in(&self, var: usize) -> u32 {
        self.terms.keys().map(|mono| mono[var]).max().unwrap_or(0)
    }

    pub fn depends_on(&self, var: usize) -> bool {
        self.degree_in(var) > 0
    }

    /// Coefficient of `var^power`, as a polynomial in the other unknowns.
    pub fn coefficient(&self, var: usize, power: u32) -> Poly {
        let mut out = Poly::zero(self.nvars);
        for (mono, c) in &self.terms {
            if mono[var] == power {
                let mut reduced = mono.clone();
                reduced[var] = 0;
                out.terms.insert(reduced, c.clone());
            }
        }
        out
    }

    pub fn scale(&self, factor: &Rational) -> Poly {
        if factor.is_zero() {
            return Poly::zero(self.nvars);
        }
        Poly {
            nvars: self.nvars,
            terms: self.terms.iter().map(|(m, c)| (m.clone(), c * factor)).collect(),
        }
    }

    /// Product with the budget checked once per term of `self`.
    pub fn product(&self, rhs: &Poly, budget: &Budget) -> Result<Poly, SolveError> {
        let mut out = Poly::zero(self.nvars);
        for (ma, ca) in &self.terms {
            budget.check()?;
            for (mb, cb) in &rhs.terms {
                out.insert_term(add_exponents(ma, mb)?, ca * cb);
            }
        }
        Ok(out)
    }

    /// [`Poly::product`], refusing results above [`MAX_DEGREE`].
    pub fn bounded_product(&self, rhs: &Poly, budget: &Budget) -> Result<Poly, SolveError> {
        for var in 0..self.nvars {
            let degree = u64::from(self.degree_in(var)) + u64::from(rhs.degree_in(var));
            if degree > u64::from(MAX_DEGREE) {
                return Err(SolveError::DegreeTooHigh { degree, limit: MAX_DEGREE });
            }
        }
        self.product(rhs, budget)
    }

    pub fn pow(&self, exponent: u32, budget: &Budget) -> Result<Poly, SolveError> {
        let mut result = Poly::constant(self.nvars, Rational::one());
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = result.bounded_product(&base, budget)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.bounded_product(&base, budget)?;
            }
        }
        Ok(result)
    }

    /// Same zero set, leading coefficient scaled to one.
    pub fn normalized(&self) -> Poly {
        match self.terms.values().next_back() {
            Some(lead) if !lead.is_one() => self.scale(&lead.recip()),
            _ => self.clone(),
        }
    }

    /// `self` with `var := num / den`, multiplied through by `den^d` where
    /// `d` is the degree of `self` in `var`.
    pub fn substitute(&self, var: usize, num: &Poly, den: &Poly, budget: &Budget) -> Result<Poly, SolveError> {
        let degree = self.degree_in(var);
        if degree == 0 {
            return Ok(self.clone());
        }
        let mut num_powers = vec![Poly::constant(self.nvars, Rational::one())];
        let mut den_powers = vec![Poly::constant(self.nvars, Rational::one())];
        for k in 1..=degree as usize {
            num_powers.push(num_powers[k - 1].product(num, budget)?);
            den_powers.push(den_powers[k - 1].product(den, budget)?);
        }

        let mut out = Poly::zero(self.nvars);
        for k in 0..=degree {
            let coeff = self.coefficient(var, k);
            if coeff.is_zero() {
                continue;
            }
            let term = coeff
                .product(&num_powers[k as usize], budget)?
                .product(&den_powers[(degree - k) as usize], budget)?;
            out = &out + &term;
        }
        Ok(out)
    }

    /// Coefficients of `var^0 ..= var^d`. Only meaningful when `var` is the
    /// sole unknown left.
    pub fn univariate(&self, var: usize) -> Vec<Rational> {
        let degree = self.degree_in(var) as usize;
        let mut coeffs = vec![Rational::zero(); degree + 1];
        for (mono, c) in &self.terms {
            coeffs[mono[var] as usize] += c;
        }
        coeffs
    }

    /// Coefficients in `var` after substituting `point` for every other unknown.
    pub fn univariate_at(&self, var: usize, point: &[Complex64]) -> Vec<Complex64> {
        let degree = self.degree_in(var) as usize;
        let mut coeffs = vec![Complex64::new(0.0, 0.0); degree + 1];
        for (mono, c) in &self.terms {
            let mut value = Complex64::new(rational_to_f64(c), 0.0);
            for (j, &e) in mono.iter().enumerate() {
                if j != var && e > 0 {
                    value *= point[j].powu(e);
                }
            }
            coeffs[mono[var] as usize] += value;
        }
        coeffs
    }

    pub fn eval(&self, point: &[Complex64]) -> Complex64 {
        self.eval_scaled(point).0
    }

    /// Value at `point` together with the sum of term magnitudes, the scale
    /// residual tolerances are measured against.
    pub fn eval_scaled(&self, point: &[Complex64]) -> (Complex64, f64) {
        let mut sum = Complex64::new(0.0, 0.0);
        let mut scale = 0.0;
        for (mono, c) in &self.terms {
            let mut value = Complex64::new(rational_to_f64(c), 0.0);
            for (j, &e) in mono.iter().enumerate() {
                if e > 0 {
                    value *= point[j].powu(e);
                }
            }
            scale += value.norm();
            sum += value;
        }
        (sum, scale)
    }

    fn insert_term(&mut self, mono: Monomial, coeff: Rational) {
        let remove = match self.terms.get_mut(&mono) {
            Some(existing) => {
                *existing += coeff;
                existing.is_zero()
            }
            None => {
                if !coeff.is_zero() {
                    self.terms.insert(mono.clone(), coeff);
                }
                false
            }
        };
        if remove {
            self.terms.remove(&mono);
        }
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (mono, c) in &rhs.terms {
            out.insert_term(mono.clone(), c.clone());
        }
        out
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (mono, c) in &rhs.terms {
            out.insert_term(mono.clone(), -c.clone());
        }
        out
    }
}

fn add_exponents(a: &[u32], b: &[u32]) -> Result<Monomial, SolveError> {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            x.checked_add(y).ok_or(SolveError::DegreeTooHigh {
                degree: u64::from(x) + u64::from(y),
                limit: u32::MAX,
            })
        })
        .collect()
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly {
            nvars: self.nvars,
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c.clone())).collect(),
        }
    }
}

/// Sylvester resultant of `a` and `b` with respect to `var`.
///
/// The result no longer contains `var`; it vanishes wherever `a` and `b`
/// share a root in `var`.
pub fn resultant(a: &Poly, b: &Poly, var: usize, budget: &Budget) -> Result<Poly, SolveError> {
    let m = a.degree_in(var) as usize;
    let n = b.degree_in(var) as usize;
    let size = m + n;
    let nvars = a.nvars();
    let a_coeffs: Vec<Poly> = (0..=m).rev().map(|k| a.coefficient(var, k as u32)).collect();
    let b_coeffs: Vec<Poly> = (0..=n).rev().map(|k| b.coefficient(var, k as u32)).collect();

    let mut rows = vec![vec![Poly::zero(nvars); size]; size];
    for r in 0..n {
        for (k, c) in a_coeffs.iter().enumerate() {
            rows[r][r + k] = c.clone();
        }
    }
    for r in 0..m {
        for (k, c) in b_coeffs.iter().enumerate() {
            rows[n + r][r + k] = c.clone();
        }
    }

    let columns: Vec<usize> = (0..size).collect();
    determinant(&rows, &columns, budget)
}

fn determinant(rows: &[Vec<Poly>], columns: &[usize], budget: &Budget) -> Result<Poly, SolveError> {
    budget.check()?;
    let nvars = rows[0][0].nvars();
    if columns.len() == 1 {
        return Ok(rows[0][columns[0]].clone());
    }

    let mut total = Poly::zero(nvars);
    for (j, &col) in columns.iter().enumerate() {
        let entry = &rows[0][col];
        if entry.is_zero() {
            continue;
        }
        let minor_columns: Vec<usize> = columns.iter().copied().filter(|&c| c != col).collect();
        let minor = determinant(&rows[1..], &minor_columns, budget)?;
        let term = entry.product(&minor, budget)?;
        total = if j % 2 == 0 { &total + &term } else { &total - &term };
    }
    Ok(total)
}

/// `num / den`, both polynomials over the same unknowns.
#[derive(Debug, Clone, PartialEq)]
pub struct RationalFn {
    pub num: Poly,
    pub den: Poly,
}

impl RationalFn {
    pub fn from_poly(num: Poly) -> Self {
        let den = Poly::constant(num.nvars(), Rational::one());
        Self { num, den }
    }

    pub fn constant(nvars: usize, value: Rational) -> Self {
        Self::from_poly(Poly::constant(nvars, value))
    }

    pub fn var(nvars: usize, index: usize) -> Self {
        Self::from_poly(Poly::var(nvars, index))
    }

    // A constant denominator is folded into the numerator.
    fn simplified(num: Poly, den: Poly) -> Self {
        match den.as_constant() {
            Some(c) if !c.is_zero() => Self::from_poly(num.scale(&c.recip())),
            _ => Self { num, den },
        }
    }

    pub fn add(&self, rhs: &RationalFn, budget: &Budget) -> Result<RationalFn, SolveError> {
        if self.den == rhs.den {
            return Ok(Self::simplified(&self.num + &rhs.num, self.den.clone()));
        }
        let num = &self.num.bounded_product(&rhs.den, budget)? + &rhs.num.bounded_product(&self.den, budget)?;
        Ok(Self::simplified(num, self.den.bounded_product(&rhs.den, budget)?))
    }

    pub fn sub(&self, rhs: &RationalFn, budget: &Budget) -> Result<RationalFn, SolveError> {
        self.add(&rhs.neg(), budget)
    }

    pub fn mul(&self, rhs: &RationalFn, budget: &Budget) -> Result<RationalFn, SolveError> {
        Ok(Self::simplified(
            self.num.bounded_product(&rhs.num, budget)?,
            self.den.bounded_product(&rhs.den, budget)?,
        ))
    }

    pub fn div(&self, rhs: &RationalFn, budget: &Budget) -> Result<RationalFn, SolveError> {
        if rhs.num.is_zero() {
            return Err(SolveError::DivisionByZero);
        }
        Ok(Self::simplified(
            self.num.bounded_product(&rhs.den, budget)?,
            self.den.bounded_product(&rhs.num, budget)?,
        ))
    }

    pub fn neg(&self) -> RationalFn {
        Self { num: -&self.num, den: self.den.clone() }
    }

    /// Integer power. Exponents beyond [`MAX_DEGREE`] are refused up front,
    /// even on constants.
    pub fn powi(&self, exponent: i32, budget: &Budget) -> Result<RationalFn, SolveError> {
        let e = exponent.unsigned_abs();
        if e > MAX_DEGREE {
            return Err(SolveError::DegreeTooHigh { degree: u64::from(e), limit: MAX_DEGREE });
        }
        if exponent >= 0 {
            Ok(Self::simplified(self.num.pow(e, budget)?, self.den.pow(e, budget)?))
        } else if self.num.is_zero() {
            Err(SolveError::DivisionByZero)
        } else {
            Ok(Self::simplified(self.den.pow(e, budget)?, self.num.pow(e, budget)?))
        }
    }
}
