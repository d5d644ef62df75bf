//! Symbolic expressions over named quantities.
//!
//! Numbers are exact rationals so that substituting known values and
//! eliminating unknowns never rounds; conversion to `f64` happens only
//! once roots are extracted.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

pub type Rational = BigRational;

/// Largest power of ten a decimal literal may carry.
const MAX_DECIMAL_SCALE: u32 = 4096;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Rational),
    Sym(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// Integer power; a negative exponent divides.
    Pow(Box<Expr>, i32),
}

impl Expr {
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Sym(name.into())
    }

    pub fn int(value: i64) -> Self {
        Self::Num(Rational::from_integer(BigInt::from(value)))
    }

    /// Exact `numer / denom`. Panics if `denom` is zero, like `Ratio::new`.
    pub fn ratio(numer: i64, denom: i64) -> Self {
        Self::Num(Rational::new(BigInt::from(numer), BigInt::from(denom)))
    }

    pub fn zero() -> Self {
        Self::Num(Rational::zero())
    }

    /// Exact value of a decimal literal such as `1.205` or `10e-6`.
    ///
    /// Returns `None` when the text is not a plain unsigned decimal.
    pub fn decimal(literal: &str) -> Option<Self> {
        parse_decimal(literal).map(Self::Num)
    }

    pub fn pow(self, exponent: i32) -> Self {
        Self::Pow(Box::new(self), exponent)
    }

    /// Names of every quantity referenced by this expression.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Num(_) => {}
            Self::Sym(name) => {
                out.insert(name.clone());
            }
            Self::Neg(inner) | Self::Pow(inner, _) => inner.collect_symbols(out),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Add(..) | Self::Sub(..) => 1,
            Self::Mul(..) | Self::Div(..) => 2,
            Self::Neg(_) => 3,
            Self::Pow(..) => 4,
            Self::Num(n) if n.is_negative() || !n.is_integer() => 2,
            Self::Num(_) | Self::Sym(_) => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn parse_decimal(literal: &str) -> Option<Rational> {
    let (mantissa, exponent) = match literal.find(['e', 'E']) {
        Some(at) => (&literal[..at], literal[at + 1..].parse::<i32>().ok()?),
        None => (literal, 0),
    };
    let (whole, frac) = match mantissa.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (mantissa, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
        return None;
    }

    let digits: BigInt = format!("{whole}{frac}").parse().ok()?;
    let scale = exponent.checked_sub(i32::try_from(frac.len()).ok()?)?;
    if scale.unsigned_abs() > MAX_DECIMAL_SCALE {
        return None;
    }
    let ten = BigInt::from(10);
    let factor = num_traits::pow(ten, scale.unsigned_abs() as usize);
    Some(if scale >= 0 {
        Rational::from_integer(digits * factor)
    } else {
        Rational::new(digits, factor)
    })
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) if n.denom().is_one() => write!(f, "{}", n.numer()),
            Self::Num(n) => write!(f, "{}/{}", n.numer(), n.denom()),
            Self::Sym(name) => f.write_str(name),
            Self::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_operand(f, 4)
            }
            Self::Add(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" + ")?;
                b.fmt_operand(f, 2)
            }
            Self::Sub(a, b) => {
                a.fmt_operand(f, 1)?;
                f.write_str(" - ")?;
                b.fmt_operand(f, 2)
            }
            Self::Mul(a, b) => {
                a.fmt_operand(f, 2)?;
                f.write_str("*")?;
                b.fmt_operand(f, 3)
            }
            Self::Div(a, b) => {
                a.fmt_operand(f, 2)?;
                f.write_str("/")?;
                b.fmt_operand(f, 3)
            }
            Self::Pow(base, exponent) => {
                base.fmt_operand(f, 5)?;
                write!(f, "^{exponent}")
            }
        }
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs))
            }
        }
    };
}

binary_op!(Add, add, Add);
binary_op!(Sub, sub, Sub);
binary_op!(Mul, mul, Mul);
binary_op!(Div, div, Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

/// `lhs = rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Equation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = self.lhs.symbols();
        out.extend(self.rhs.symbols());
        out
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_literals_are_exact() {
        let Some(Expr::Num(n)) = Expr::decimal("1.205") else {
            panic!("literal should parse");
        };
        assert_eq!(n, Rational::new(BigInt::from(241), BigInt::from(200)));

        let Some(Expr::Num(n)) = Expr::decimal("10e-6") else {
            panic!("literal should parse");
        };
        assert_eq!(n, Rational::new(BigInt::from(1), BigInt::from(100_000)));

        assert_eq!(Expr::decimal("250E3"), Some(Expr::int(250_000)));
        assert_eq!(Expr::decimal("1.5.2"), None);
        assert_eq!(Expr::decimal(".5"), None);
        assert_eq!(Expr::decimal("1e2000000000"), None);
    }

    #[test]
    fn display_keeps_grouping() {
        let e = Expr::sym("vin") * (Expr::sym("ton") + Expr::sym("toff"));
        assert_eq!(e.to_string(), "vin*(ton + toff)");
        let e = (Expr::sym("a") - Expr::sym("b")).pow(2) / Expr::int(3);
        assert_eq!(e.to_string(), "(a - b)^2/3");
    }
}
