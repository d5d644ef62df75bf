use std::time::Duration;

use num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError {
    #[error("Invalid switching frequency: {0} Hz (must be > 0 and finite)")]
    InvalidFrequency(f64),
    #[error("Invalid voltage: {0} V (must be > 0 and finite)")]
    InvalidVoltage(f64),
    #[error("Invalid current: {0} A (must be ≥ 0 and finite)")]
    InvalidCurrent(f64),
    #[error("Invalid inductance: {0} H (must be > 0 and finite)")]
    InvalidInductance(f64),
    #[error("Invalid resistance: {0} Ω (must be ≥ 0 and finite)")]
    InvalidResistance(f64),
    #[error("Invalid duty cycle: {0} (must lie strictly between 0 and 1)")]
    InvalidDuty(f64),
    #[error("Invalid duration: {0} s (must be ≥ 0 and finite)")]
    InvalidDuration(f64),
    #[error("Invalid period: {0} s (must be > 0 and finite)")]
    InvalidPeriod(f64),
}

/// Failure modes of [`crate::solver::Solver::solve`].
///
/// A result whose roots all fail the caller's plausibility predicate is not an
/// error; it comes back as a [`crate::solver::Solution`] flagged implausible.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("Symbol '{0}' is not bound to a known value or marked unknown")]
    UnresolvedSymbol(String),
    #[error("Known quantity '{name}' has a non-finite value {value}")]
    InvalidQuantity { name: String, value: f64 },
    #[error("Underdetermined system: {unknowns} unknown(s) but only {equations} independent equation(s)")]
    Underdetermined { unknowns: usize, equations: usize },
    #[error("System has no solution")]
    NoSolution,
    #[error("Only non-real roots found (e.g. {name} = {value})")]
    NonRealRoot { name: String, value: Complex64 },
    #[error("Expression divides by an identically zero term")]
    DivisionByZero,
    #[error("Polynomial degree {degree} exceeds the limit of {limit}")]
    DegreeTooHigh { degree: u64, limit: u32 },
    #[error("Solve exceeded its time budget of {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("Solver returned no value for '{0}'")]
    MissingUnknown(String),
    #[error("Degenerate operating point: {0}")]
    Degenerate(&'static str),
}
