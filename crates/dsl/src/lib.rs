//! Text front end for the equation solver.
//!
//! ```text
//! VBATT_H = VREF/R11*(R10 + R11 + R9)
//! vout*iout/fsw = 0.5/fsw*duty*vin*L_I_PK
//! ```
//!
//! Operators are `+ - * /`, unary minus, and integer powers written `^` or
//! `**`. An equation without `=` is read as `expr = 0`.

pub mod error;
mod parser;

use convsolve_core::expr::Equation;
use convsolve_core::solver::{Plausibility, Quantities, SolveOutcome, Solver};
use tracing::debug;

pub use error::{DslError, ParseError};

pub fn parse_equation(text: &str) -> Result<Equation, ParseError> {
    parser::parse(text, 0)
}

/// Parses every equation, stopping at the first malformed one.
pub fn parse_equations<S: AsRef<str>>(texts: &[S]) -> Result<Vec<Equation>, ParseError> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| -> Result<Equation, ParseError> {
            let equation = parser::parse(text.as_ref(), index)?;
            debug!(index, %equation, "parsed equation");
            Ok(equation)
        })
        .collect()
}

/// [`solve_text_with`] using the default solver configuration.
pub fn solve_text<S: AsRef<str>>(
    texts: &[S],
    quantities: &Quantities,
    plausible: Option<Plausibility<'_>>,
) -> Result<SolveOutcome, DslError> {
    solve_text_with(&Solver::default(), texts, quantities, plausible)
}

pub fn solve_text_with<S: AsRef<str>>(
    solver: &Solver,
    texts: &[S],
    quantities: &Quantities,
    plausible: Option<Plausibility<'_>>,
) -> Result<SolveOutcome, DslError> {
    let equations = parse_equations(texts)?;
    Ok(solver.solve(&equations, quantities, plausible)?)
}
