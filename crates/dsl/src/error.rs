use convsolve_core::SolveError;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Malformed equation text, pointing at the first offending token.
#[derive(Error, Debug, Diagnostic)]
#[error("Invalid equation #{index}: {message}")]
#[diagnostic(
    code(convsolve::parse),
    help("equations look like `vin*ton = vout*toff`; powers take an integer exponent, `x^2` or `x**2`")
)]
pub struct ParseError {
    #[source_code]
    pub src: String,

    #[label("{message}")]
    pub span: SourceSpan,

    pub message: String,

    /// Position of the equation in the submitted list, from zero.
    pub index: usize,
}

#[derive(Error, Debug, Diagnostic)]
pub enum DslError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(code(convsolve::solve))]
    Solve(#[from] SolveError),
}
