//! Equation solving and buck-boost operating-point models.
//!
//! [`solver`] turns a set of [`expr::Equation`]s plus known values into
//! numeric roots for the unknowns. [`converter`] builds on it to size a
//! buck-boost stage in continuous or discontinuous conduction.

pub mod converter;
pub mod errors;
pub mod expr;
pub mod ploss;
pub mod poly;
pub mod resistor;
pub mod roots;
pub mod solver;
pub mod units;

pub use converter::{
    CcmModel, ConverterParams, DcmDutyModel, DcmDutyPoint, DcmModel, ModeWarning, OperatingPoint, TopoMode,
};
pub use errors::{CircuitError, ConverterError, SolveError};
pub use expr::{Equation, Expr};
pub use solver::{Assignment, Quantities, Quantity, Solution, SolveOutcome, Solver, SolverConfig, solve};
