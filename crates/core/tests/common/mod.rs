#![allow(dead_code)]

use convsolve_core::ConverterParams;
use convsolve_core::units::Inductance;

pub mod strategies;

/// Epsilon for values the solver keeps exact until the final conversion.
pub const EPSILON_STRICT: f64 = 1e-9;

/// Epsilon for quantities that pass through a square root or eigen solve.
pub const EPSILON_PHYSICAL: f64 = 1e-6;

/// 250 kHz, 11 V in, 20 V / 5 A out.
pub fn reference_params() -> ConverterParams {
    ConverterParams::default()
}

/// 10 µH
pub fn reference_inductance() -> Inductance {
    Inductance::from_micro(10.0).unwrap()
}
