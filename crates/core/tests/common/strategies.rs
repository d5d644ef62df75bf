/// strategies.rs
use convsolve_core::ConverterParams;
use convsolve_core::units::*;
use proptest::prelude::*;

/// Operating conditions across a typical low-voltage design range
pub fn converter_params() -> impl Strategy<Value = ConverterParams> {
    (50e3_f64..1e6_f64, 1.0_f64..60.0_f64, 1.0_f64..60.0_f64, 0.1_f64..20.0_f64)
        .prop_map(|(fsw, vin, vout, iout)| ConverterParams::new(fsw, vin, vout, iout).unwrap())
}

pub fn inductance() -> impl Strategy<Value = Inductance> {
    (1e-7_f64..1e-3_f64).prop_map(|l| Inductance::new(l).unwrap())
}

pub fn duty_cycle() -> impl Strategy<Value = DutyCycle> {
    (0.05_f64..0.95_f64).prop_map(|d| DutyCycle::new(d).unwrap())
}
