use approx::assert_relative_eq;
use convsolve_core::units::*;
use convsolve_core::*;
use proptest::prelude::*;

mod common;
use common::strategies::*;
use common::*;

/// Inductance that puts the reference design exactly at 50% duty in DCM.
fn half_duty_inductance() -> Inductance {
    // (vin*d)^2 / (2*vout*iout*fsw)
    Inductance::new(5.5 * 5.5 / (2.0 * 20.0 * 5.0 * 250e3)).unwrap()
}

#[test]
fn reference_inductance_cannot_reach_dcm() {
    let point = DcmModel::new(reference_params(), reference_inductance()).calculate().unwrap();
    assert_eq!(point.mode, TopoMode::Ccm);
    assert_eq!(point.warning, Some(ModeWarning::InductanceTooLarge));
    assert!(!(point.duty > 0.0 && point.duty < 1.0), "duty {} should be out of range", point.duty);
    assert_eq!(point.ripple_factor, 1.0);
    assert_eq!(point.ripple_current, point.peak_current);
}

#[test]
fn small_inductance_solves_in_dcm() {
    let point = DcmModel::new(reference_params(), half_duty_inductance()).calculate().unwrap();
    assert_relative_eq!(point.duty, 0.5, max_relative = EPSILON_PHYSICAL);
    assert_relative_eq!(point.peak_current, 200.0 / 5.5, max_relative = EPSILON_PHYSICAL);
    assert_relative_eq!(point.ton, 2e-6, max_relative = EPSILON_PHYSICAL);
    assert_relative_eq!(point.toff, 2e-6, max_relative = EPSILON_PHYSICAL);
    assert_eq!(point.mode, TopoMode::Dcm);
    assert_eq!(point.warning, None);
}

#[test]
fn duty_known_design_derives_inductance() {
    let duty = DutyCycle::new(0.5).unwrap();
    let point = DcmDutyModel::new(reference_params(), duty).calculate().unwrap();
    let inductance: f64 = point.inductance.into();
    assert_relative_eq!(inductance, f64::from(half_duty_inductance()), max_relative = EPSILON_STRICT);
    assert_relative_eq!(point.peak_current, 200.0 / 5.5, max_relative = EPSILON_STRICT);
    assert_relative_eq!(point.ton + point.toff, 4e-6, max_relative = EPSILON_STRICT);
    assert!(point.to_string().contains("uH"));
}

#[test]
fn zero_load_has_no_inductance() {
    let params = ConverterParams::new(250e3, 11.0, 20.0, 0.0).unwrap();
    let result = DcmDutyModel::new(params, DutyCycle::new(0.3).unwrap()).calculate();
    assert!(matches!(result, Err(ConverterError::Degenerate(_))));
}

#[test]
fn zero_load_with_known_inductance_has_no_solution() {
    // duty = 0 and L_I_PK = 0 is the only root, and it sits on the pole of
    // the slope equation
    let params = ConverterParams::new(250e3, 11.0, 20.0, 0.0).unwrap();
    let result = DcmModel::new(params, half_duty_inductance()).calculate();
    assert!(matches!(result, Err(ConverterError::Solve(SolveError::NoSolution))));
}

#[test]
fn exhausted_budget_surfaces_timeout() {
    let solver = Solver::new(SolverConfig { timeout: std::time::Duration::ZERO, ..SolverConfig::default() });
    let result = DcmModel::new(reference_params(), half_duty_inductance()).with_solver(solver).calculate();
    assert!(matches!(result, Err(ConverterError::Solve(SolveError::Timeout(_)))));
}

#[test]
fn duty_outside_open_interval_is_rejected() {
    assert_eq!(DutyCycle::new(0.0), Err(CircuitError::InvalidDuty(0.0)));
    assert_eq!(DutyCycle::new(1.0), Err(CircuitError::InvalidDuty(1.0)));
}

proptest! {

#[test]
fn prop_duty_design_round_trips_through_inductance(
    params in converter_params(),
    duty in duty_cycle()
) {
    let design = DcmDutyModel::new(params, duty).calculate().unwrap();
    let point = DcmModel::new(params, design.inductance).calculate().unwrap();

    let d: f64 = duty.into();
    prop_assert_eq!(point.mode, TopoMode::Dcm);
    prop_assert!((point.duty - d).abs() <= EPSILON_PHYSICAL * d);
    prop_assert!((point.peak_current - design.peak_current).abs() <= EPSILON_PHYSICAL * design.peak_current);
}

#[test]
fn prop_dcm_roots_satisfy_energy_balance(
    params in converter_params(),
    l in inductance()
) {
    let point = DcmModel::new(params, l).calculate().unwrap();
    let vin: f64 = params.vin.into();
    let vout: f64 = params.vout.into();
    let iout: f64 = params.iout.into();

    // vout*iout = 1/2 * duty*vin*L_I_PK, independent of which root was chosen
    let delivered = 0.5 * point.duty * vin * point.peak_current;
    prop_assert!((delivered - vout * iout).abs() <= EPSILON_PHYSICAL * vout * iout);
    prop_assert_eq!(point.mode == TopoMode::Dcm, point.warning.is_none());
}
}
