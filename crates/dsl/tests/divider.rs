use approx::assert_relative_eq;
use convsolve_core::resistor::closest_resistance;
use convsolve_core::{Quantities, SolveOutcome};
use convsolve_dsl::*;

const DIVIDER: [&str; 2] = [
    "VBATT_L = VREF/(R10 + R11)*(R10 + R11 + R9)",
    "VBATT_H = VREF/R11*(R10 + R11 + R9)",
];

#[test]
fn divider_resistors_from_thresholds() {
    let quantities = Quantities::new()
        .known("VBATT_H", 2.7)
        .known("VBATT_L", 2.2)
        .known("R11", 300e3)
        .known("VREF", 1.205)
        .unknown("R9")
        .unknown("R10");
    let solution = solve_text(&DIVIDER, &quantities, None).unwrap().solution().unwrap();

    let total = 2.7 * 300e3 / 1.205;
    let lower = 1.205 * total / 2.2;
    let r9 = solution.get("R9").unwrap();
    let r10 = solution.get("R10").unwrap();
    assert_relative_eq!(r9, total - lower, max_relative = 1e-9);
    assert_relative_eq!(r10, lower - 300e3, max_relative = 1e-9);

    assert_eq!(closest_resistance(r9), 300e3);
    assert_eq!(closest_resistance(r10), 68e3);
}

#[test]
fn thresholds_from_snapped_resistors() {
    let quantities = Quantities::new()
        .known("R9", 300e3)
        .known("R10", 68e3)
        .known("R11", 300e3)
        .known("VREF", 1.205)
        .unknown("VBATT_H")
        .unknown("VBATT_L");
    let solution = solve_text(&DIVIDER, &quantities, None).unwrap().solution().unwrap();
    assert_relative_eq!(solution.get("VBATT_H").unwrap(), 1.205 / 300e3 * 668e3, max_relative = 1e-12);
    assert_relative_eq!(solution.get("VBATT_L").unwrap(), 1.205 / 368e3 * 668e3, max_relative = 1e-12);
}

#[test]
fn fully_known_divider_is_a_no_op() {
    let quantities = Quantities::new()
        .known("VBATT_H", 2.7)
        .known("VBATT_L", 2.2)
        .known("R9", 300e3)
        .known("R10", 68e3)
        .known("R11", 300e3)
        .known("VREF", 1.205);
    assert!(matches!(solve_text(&DIVIDER, &quantities, None), Ok(SolveOutcome::NothingToSolve)));
}
