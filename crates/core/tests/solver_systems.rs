use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use convsolve_core::solver::Assignment;
use convsolve_core::*;

fn x() -> Expr {
    Expr::sym("x")
}

fn y() -> Expr {
    Expr::sym("y")
}

#[test]
fn linear_pair() {
    let equations = [Equation::new(x() + y(), Expr::int(3)), Equation::new(x() - y(), Expr::int(1))];
    let quantities = Quantities::new().unknown("x").unknown("y");
    let solution = solve(&equations, &quantities, None).unwrap().solution().unwrap();
    assert_eq!(solution.get("x"), Some(2.0));
    assert_eq!(solution.get("y"), Some(1.0));
    assert!(solution.is_plausible());
}

#[test]
fn known_values_are_substituted() {
    // VBATT_H = VREF/R11*(R9 + R10 + R11) solved for R9
    let equation = Equation::new(
        Expr::sym("h"),
        Expr::sym("vref") / Expr::sym("r11") * (Expr::sym("r9") + Expr::sym("r10") + Expr::sym("r11")),
    );
    let quantities = Quantities::new()
        .known("h", 2.7)
        .known("vref", 1.205)
        .known("r11", 300e3)
        .known("r10", 68e3)
        .unknown("r9");
    let solution = solve(&[equation], &quantities, None).unwrap().solution().unwrap();
    assert_relative_eq!(solution.get("r9").unwrap(), 2.7 * 300e3 / 1.205 - 368e3, max_relative = 1e-12);
}

#[test]
fn quadratic_candidates_are_ascending() {
    let equations = [Equation::new(x().pow(2), Expr::int(4))];
    let quantities = Quantities::new().unknown("x");
    let solution = solve(&equations, &quantities, None).unwrap().solution().unwrap();
    let values: Vec<f64> = solution.candidates().iter().map(|c| c.get("x").unwrap()).collect();
    assert_eq!(values, vec![-2.0, 2.0]);
    assert_eq!(solution.get("x"), Some(-2.0));
}

#[test]
fn plausibility_picks_the_physical_root() {
    let equations = [Equation::new(x().pow(2), Expr::int(4))];
    let quantities = Quantities::new().unknown("x");
    let positive = |a: &Assignment| a.get("x").is_some_and(|v| v > 0.0);
    let solution = solve(&equations, &quantities, Some(&positive)).unwrap().solution().unwrap();
    assert_eq!(solution.get("x"), Some(2.0));
    assert!(solution.is_plausible());
}

#[test]
fn implausible_roots_fall_back_to_the_first() {
    let equations = [Equation::new(x().pow(2), Expr::int(4))];
    let quantities = Quantities::new().unknown("x");
    let huge = |a: &Assignment| a.get("x").is_some_and(|v| v > 10.0);
    let solution = solve(&equations, &quantities, Some(&huge)).unwrap().solution().unwrap();
    assert_eq!(solution.get("x"), Some(-2.0));
    assert!(!solution.is_plausible());
    assert!(solution.to_string().contains("implausible"));
}

#[test]
fn substitution_through_a_non_constant_coefficient() {
    // x*y = 2, x^2 + y^2 = 5
    let equations = [
        Equation::new(x() * y(), Expr::int(2)),
        Equation::new(x().pow(2) + y().pow(2), Expr::int(5)),
    ];
    let quantities = Quantities::new().unknown("x").unknown("y");
    let ordered = |a: &Assignment| match (a.get("x"), a.get("y")) {
        (Some(x), Some(y)) => x > y && y > 0.0,
        _ => false,
    };
    let solution = solve(&equations, &quantities, Some(&ordered)).unwrap().solution().unwrap();
    assert_relative_eq!(solution.get("x").unwrap(), 2.0, max_relative = 1e-9);
    assert_relative_eq!(solution.get("y").unwrap(), 1.0, max_relative = 1e-9);
    assert_eq!(solution.candidates().len(), 4);
}

#[test]
fn elimination_by_resultant() {
    // Both equations are quadratic in each unknown.
    let equations = [
        Equation::new(x().pow(2) + y().pow(2), Expr::int(5)),
        Equation::new(x().pow(2) - y().pow(2), Expr::int(3)),
    ];
    let quantities = Quantities::new().unknown("x").unknown("y");
    let positive = |a: &Assignment| a.iter().all(|(_, v)| v > 0.0);
    let solution = solve(&equations, &quantities, Some(&positive)).unwrap().solution().unwrap();
    assert!(solution.is_plausible());
    assert_relative_eq!(solution.get("x").unwrap(), 2.0, max_relative = 1e-6);
    assert_relative_eq!(solution.get("y").unwrap(), 1.0, max_relative = 1e-6);
}

#[test]
fn more_unknowns_than_equations() {
    let equations = [Equation::new(x() + y(), Expr::int(1))];
    let quantities = Quantities::new().unknown("x").unknown("y");
    assert_eq!(
        solve(&equations, &quantities, None),
        Err(SolveError::Underdetermined { unknowns: 2, equations: 1 })
    );
}

#[test]
fn dependent_equations_are_underdetermined() {
    let equations = [
        Equation::new(x() + y(), Expr::int(1)),
        Equation::new(Expr::int(2) * x() + Expr::int(2) * y(), Expr::int(2)),
    ];
    let quantities = Quantities::new().unknown("x").unknown("y");
    assert!(matches!(solve(&equations, &quantities, None), Err(SolveError::Underdetermined { .. })));
}

#[test]
fn contradictory_equations_have_no_solution() {
    let equations = [Equation::new(x(), Expr::int(1)), Equation::new(x(), Expr::int(2))];
    let quantities = Quantities::new().unknown("x");
    assert_eq!(solve(&equations, &quantities, None), Err(SolveError::NoSolution));
}

#[test]
fn all_known_is_nothing_to_solve() {
    let equations = [Equation::new(x(), Expr::int(1))];
    let quantities = Quantities::new().known("x", 1.0);
    assert_eq!(solve(&equations, &quantities, None), Ok(SolveOutcome::NothingToSolve));
}

#[test]
fn unbound_symbol_is_reported() {
    let equations = [Equation::new(x() + Expr::sym("z"), Expr::int(1))];
    let quantities = Quantities::new().unknown("x");
    assert_eq!(
        solve(&equations, &quantities, None),
        Err(SolveError::UnresolvedSymbol("z".to_string()))
    );
}

#[test]
fn complex_only_roots_are_rejected() {
    let equations = [Equation::new(x().pow(2) + Expr::int(1), Expr::zero())];
    let quantities = Quantities::new().unknown("x");
    match solve(&equations, &quantities, None) {
        Err(SolveError::NonRealRoot { name, value }) => {
            assert_eq!(name, "x");
            assert_relative_eq!(value.im.abs(), 1.0, max_relative = 1e-12);
        }
        other => panic!("expected NonRealRoot, got {other:?}"),
    }
}

#[test]
fn root_at_a_pole_is_discarded() {
    // The numerator x^2 - x also vanishes at the pole x = 0.
    let equations = [Equation::new((x().pow(2) - x()) / x(), Expr::zero())];
    let quantities = Quantities::new().unknown("x");
    let solution = solve(&equations, &quantities, None).unwrap().solution().unwrap();
    assert_eq!(solution.candidates().len(), 1);
    assert_eq!(solution.get("x"), Some(1.0));
}

#[test]
fn division_by_identically_zero() {
    let equations = [Equation::new(Expr::int(1) / (x() - x()), Expr::int(1))];
    let quantities = Quantities::new().unknown("x");
    assert_eq!(solve(&equations, &quantities, None), Err(SolveError::DivisionByZero));
}

#[test]
fn non_finite_known_value() {
    let equations = [Equation::new(x(), Expr::sym("k"))];
    let quantities = Quantities::new().unknown("x").known("k", f64::INFINITY);
    assert!(matches!(solve(&equations, &quantities, None), Err(SolveError::InvalidQuantity { .. })));
}

#[test]
fn zero_budget_times_out() {
    let solver = Solver::new(SolverConfig { timeout: Duration::ZERO, ..SolverConfig::default() });
    let equations = [Equation::new(x(), Expr::int(1))];
    let quantities = Quantities::new().unknown("x");
    assert_eq!(solver.solve(&equations, &quantities, None), Err(SolveError::Timeout(Duration::ZERO)));
}

#[test]
fn repeated_roots_finish_within_budget() {
    // (x^2 - 1)^2 = 0 has a double root at each of -1 and 1
    let solver = Solver::new(SolverConfig { timeout: Duration::from_millis(300), ..SolverConfig::default() });
    let equations = [Equation::new((x().pow(2) - Expr::int(1)).pow(2), Expr::zero())];
    let quantities = Quantities::new().unknown("x");
    let solution = solver.solve(&equations, &quantities, None).unwrap().solution().unwrap();
    let values: Vec<f64> = solution.candidates().iter().map(|c| c.get("x").unwrap()).collect();
    assert_eq!(values, vec![-1.0, 1.0]);
}

#[test]
fn expansion_is_bounded_by_the_budget() {
    let limit = Duration::from_millis(20);
    let solver = Solver::new(SolverConfig { timeout: limit, ..SolverConfig::default() });
    let equations = [
        Equation::new((x() + y() + Expr::int(1)).pow(60), Expr::int(1)),
        Equation::new(x(), y()),
    ];
    let quantities = Quantities::new().unknown("x").unknown("y");
    let started = Instant::now();
    assert_eq!(solver.solve(&equations, &quantities, None), Err(SolveError::Timeout(limit)));
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[test]
fn runaway_exponents_are_rejected() {
    let quantities = Quantities::new().unknown("x");
    let one = [Equation::new(x().pow(2_000_000_000), Expr::int(1))];
    assert!(matches!(solve(&one, &quantities, None), Err(SolveError::DegreeTooHigh { .. })));

    let product = [Equation::new(
        x().pow(2_000_000_000) * x().pow(2_000_000_000) * x().pow(2_000_000_000),
        Expr::int(1),
    )];
    assert!(matches!(solve(&product, &quantities, None), Err(SolveError::DegreeTooHigh { .. })));

    let squared = [Equation::new(x().pow(200) * x().pow(200), Expr::int(1))];
    assert_eq!(
        solve(&squared, &quantities, None),
        Err(SolveError::DegreeTooHigh { degree: 400, limit: 256 })
    );
}

#[test]
fn later_entries_replace_earlier_ones() {
    let quantities = Quantities::new().known("x", 1.0).unknown("x");
    assert_eq!(quantities.len(), 1);
    assert!(!quantities.is_empty());
    assert!(Quantities::new().is_empty());
    assert_eq!(quantities.get("x"), Some(Quantity::Unknown));
}
