//! Solving systems of equations over named quantities.
//!
//! Known values are substituted exactly, every equation is lowered to a
//! rational function of the unknowns, and the numerators are solved jointly
//! by elimination. Candidate roots are then screened against the input
//! equations (residual and vanishing denominators), filtered to real values,
//! and ranked by an optional caller-supplied plausibility predicate.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

use num_complex::Complex64;
use tracing::{debug, trace, warn};

use crate::errors::SolveError;
use crate::expr::{Equation, Expr, Rational};
use crate::poly::{Poly, RationalFn, resultant};
use crate::roots::{numeric_roots, polynomial_roots};

/// A named value in a solve request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Known(f64),
    Unknown,
}

/// Quantity name to known value or unknown marker, in insertion order.
///
/// Setting a name twice replaces the earlier entry, so names stay unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quantities {
    entries: Vec<(String, Quantity)>,
}

impl Quantities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, Quantity::Known(value));
        self
    }

    pub fn unknown(mut self, name: impl Into<String>) -> Self {
        self.set(name, Quantity::Unknown);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, quantity: Quantity) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = quantity,
            None => self.entries.push((name, quantity)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Quantity> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, q)| *q)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Quantity)> {
        self.entries.iter().map(|(n, q)| (n.as_str(), *q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Quantity)> for Quantities {
    fn from_iter<I: IntoIterator<Item = (S, Quantity)>>(iter: I) -> Self {
        let mut quantities = Quantities::new();
        for (name, quantity) in iter {
            quantities.set(name, quantity);
        }
        quantities
    }
}

/// Real values for every unknown of one candidate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    values: BTreeMap<String, f64>,
}

impl Assignment {
    fn from_values(names: &[String], values: &[f64]) -> Self {
        Self {
            values: names.iter().cloned().zip(values.iter().copied()).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

/// Chosen root plus every real candidate, in solver order.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    values: Assignment,
    plausible: bool,
    candidates: Vec<Assignment>,
}

impl Solution {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Assignment {
        &self.values
    }

    /// `false` when no candidate satisfied the plausibility predicate and the
    /// first candidate was taken as a fallback.
    pub fn is_plausible(&self) -> bool {
        self.plausible
    }

    pub fn candidates(&self) -> &[Assignment] {
        &self.candidates
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values)?;
        if !self.plausible {
            f.write_str(" (physically implausible)")?;
        }
        if self.candidates.len() > 1 {
            write!(f, " [{} candidates]", self.candidates.len())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Solution),
    /// Every referenced quantity was already known.
    NothingToSolve,
}

impl SolveOutcome {
    pub fn solution(self) -> Option<Solution> {
        match self {
            Self::Solved(solution) => Some(solution),
            Self::NothingToSolve => None,
        }
    }
}

/// Accepts or rejects a candidate root on physical grounds.
pub type Plausibility<'a> = &'a dyn Fn(&Assignment) -> bool;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget for one `solve` call.
    pub timeout: Duration,
    /// A root is real when `|im| <= imaginary_tolerance * |z|`.
    pub imaginary_tolerance: f64,
    /// Maximum equation residual relative to the sum of its term magnitudes.
    pub residual_tolerance: f64,
    /// A denominator this small relative to its terms counts as zero.
    pub denominator_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            imaginary_tolerance: 1e-9,
            residual_tolerance: 1e-6,
            denominator_tolerance: 1e-12,
        }
    }
}

/// Deadline shared by every step of one solve.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    deadline: Option<Instant>,
    limit: Duration,
}

impl Budget {
    pub fn new(limit: Duration) -> Self {
        Self { deadline: Instant::now().checked_add(limit), limit }
    }

    pub fn unlimited() -> Self {
        Self { deadline: None, limit: Duration::MAX }
    }

    pub fn check(&self) -> Result<(), SolveError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SolveError::Timeout(self.limit)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

/// Solves with [`SolverConfig::default`].
pub fn solve(
    equations: &[Equation],
    quantities: &Quantities,
    plausible: Option<Plausibility<'_>>,
) -> Result<SolveOutcome, SolveError> {
    Solver::default().solve(equations, quantities, plausible)
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(
        &self,
        equations: &[Equation],
        quantities: &Quantities,
        plausible: Option<Plausibility<'_>>,
    ) -> Result<SolveOutcome, SolveError> {
        let budget = Budget::new(self.config.timeout);

        let referenced: BTreeSet<String> = equations.iter().flat_map(Equation::symbols).collect();
        if let Some(name) = referenced.iter().find(|name| quantities.get(name).is_none()) {
            return Err(SolveError::UnresolvedSymbol(name.clone()));
        }
        for (name, _) in quantities.iter().filter(|(name, _)| !referenced.contains(*name)) {
            warn!(quantity = name, "quantity is not used by any equation");
        }

        let unknowns: Vec<String> = quantities
            .iter()
            .filter(|(name, q)| *q == Quantity::Unknown && referenced.contains(*name))
            .map(|(name, _)| name.to_string())
            .collect();
        if unknowns.is_empty() {
            debug!("all quantities are known, nothing to solve");
            return Ok(SolveOutcome::NothingToSolve);
        }
        if unknowns.len() > equations.len() {
            return Err(SolveError::Underdetermined {
                unknowns: unknowns.len(),
                equations: equations.len(),
            });
        }

        let env = Env { quantities, unknowns: &unknowns, budget: &budget };
        let lowered = equations
            .iter()
            .map(|eq| -> Result<RationalFn, SolveError> { env.lower(&eq.lhs)?.sub(&env.lower(&eq.rhs)?, &budget) })
            .collect::<Result<Vec<_>, _>>()?;
        for (eq, f) in equations.iter().zip(&lowered) {
            trace!(equation = %eq, numerator_terms = ?f.num, "lowered equation");
        }

        let numerators: Vec<Poly> = lowered.iter().map(|f| f.num.clone()).collect();
        let vars: Vec<usize> = (0..unknowns.len()).collect();
        let raw = self.eliminate(numerators, &vars, unknowns.len(), 0, &budget)?;
        debug!(raw = raw.len(), unknowns = ?unknowns, "elimination finished");

        let mut real: Vec<Vec<f64>> = Vec::new();
        let mut first_complex: Option<(usize, Complex64)> = None;
        for point in raw {
            if !self.satisfies(&lowered, &point) {
                trace!(point = ?point, "candidate rejected by residual check");
                continue;
            }
            match self.as_real(&point) {
                Ok(values) => {
                    if !real.iter().any(|seen| same_point(seen, &values)) {
                        real.push(values);
                    }
                }
                Err(complex) => {
                    first_complex.get_or_insert(complex);
                }
            }
        }

        if real.is_empty() {
            return Err(match first_complex {
                Some((index, value)) => SolveError::NonRealRoot { name: unknowns[index].clone(), value },
                None => SolveError::NoSolution,
            });
        }

        let candidates: Vec<Assignment> =
            real.iter().map(|values| Assignment::from_values(&unknowns, values)).collect();
        for (index, candidate) in candidates.iter().enumerate() {
            debug!(index, %candidate, "real candidate");
        }

        let chosen = match plausible {
            Some(accept) => candidates.iter().position(|c| accept(c)),
            None => Some(0),
        };
        let (index, plausible) = match chosen {
            Some(index) => (index, true),
            None => {
                warn!(
                    candidates = candidates.len(),
                    "no candidate is physically plausible, falling back to the first"
                );
                (0, false)
            }
        };

        Ok(SolveOutcome::Solved(Solution {
            values: candidates[index].clone(),
            plausible,
            candidates,
        }))
    }

    /// Every candidate root of `equations` in the given unknowns. Points are
    /// full-width: one slot per unknown of the request.
    fn eliminate(
        &self,
        equations: Vec<Poly>,
        unknowns: &[usize],
        nvars: usize,
        eliminated: usize,
        budget: &Budget,
    ) -> Result<Vec<Vec<Complex64>>, SolveError> {
        budget.check()?;

        let mut system = Vec::with_capacity(equations.len());
        for p in equations {
            if p.is_zero() {
                continue;
            }
            if p.as_constant().is_some() {
                // non-zero constant = 0
                return Ok(Vec::new());
            }
            system.push(p.normalized());
        }

        if unknowns.is_empty() {
            return Ok(vec![vec![Complex64::new(0.0, 0.0); nvars]]);
        }
        let unconstrained = unknowns.iter().any(|&u| !system.iter().any(|p| p.depends_on(u)));
        if system.len() < unknowns.len() || unconstrained {
            return Err(SolveError::Underdetermined {
                unknowns: unknowns.len() + eliminated,
                equations: system.len() + eliminated,
            });
        }

        if let [var] = unknowns {
            let var = *var;
            let Some(lowest) = system.iter().min_by_key(|p| p.degree_in(var)) else {
                return Ok(Vec::new());
            };
            let roots = polynomial_roots(&lowest.univariate(var), budget)?;
            return Ok(roots
                .into_iter()
                .map(|root| {
                    let mut point = vec![Complex64::new(0.0, 0.0); nvars];
                    point[var] = root;
                    point
                })
                .collect());
        }

        if let Some((eq_index, var)) = linear_pivot(&system, unknowns) {
            let pivot = system.remove(eq_index);
            let coeff = pivot.coefficient(var, 1);
            let rest = -&pivot.coefficient(var, 0);
            trace!(var, "eliminating by linear substitution");

            let reduced = system
                .iter()
                .map(|p| p.substitute(var, &rest, &coeff, budget))
                .collect::<Result<Vec<_>, _>>()?;
            let remaining: Vec<usize> = unknowns.iter().copied().filter(|&u| u != var).collect();
            let partial = self.eliminate(reduced, &remaining, nvars, eliminated + 1, budget)?;

            let mut points = Vec::with_capacity(partial.len());
            for mut point in partial {
                let (c, scale) = coeff.eval_scaled(&point);
                if c.norm() <= self.config.denominator_tolerance * scale {
                    continue;
                }
                point[var] = rest.eval(&point) / c;
                points.push(point);
            }
            return Ok(points);
        }

        let var = unknowns
            .iter()
            .copied()
            .min_by_key(|&u| system.iter().map(|p| p.degree_in(u)).max().unwrap_or(0))
            .unwrap_or(unknowns[0]);
        let Some(base_index) = (0..system.len())
            .filter(|&i| system[i].depends_on(var))
            .min_by_key(|&i| system[i].degree_in(var))
        else {
            return Ok(Vec::new());
        };
        trace!(var, "eliminating by resultant");

        let base = system[base_index].clone();
        let mut reduced = Vec::with_capacity(system.len() - 1);
        for (i, p) in system.iter().enumerate() {
            if i == base_index {
                continue;
            }
            if p.depends_on(var) {
                reduced.push(resultant(&base, p, var, budget)?);
            } else {
                reduced.push(p.clone());
            }
        }
        let remaining: Vec<usize> = unknowns.iter().copied().filter(|&u| u != var).collect();
        let partial = self.eliminate(reduced, &remaining, nvars, eliminated + 1, budget)?;

        let mut points = Vec::new();
        for point in partial {
            for root in numeric_roots(&base.univariate_at(var, &point), budget)? {
                let mut full = point.clone();
                full[var] = root;
                points.push(full);
            }
        }
        Ok(points)
    }

    fn satisfies(&self, lowered: &[RationalFn], point: &[Complex64]) -> bool {
        lowered.iter().all(|f| {
            let (den, den_scale) = f.den.eval_scaled(point);
            let (num, num_scale) = f.num.eval_scaled(point);
            den.norm() > self.config.denominator_tolerance * den_scale
                && num.norm() <= self.config.residual_tolerance * num_scale
        })
    }

    fn as_real(&self, point: &[Complex64]) -> Result<Vec<f64>, (usize, Complex64)> {
        point
            .iter()
            .enumerate()
            .map(|(i, z)| {
                if z.im.abs() <= self.config.imaginary_tolerance * z.norm() {
                    Ok(z.re)
                } else {
                    Err((i, *z))
                }
            })
            .collect()
    }
}

/// First equation linear in some unknown, preferring a constant coefficient
/// so the substitution introduces no new denominator.
fn linear_pivot(system: &[Poly], unknowns: &[usize]) -> Option<(usize, usize)> {
    let linear = move || {
        system.iter().enumerate().flat_map(move |(i, p)| {
            unknowns.iter().copied().filter(move |&u| p.degree_in(u) == 1).map(move |u| (i, u))
        })
    };
    linear()
        .find(|&(i, u)| system[i].coefficient(u, 1).as_constant().is_some())
        .or_else(|| linear().next())
}

fn same_point(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(f64::MIN_POSITIVE))
}

struct Env<'a> {
    quantities: &'a Quantities,
    unknowns: &'a [String],
    budget: &'a Budget,
}

impl Env<'_> {
    fn bind(&self, name: &str) -> Result<RationalFn, SolveError> {
        let nvars = self.unknowns.len();
        if let Some(index) = self.unknowns.iter().position(|u| u == name) {
            return Ok(RationalFn::var(nvars, index));
        }
        match self.quantities.get(name) {
            Some(Quantity::Known(value)) => {
                let exact = Rational::from_float(value).ok_or_else(|| SolveError::InvalidQuantity {
                    name: name.to_string(),
                    value,
                })?;
                Ok(RationalFn::constant(nvars, exact))
            }
            _ => Err(SolveError::UnresolvedSymbol(name.to_string())),
        }
    }

    fn lower(&self, expr: &Expr) -> Result<RationalFn, SolveError> {
        let budget = self.budget;
        match expr {
            Expr::Num(n) => Ok(RationalFn::constant(self.unknowns.len(), n.clone())),
            Expr::Sym(name) => self.bind(name),
            Expr::Neg(inner) => Ok(self.lower(inner)?.neg()),
            Expr::Add(a, b) => self.lower(a)?.add(&self.lower(b)?, budget),
            Expr::Sub(a, b) => self.lower(a)?.sub(&self.lower(b)?, budget),
            Expr::Mul(a, b) => self.lower(a)?.mul(&self.lower(b)?, budget),
            Expr::Div(a, b) => self.lower(a)?.div(&self.lower(b)?, budget),
            Expr::Pow(base, exponent) => self.lower(base)?.powi(*exponent, budget),
        }
    }
}
