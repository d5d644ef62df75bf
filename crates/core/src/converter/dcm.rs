use tracing::{debug, info, warn};

use super::{
    ConverterParams, DUTY, FSW, INDUCTANCE, IOUT, ModeWarning, OperatingPoint, PEAK, TopoMode, VIN, VOUT,
    period, solved, sym, value_of,
};
use crate::errors::ConverterError;
use crate::expr::{Equation, Expr};
use crate::solver::{Assignment, Quantities, Solver};
use crate::units::Inductance;

/// Discontinuous-conduction analysis with a known inductance.
///
/// Energy balance and the on-interval current slope are solved together for
/// `duty` and `L_I_PK`. The system is quadratic in `duty`, so the first root
/// with `L_I_PK > 0` and `0 < duty < 1` is taken. When no such root exists the
/// inductor never empties: the first root is returned anyway, tagged
/// [`TopoMode::Ccm`] with [`ModeWarning::InductanceTooLarge`].
#[derive(Debug, Clone)]
pub struct DcmModel {
    params: ConverterParams,
    inductance: Inductance,
    solver: Solver,
}

impl DcmModel {
    pub fn new(params: ConverterParams, inductance: Inductance) -> Self {
        Self { params, inductance, solver: Solver::default() }
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn params(&self) -> &ConverterParams {
        &self.params
    }

    pub fn inductance(&self) -> Inductance {
        self.inductance
    }

    fn equations() -> [Equation; 2] {
        let t = period();
        [
            // vout*iout*T = 1/2 * T*duty*vin*L_I_PK
            Equation::new(
                sym(VOUT) * sym(IOUT) * t.clone(),
                Expr::ratio(1, 2) * t.clone() * sym(DUTY) * sym(VIN) * sym(PEAK),
            ),
            // vin = L * L_I_PK / (duty*T)
            Equation::new(sym(VIN), sym(INDUCTANCE) * (sym(PEAK) / (sym(DUTY) * t))),
        ]
    }

    pub fn calculate(&self) -> Result<OperatingPoint, ConverterError> {
        let quantities = Quantities::new()
            .known(FSW, self.params.fsw.into())
            .known(VIN, self.params.vin.into())
            .known(VOUT, self.params.vout.into())
            .known(IOUT, self.params.iout.into())
            .known(INDUCTANCE, self.inductance.into())
            .unknown(PEAK)
            .unknown(DUTY);
        let physical = |a: &Assignment| match (a.get(PEAK), a.get(DUTY)) {
            (Some(peak), Some(duty)) => peak > 0.0 && duty > 0.0 && duty < 1.0,
            _ => false,
        };
        let solution = solved(self.solver.solve(&Self::equations(), &quantities, Some(&physical))?)?;
        let peak = value_of(&solution, PEAK)?;
        let duty = value_of(&solution, DUTY)?;
        debug!(peak, duty, candidates = solution.candidates().len(), "dcm roots");

        let (mode, warning) = if solution.is_plausible() {
            info!(mode = %TopoMode::Dcm, "operating mode");
            (TopoMode::Dcm, None)
        } else {
            let warning = ModeWarning::InductanceTooLarge;
            warn!(peak, duty, "{warning}");
            (TopoMode::Ccm, Some(warning))
        };

        let period = self.params.period();
        Ok(OperatingPoint {
            duty,
            ton: duty * period,
            toff: (1.0 - duty) * period,
            peak_current: peak,
            ripple_current: peak,
            ripple_factor: 1.0,
            mode,
            warning,
        })
    }
}
