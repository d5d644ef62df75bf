use tracing::{debug, info, warn};

use super::{
    ConverterParams, DUTY, FSW, IOUT, OperatingPoint, PEAK, RIPPLE, TOFF, TON, TopoMode, VIN, VOUT, period,
    solved, sym, value_of,
};
use crate::errors::ConverterError;
use crate::expr::{Equation, Expr};
use crate::solver::{Assignment, Quantities, Solver};
use crate::units::Inductance;

/// Continuous-conduction analysis with a known inductance.
///
/// The duty cycle comes from volt-second balance alone; the peak current
/// from matching load energy against the trapezoidal off-interval discharge.
/// The result's [`TopoMode`] tells whether the CCM assumption held.
#[derive(Debug, Clone)]
pub struct CcmModel {
    params: ConverterParams,
    inductance: Inductance,
    solver: Solver,
}

impl CcmModel {
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

    /// `vin*ton = vout*toff` and `ton + toff = 1/fsw`.
    fn timing_equations() -> [Equation; 2] {
        [
            Equation::new(sym(VIN) * sym(TON), sym(VOUT) * sym(TOFF)),
            Equation::new(sym(TON) + sym(TOFF), period()),
        ]
    }

    /// `vout*iout*T = 1/2 * T*(1 - duty) * (vout*L_I_PK + vout*(L_I_PK - Irp))`
    fn energy_equation() -> Equation {
        let t = period();
        Equation::new(
            sym(VOUT) * sym(IOUT) * t.clone(),
            Expr::ratio(1, 2)
                * t
                * (Expr::int(1) - sym(DUTY))
                * (sym(VOUT) * sym(PEAK) + sym(VOUT) * (sym(PEAK) - sym(RIPPLE))),
        )
    }

    pub fn calculate(&self) -> Result<OperatingPoint, ConverterError> {
        let vin: f64 = self.params.vin.into();
        let vout: f64 = self.params.vout.into();
        let fsw: f64 = self.params.fsw.into();
        let iout: f64 = self.params.iout.into();
        let inductance: f64 = self.inductance.into();

        let quantities = Quantities::new()
            .known(FSW, fsw)
            .known(VIN, vin)
            .known(VOUT, vout)
            .unknown(TON)
            .unknown(TOFF);
        let positive = |a: &Assignment| a.iter().all(|(_, v)| v > 0.0);
        let timing = solved(self.solver.solve(&Self::timing_equations(), &quantities, Some(&positive))?)?;
        let ton = value_of(&timing, TON)?;
        let toff = value_of(&timing, TOFF)?;
        let duty = ton / (ton + toff);
        debug!(ton, toff, duty, "volt-second balance");

        let ripple = vout * ton / inductance;
        debug!(ripple, "inductor ripple current");

        let quantities = Quantities::new()
            .known(FSW, fsw)
            .known(VOUT, vout)
            .known(IOUT, iout)
            .known(DUTY, duty)
            .known(RIPPLE, ripple)
            .unknown(PEAK);
        let energy = solved(self.solver.solve(&[Self::energy_equation()], &quantities, None)?)?;
        let peak = value_of(&energy, PEAK)?;
        if peak == 0.0 {
            return Err(ConverterError::Degenerate("peak inductor current is zero"));
        }

        let ripple_factor = ripple / peak;
        let (mode, warning) = TopoMode::classify(ripple_factor);
        match warning {
            Some(warning) => warn!(ripple_factor, %mode, "{warning}"),
            None => info!(ripple_factor, %mode, "operating mode"),
        }

        Ok(OperatingPoint {
            duty,
            ton,
            toff,
            peak_current: peak,
            ripple_current: ripple,
            ripple_factor,
            mode,
            warning,
        })
    }
}
