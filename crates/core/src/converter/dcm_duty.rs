use std::fmt;

use tracing::{debug, info};

use super::{ConverterParams, DUTY, FSW, IOUT, PEAK, VIN, VOUT, period, solved, sym, value_of};
use crate::errors::ConverterError;
use crate::expr::{Equation, Expr};
use crate::solver::{Quantities, Solver};
use crate::units::{DutyCycle, Inductance};

/// DCM design with the duty cycle fixed: yields the peak current and the
/// inductance that makes the inductor empty exactly at the end of `toff`.
#[derive(Debug, Clone)]
pub struct DcmDutyModel {
    params: ConverterParams,
    duty: DutyCycle,
    solver: Solver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcmDutyPoint {
    pub duty: f64,
    pub ton: f64,
    pub toff: f64,
    pub peak_current: f64,
    pub inductance: Inductance,
}

impl fmt::Display for DcmDutyPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inductance: f64 = self.inductance.into();
        writeln!(f, "duty: {:.4} ({:.2}%)", self.duty, self.duty * 100.0)?;
        writeln!(f, "on time ton: {:.3} us", self.ton * 1e6)?;
        writeln!(f, "off time toff: {:.3} us", self.toff * 1e6)?;
        writeln!(f, "peak current L_I_PK: {:.3} A", self.peak_current)?;
        write!(f, "inductance L: {:.3} uH", inductance * 1e6)
    }
}

impl DcmDutyModel {
    pub fn new(params: ConverterParams, duty: DutyCycle) -> Self {
        Self { params, duty, solver: Solver::default() }
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn params(&self) -> &ConverterParams {
        &self.params
    }

    pub fn duty(&self) -> DutyCycle {
        self.duty
    }

    pub fn calculate(&self) -> Result<DcmDutyPoint, ConverterError> {
        let vin: f64 = self.params.vin.into();
        let duty: f64 = self.duty.into();
        let t = period();
        let energy = Equation::new(
            sym(VOUT) * sym(IOUT) * t.clone(),
            Expr::ratio(1, 2) * t * sym(DUTY) * sym(VIN) * sym(PEAK),
        );
        let quantities = Quantities::new()
            .known(FSW, self.params.fsw.into())
            .known(VIN, vin)
            .known(VOUT, self.params.vout.into())
            .known(IOUT, self.params.iout.into())
            .known(DUTY, duty)
            .unknown(PEAK);
        let solution = solved(self.solver.solve(&[energy], &quantities, None)?)?;
        let peak = value_of(&solution, PEAK)?;
        if peak <= 0.0 {
            return Err(ConverterError::Degenerate("zero output current leaves the inductance undefined"));
        }

        let period = self.params.period();
        let ton = duty * period;
        let inductance = Inductance::new(vin * ton / peak)?;
        debug!(peak, inductance = f64::from(inductance), "required inductance");
        info!(duty, "dcm design");

        Ok(DcmDutyPoint {
            duty,
            ton,
            toff: period - ton,
            peak_current: peak,
            inductance,
        })
    }
}
