//! Steady-state operating points of a buck-boost converter.
//!
//! Three models share the same topology and the same result type:
//!
//! - [`CcmModel`]: inductance known, continuous conduction assumed, mode
//!   verified afterwards from the ripple factor.
//! - [`DcmModel`]: inductance known, discontinuous conduction assumed, duty
//!   cycle and peak current solved jointly.
//! - [`DcmDutyModel`]: duty cycle known, required inductance derived.

mod ccm;
mod dcm;
mod dcm_duty;

use std::fmt;

pub use ccm::CcmModel;
pub use dcm::DcmModel;
pub use dcm_duty::{DcmDutyModel, DcmDutyPoint};

use crate::errors::{CircuitError, ConverterError};
use crate::expr::Expr;
use crate::solver::{SolveOutcome, Solution};
use crate::units::{Current, Frequency, Voltage};

pub(crate) const FSW: &str = "fsw";
pub(crate) const VIN: &str = "vin";
pub(crate) const VOUT: &str = "vout";
pub(crate) const IOUT: &str = "iout";
pub(crate) const INDUCTANCE: &str = "L";
pub(crate) const TON: &str = "ton";
pub(crate) const TOFF: &str = "toff";
pub(crate) const DUTY: &str = "duty";
pub(crate) const PEAK: &str = "L_I_PK";
pub(crate) const RIPPLE: &str = "Irp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopoMode {
    Ccm,
    Dcm,
}

impl TopoMode {
    /// Conduction mode implied by a ripple factor `Irp / L_I_PK`.
    ///
    /// Exactly one is the CCM/DCM boundary and is reported as DCM. Anything
    /// above one contradicts the continuous-conduction assumption and carries
    /// [`ModeWarning::InductanceTooSmall`].
    pub fn classify(ripple_factor: f64) -> (TopoMode, Option<ModeWarning>) {
        if ripple_factor < 1.0 {
            (TopoMode::Ccm, None)
        } else if ripple_factor == 1.0 {
            (TopoMode::Dcm, None)
        } else {
            (TopoMode::Dcm, Some(ModeWarning::InductanceTooSmall))
        }
    }
}

impl fmt::Display for TopoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ccm => f.write_str("ccm"),
            Self::Dcm => f.write_str("dcm"),
        }
    }
}

/// Non-fatal hint that another model variant fits these inputs better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeWarning {
    /// Ripple exceeds the peak current: the converter runs in DCM, use [`DcmModel`].
    InductanceTooSmall,
    /// No physical DCM root exists: the converter runs in CCM, use [`CcmModel`].
    InductanceTooLarge,
}

impl fmt::Display for ModeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InductanceTooSmall => {
                f.write_str("inductance too small or duty too large: the converter will run in DCM")
            }
            Self::InductanceTooLarge => {
                f.write_str("cannot run in DCM with this inductance, it will likely run in CCM; reduce the inductance")
            }
        }
    }
}

/// Fixed electrical conditions shared by every model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConverterParams {
    pub fsw: Frequency,
    pub vin: Voltage,
    pub vout: Voltage,
    pub iout: Current,
}

impl ConverterParams {
    pub fn new(fsw: f64, vin: f64, vout: f64, iout: f64) -> Result<Self, CircuitError> {
        Ok(Self {
            fsw: Frequency::new(fsw)?,
            vin: Voltage::new(vin)?,
            vout: Voltage::new(vout)?,
            iout: Current::new(iout)?,
        })
    }

    pub fn period(&self) -> f64 {
        self.fsw.period()
    }
}

impl Default for ConverterParams {
    /// 250 kHz, 11 V in, 20 V / 5 A out.
    fn default() -> Self {
        Self {
            fsw: Frequency(250e3),
            vin: Voltage(11.0),
            vout: Voltage(20.0),
            iout: Current(5.0),
        }
    }
}

/// Derived quantities of one steady-state solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub duty: f64,
    pub ton: f64,
    pub toff: f64,
    /// Peak inductor current `L_I_PK`, amperes.
    pub peak_current: f64,
    /// Peak-to-trough inductor ripple `Irp`, amperes.
    pub ripple_current: f64,
    /// `Krp = Irp / L_I_PK`.
    pub ripple_factor: f64,
    pub mode: TopoMode,
    pub warning: Option<ModeWarning>,
}

impl OperatingPoint {
    /// Inductor current at the start of the on-interval.
    pub fn valley_current(&self) -> f64 {
        self.peak_current - self.ripple_current
    }
}

impl fmt::Display for OperatingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "on time ton: {:.3} us", self.ton * 1e6)?;
        writeln!(f, "off time toff: {:.3} us", self.toff * 1e6)?;
        writeln!(f, "duty: {:.4} ({:.2}%)", self.duty, self.duty * 100.0)?;
        writeln!(f, "ripple current Irp: {:.3} A", self.ripple_current)?;
        writeln!(f, "peak current L_I_PK: {:.3} A", self.peak_current)?;
        writeln!(f, "ripple factor Krp: {:.4}", self.ripple_factor)?;
        write!(f, "mode: {}", self.mode)?;
        if let Some(warning) = self.warning {
            write!(f, "\nwarning: {warning}")?;
        }
        Ok(())
    }
}

pub(crate) fn sym(name: &str) -> Expr {
    Expr::sym(name)
}

/// `1 / fsw`
pub(crate) fn period() -> Expr {
    Expr::int(1) / sym(FSW)
}

pub(crate) fn solved(outcome: SolveOutcome) -> Result<Solution, ConverterError> {
    outcome
        .solution()
        .ok_or(ConverterError::Degenerate("every quantity was already known"))
}

pub(crate) fn value_of(solution: &Solution, name: &str) -> Result<f64, ConverterError> {
    solution
        .get(name)
        .ok_or_else(|| ConverterError::MissingUnknown(name.to_string()))
}
