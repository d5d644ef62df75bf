//! Average I²R dissipation of a triangular or trapezoidal current pulse.

use std::fmt;

use crate::errors::CircuitError;
use crate::units::Resistance;

/// Current ramps from `i_valley` to `i_peak` over `t_rise`, back down over
/// `t_fall`, and the pattern repeats every `period`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulsedLoss {
    i_peak: f64,
    i_valley: f64,
    t_rise: f64,
    t_fall: f64,
    period: f64,
    resistance: Resistance,
}

impl PulsedLoss {
    pub fn new(
        i_peak: f64,
        i_valley: f64,
        t_rise: f64,
        t_fall: f64,
        period: f64,
        resistance: Resistance,
    ) -> Result<Self, CircuitError> {
        if !(period > 0.0 && period.is_finite()) {
            return Err(CircuitError::InvalidPeriod(period));
        }
        for duration in [t_rise, t_fall] {
            if !(duration >= 0.0 && duration.is_finite()) {
                return Err(CircuitError::InvalidDuration(duration));
            }
        }
        Ok(Self { i_peak, i_valley, t_rise, t_fall, period, resistance })
    }

    /// Energy dissipated per period divided by the period, watts.
    pub fn average_power(&self) -> f64 {
        let r: f64 = self.resistance.into();
        let energy = ramp_energy(self.i_valley, self.i_peak, self.t_rise, r)
            + ramp_energy(self.i_peak, self.i_valley, self.t_fall, r);
        energy / self.period
    }
}

/// Power with the integration rule it came from, for reports.
impl fmt::Display for PulsedLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} W (each ramp R·t·(Ipk² + Ipk·Ipv + Ipv²)/3, averaged over T)",
            self.average_power()
        )
    }
}

/// ∫ R·i(t)² dt for i rising linearly from `a` to `b` over `duration`.
fn ramp_energy(a: f64, b: f64, duration: f64, r: f64) -> f64 {
    match duration > 0.0 {
        true => r * duration * (a * a + a * b + b * b) / 3.0,
        false => 0.0,
    }
}
