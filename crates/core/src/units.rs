use crate::errors::CircuitError;

/// Switching frequency in hertz.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Frequency(pub(crate) f64);

impl Frequency {
    pub fn new(hz: f64) -> Result<Self, CircuitError> {
        match hz > 0.0 && hz.is_finite() {
            true => Ok(Self(hz)),
            false => Err(CircuitError::InvalidFrequency(hz)),
        }
    }

    /// Length of one switching period in seconds.
    pub fn period(self) -> f64 {
        1.0 / self.0
    }
}

impl From<Frequency> for f64 {
    fn from(value: Frequency) -> f64 {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Voltage(pub(crate) f64);

impl Voltage {
    pub fn new(volts: f64) -> Result<Self, CircuitError> {
        match volts > 0.0 && volts.is_finite() {
            true => Ok(Self(volts)),
            false => Err(CircuitError::InvalidVoltage(volts)),
        }
    }
}

impl From<Voltage> for f64 {
    fn from(value: Voltage) -> f64 {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Current(pub(crate) f64);

impl Current {
    pub fn new(amps: f64) -> Result<Self, CircuitError> {
        match amps >= 0.0 && amps.is_finite() {
            true => Ok(Self(amps)),
            false => Err(CircuitError::InvalidCurrent(amps)),
        }
    }
}

impl From<Current> for f64 {
    fn from(value: Current) -> f64 {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Inductance(pub(crate) f64);

impl Inductance {
    pub fn new(l: f64) -> Result<Self, CircuitError> {
        match l > 0.0 && l.is_finite() {
            true => Ok(Self(l)),
            false => Err(CircuitError::InvalidInductance(l)),
        }
    }

    pub fn from_micro(uh: f64) -> Result<Self, CircuitError> {
        Self::new(uh * 1e-6)
    }
}

impl From<Inductance> for f64 {
    fn from(value: Inductance) -> f64 {
        value.0
    }
}

/// Resistance in ohms. Zero is allowed so an ideal conductor can be modelled.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Resistance(pub(crate) f64);

impl Resistance {
    pub fn new(r: f64) -> Result<Self, CircuitError> {
        match r >= 0.0 && r.is_finite() {
            true => Ok(Self(r)),
            false => Err(CircuitError::InvalidResistance(r)),
        }
    }
}

impl From<Resistance> for f64 {
    fn from(value: Resistance) -> f64 {
        value.0
    }
}

/// Fraction of the period the primary switch conducts, open interval (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DutyCycle(pub(crate) f64);

impl DutyCycle {
    pub fn new(duty: f64) -> Result<Self, CircuitError> {
        match duty > 0.0 && duty < 1.0 {
            true => Ok(Self(duty)),
            false => Err(CircuitError::InvalidDuty(duty)),
        }
    }
}

impl From<DutyCycle> for f64 {
    fn from(value: DutyCycle) -> f64 {
        value.0
    }
}
