//! Dose → pulse-schedule conversion.
//!
//! A dose is spread over the fixed window as `pulse_count` discrete pump
//! activations. Each activation runs the pump for `pulse_ms`, then waits
//! `interval_ms`, and the whole pass sums back to the window length modulo
//! rounding.

use crate::error::{BuildError, ScheduleError};
use crate::util::{MILLIS_PER_SEC, WINDOW_MS};

/// Fixed constants converting a dose into physical pump timing.
///
/// Set once at startup; all three must be strictly positive or the schedule
/// is undefined.
#[derive(Debug, Clone)]
pub struct Calibration {
    /// Discrete pump activations per dispensing window.
    pub pulse_count: u32,
    /// Concentration of the dispensed liquid, mass per mL.
    pub mg_per_ml: f64,
    /// Pump flow rate at full actuation, mL per second.
    pub pump_rate: f64,
}

impl Calibration {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.pulse_count == 0 {
            return Err(BuildError::InvalidCalibration("pulse_count must be > 0"));
        }
        if !self.mg_per_ml.is_finite() || self.mg_per_ml <= 0.0 {
            return Err(BuildError::InvalidCalibration(
                "mg_per_ml must be finite and > 0",
            ));
        }
        if !self.pump_rate.is_finite() || self.pump_rate <= 0.0 {
            return Err(BuildError::InvalidCalibration(
                "pump_rate must be finite and > 0",
            ));
        }
        Ok(())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pulse_count: 10,
            mg_per_ml: 0.5,
            pump_rate: 1.5,
        }
    }
}

/// ON/OFF durations applied uniformly to every pulse of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePlan {
    pub pulse_count: u32,
    /// Pump ON time per pulse, ms.
    pub pulse_ms: u64,
    /// Wait after each pulse, ms.
    pub interval_ms: u64,
}

impl PulsePlan {
    /// Convert a dose into a pulse plan for the given calibration.
    ///
    /// Negative doses are clamped to zero; `Ok(None)` means nothing to
    /// dispense this pass. The calibration must already be validated;
    /// planning only guards the dose-dependent failure modes (non-finite
    /// inputs and window overrun).
    pub fn compute(dose: f64, cal: &Calibration) -> Result<Option<Self>, ScheduleError> {
        if !dose.is_finite() {
            return Err(ScheduleError::NonFiniteDose(dose));
        }
        let dose = dose.max(0.0);
        if dose == 0.0 {
            return Ok(None);
        }

        let count = f64::from(cal.pulse_count);
        let per_pulse = dose / count;
        let pulse_ms_f = per_pulse / (cal.pump_rate * cal.mg_per_ml) * MILLIS_PER_SEC;
        if !pulse_ms_f.is_finite() {
            return Err(ScheduleError::NonFinitePlan);
        }
        // `as u64` saturates, so absurd plans still land in the overrun check
        // below instead of wrapping.
        let pulse_ms = pulse_ms_f.round() as u64;
        let on_total = pulse_ms.saturating_mul(u64::from(cal.pulse_count));
        if on_total > WINDOW_MS {
            return Err(ScheduleError::WindowOverrun {
                needed_ms: on_total,
                window_ms: WINDOW_MS,
            });
        }
        let interval_ms = (((WINDOW_MS - on_total) as f64) / count).round() as u64;
        Ok(Some(Self {
            pulse_count: cal.pulse_count,
            pulse_ms,
            interval_ms,
        }))
    }

    /// Total blocked time for one full pass, ms.
    pub fn pass_ms(&self) -> u64 {
        (self.pulse_ms + self.interval_ms) * u64::from(self.pulse_count)
    }
}
