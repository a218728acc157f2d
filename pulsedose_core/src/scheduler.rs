//! The dose scheduler and actuator: owns the pump, the calibration, and the
//! shared dose cell; each `tick()` recomputes the pulse plan and, if a dose
//! is pending, blocks through one full dispensing pass.

use crate::cell::DoseCell;
use crate::error::{PumpError, Result, ScheduleError};
use crate::plan::{Calibration, PulsePlan};
use eyre::WrapErr;
use pulsedose_traits::Pump;
use pulsedose_traits::clock::{Clock, MonotonicClock};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single control-loop pass.
#[derive(Debug)]
pub enum TickStatus {
    /// No dose pending; nothing actuated.
    Idle,
    /// Full pass executed with this plan.
    Dispensed(PulsePlan),
    /// Plan invalid this pass; skipped before touching the pin.
    Skipped(ScheduleError),
    /// Abort check fired mid-pass; pump has been forced off.
    Aborted,
}

/// Optional predicate polled between pulses; `true` aborts the pass.
pub type AbortCheck = Box<dyn Fn() -> bool + Send>;

pub struct DoseScheduler<P: Pump> {
    pump: P,
    calibration: Calibration,
    dose: Arc<DoseCell>,
    clock: Arc<dyn Clock + Send + Sync>,
    abort_check: Option<AbortCheck>,
    // Completed passes since construction, for the diagnostic stream.
    passes: u64,
}

impl<P: Pump> core::fmt::Debug for DoseScheduler<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DoseScheduler")
            .field("dose", &self.dose.get())
            .field("calibration", &self.calibration)
            .field("passes", &self.passes)
            .finish()
    }
}

impl<P: Pump> DoseScheduler<P> {
    /// Replace the current dose unconditionally. Numeric validation is the
    /// caller's job; non-finite and negative values are handled at planning
    /// time, not here.
    pub fn set_dose(&self, amount: f64) {
        self.dose.set(amount);
    }

    /// Dose the next pass will plan from.
    pub fn current_dose(&self) -> f64 {
        self.dose.get()
    }

    /// Completed dispense passes since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub(crate) fn idle_sleep(&self, d: Duration) {
        self.clock.sleep(d);
    }

    /// One control-loop pass: recompute the plan from the current dose and
    /// execute it. Blocks for the full pass (≈ the window length) when a
    /// dose is pending. The dose cell is read once at the start, so a value
    /// arriving mid-pass takes effect on the next pass.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let dose = self.dose.get();
        let plan = match PulsePlan::compute(dose, &self.calibration) {
            Ok(None) => return Ok(TickStatus::Idle),
            Ok(Some(plan)) => plan,
            Err(e) => {
                tracing::warn!(dose, error = %e, "skipping dispense pass");
                return Ok(TickStatus::Skipped(e));
            }
        };

        tracing::info!(
            dose,
            pulses = plan.pulse_count,
            pulse_ms = plan.pulse_ms,
            interval_ms = plan.interval_ms,
            pass_ms = plan.pass_ms(),
            "dispense pass start"
        );

        for pulse in 0..plan.pulse_count {
            if self.poll_abort() {
                if let Err(e) = self.pump_off() {
                    tracing::warn!(error = %e, "pump off failed on abort");
                }
                tracing::warn!(pulse, "dispense pass aborted");
                return Ok(TickStatus::Aborted);
            }

            if let Err(e) = self.pump_on() {
                self.quench_after_fault();
                return Err(e);
            }
            self.clock.sleep(Duration::from_millis(plan.pulse_ms));
            if let Err(e) = self.pump_off() {
                self.quench_after_fault();
                return Err(e);
            }
            self.clock.sleep(Duration::from_millis(plan.interval_ms));
        }

        self.passes += 1;
        tracing::info!(dose, pass = self.passes, "dispense pass complete");
        Ok(TickStatus::Dispensed(plan))
    }

    /// Force the pump off (best-effort).
    pub fn pump_off(&mut self) -> Result<()> {
        self.pump
            .set_off()
            .map_err(|e| eyre::Report::new(map_pump_error(&*e)))
            .wrap_err("pump off")
    }

    fn pump_on(&mut self) -> Result<()> {
        self.pump
            .set_on()
            .map_err(|e| eyre::Report::new(map_pump_error(&*e)))
            .wrap_err("pump on")
    }

    // After a pump fault the pin state is unknown; try once to leave it LOW.
    fn quench_after_fault(&mut self) {
        if let Err(e) = self.pump_off() {
            tracing::warn!(error = %e, "pump off failed after fault");
        }
    }

    fn poll_abort(&self) -> bool {
        self.abort_check.as_ref().is_some_and(|check| check())
    }
}

/// Map a trait-boundary error to a typed `PumpError`, downcasting the
/// hardware crate's error when the feature is enabled.
fn map_pump_error(e: &(dyn std::error::Error + 'static)) -> PumpError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<pulsedose_hardware::error::HwError>() {
            return PumpError::Fault(hw.to_string());
        }
    }
    PumpError::Other(e.to_string())
}

/// Validate the calibration and assemble a scheduler.
pub fn build_scheduler<P: Pump>(
    pump: P,
    calibration: Calibration,
    dose: Arc<DoseCell>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    abort_check: Option<AbortCheck>,
) -> Result<DoseScheduler<P>> {
    if let Err(e) = calibration.validate() {
        return Err(eyre::Report::new(e)).wrap_err("build scheduler");
    }
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    Ok(DoseScheduler {
        pump,
        calibration,
        dose,
        clock,
        abort_check,
        passes: 0,
    })
}
