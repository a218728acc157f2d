//! Outer control loop: look at the dose cell, run one pass, repeat.
//!
//! Pass-internal errors are logged and the loop continues — the process has
//! no higher authority to report to — so only the shutdown flag ends it.

use crate::scheduler::{DoseScheduler, TickStatus};
use pulsedose_traits::Pump;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Drive the scheduler until `shutdown` is set, leaving the pump off.
///
/// `idle_poll` bounds how quickly an idle (or skipped) pass re-checks the
/// dose cell. A dispense pass blocks for its full plan, so exactly one pass
/// is ever in flight; the shutdown flag interrupts a pass only through the
/// scheduler's abort check.
pub fn run_until_shutdown<P: Pump>(
    mut scheduler: DoseScheduler<P>,
    shutdown: Arc<AtomicBool>,
    idle_poll: Duration,
) {
    tracing::info!("actuation loop started");
    while !shutdown.load(Ordering::Relaxed) {
        match scheduler.tick() {
            Ok(TickStatus::Dispensed(_) | TickStatus::Aborted) => {}
            // Skipped passes already logged a diagnostic inside tick().
            Ok(TickStatus::Idle | TickStatus::Skipped(_)) => scheduler.idle_sleep(idle_poll),
            Err(e) => {
                tracing::error!(error = %e, "dispense pass failed");
                scheduler.idle_sleep(idle_poll);
            }
        }
    }
    if let Err(e) = scheduler.pump_off() {
        tracing::warn!(error = %e, "pump off failed during shutdown");
    }
    tracing::info!("actuation loop stopped");
}
