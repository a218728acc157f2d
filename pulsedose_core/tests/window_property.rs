use proptest::prelude::*;
use pulsedose_core::{Calibration, PulsePlan, WINDOW_MS};

prop_compose! {
    fn calibration_strategy()(
        pulse_count in 1u32..200,
        mg_per_ml in 0.05f64..10.0,
        pump_rate in 0.05f64..10.0,
    ) -> Calibration {
        Calibration { pulse_count, mg_per_ml, pump_rate }
    }
}

proptest! {
    // For every valid plan, the pass sums back to the one-hour window within
    // one millisecond of rounding error per pulse.
    #[test]
    fn pass_time_sums_to_the_window(
        dose in 0.001f64..5_000.0,
        cal in calibration_strategy(),
    ) {
        match PulsePlan::compute(dose, &cal) {
            Ok(Some(plan)) => {
                let count = u64::from(plan.pulse_count);
                let total = plan.pulse_ms * count + plan.interval_ms * count;
                let drift = total.abs_diff(WINDOW_MS);
                prop_assert!(
                    drift <= count,
                    "total {total}ms drifts {drift}ms from window with {count} pulses"
                );
                prop_assert_eq!(plan.pass_ms(), total);
            }
            Ok(None) => prop_assert!(dose <= 0.0),
            // Large doses against slow pumps legitimately overrun the window.
            Err(pulsedose_core::ScheduleError::WindowOverrun { needed_ms, window_ms }) => {
                prop_assert!(needed_ms > window_ms);
            }
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        }
    }

    // The ON budget never exceeds the window in any accepted plan, so the
    // interval fed to the timed wait is never the wrapped form of a negative.
    #[test]
    fn accepted_plans_fit_inside_the_window(
        dose in 0.001f64..5_000.0,
        cal in calibration_strategy(),
    ) {
        if let Ok(Some(plan)) = PulsePlan::compute(dose, &cal) {
            let on_total = plan.pulse_ms * u64::from(plan.pulse_count);
            prop_assert!(on_total <= WINDOW_MS);
            prop_assert!(plan.interval_ms <= WINDOW_MS);
        }
    }
}
