use std::sync::Arc;
use std::time::Duration;

use pulsedose_core::mocks::{FailingPump, ManualClock, PinEvent, RecordingPump};
use pulsedose_core::{Calibration, DoseCell, ScheduleError, TickStatus, build_scheduler};
use rstest::rstest;

fn cal() -> Calibration {
    Calibration {
        pulse_count: 10,
        mg_per_ml: 0.5,
        pump_rate: 1.5,
    }
}

fn scheduler_with(
    dose: f64,
) -> (
    pulsedose_core::DoseScheduler<RecordingPump>,
    Arc<std::sync::Mutex<Vec<PinEvent>>>,
    ManualClock,
) {
    let (pump, events) = RecordingPump::new();
    let clock = ManualClock::new();
    let cell = Arc::new(DoseCell::new(dose));
    let scheduler = build_scheduler(pump, cal(), cell, Some(Box::new(clock.clone())), None)
        .expect("build scheduler");
    (scheduler, events, clock)
}

#[test]
fn zero_dose_does_not_actuate() {
    let (mut scheduler, events, clock) = scheduler_with(0.0);
    assert!(matches!(scheduler.tick().unwrap(), TickStatus::Idle));
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(clock.total_slept(), Duration::ZERO);
}

#[test]
fn negative_dose_is_clamped_to_idle() {
    let (mut scheduler, events, _clock) = scheduler_with(-2.5);
    assert!(matches!(scheduler.tick().unwrap(), TickStatus::Idle));
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn dispense_pass_runs_every_pulse() {
    let (mut scheduler, events, clock) = scheduler_with(2.5);
    let status = scheduler.tick().unwrap();
    let TickStatus::Dispensed(plan) = status else {
        panic!("expected dispense, got {status:?}");
    };

    // Exactly pulse_count ON/OFF pairs, strictly alternating.
    let log = events.lock().unwrap();
    assert_eq!(log.len(), 2 * plan.pulse_count as usize);
    for pair in log.chunks(2) {
        assert_eq!(pair, [PinEvent::On, PinEvent::Off]);
    }

    // Every wait matches the plan: ON for pulse_ms, then OFF for interval_ms.
    let sleeps = clock.sleeps();
    assert_eq!(sleeps.len(), 2 * plan.pulse_count as usize);
    for pair in sleeps.chunks(2) {
        assert_eq!(pair[0], Duration::from_millis(plan.pulse_ms));
        assert_eq!(pair[1], Duration::from_millis(plan.interval_ms));
    }
    assert_eq!(clock.total_slept(), Duration::from_millis(plan.pass_ms()));
}

#[test]
fn sticky_dose_redispenses_every_pass() {
    // The dose is never consumed: N passes dispense N times the same plan.
    let (mut scheduler, events, clock) = scheduler_with(1.0);
    let mut first_plan = None;
    for _ in 0..3 {
        match scheduler.tick().unwrap() {
            TickStatus::Dispensed(plan) => {
                let prev = *first_plan.get_or_insert(plan);
                assert_eq!(prev, plan);
            }
            other => panic!("expected dispense, got {other:?}"),
        }
    }
    let plan = first_plan.unwrap();
    assert_eq!(scheduler.passes(), 3);
    assert_eq!(events.lock().unwrap().len(), 3 * 2 * plan.pulse_count as usize);
    // Total pump-ON time is three passes' worth of the same dose.
    let on_ms: u64 = clock
        .sleeps()
        .chunks(2)
        .map(|pair| pair[0].as_millis() as u64)
        .sum();
    assert_eq!(on_ms, 3 * plan.pulse_ms * u64::from(plan.pulse_count));
}

#[test]
fn set_dose_is_idempotent_for_planning() {
    let (mut scheduler, _events, _clock) = scheduler_with(0.0);
    scheduler.set_dose(2.5);
    scheduler.set_dose(2.5);
    let TickStatus::Dispensed(first) = scheduler.tick().unwrap() else {
        panic!("expected dispense");
    };
    let TickStatus::Dispensed(second) = scheduler.tick().unwrap() else {
        panic!("expected dispense");
    };
    assert_eq!(first, second);
}

#[test]
fn dose_update_applies_on_next_pass() {
    let (mut scheduler, _events, _clock) = scheduler_with(1.0);
    let TickStatus::Dispensed(small) = scheduler.tick().unwrap() else {
        panic!("expected dispense");
    };
    scheduler.set_dose(2.0);
    let TickStatus::Dispensed(doubled) = scheduler.tick().unwrap() else {
        panic!("expected dispense");
    };
    assert!(doubled.pulse_ms > small.pulse_ms);
}

#[test]
fn non_finite_dose_skips_the_pass() {
    let (mut scheduler, events, clock) = scheduler_with(f64::NAN);
    match scheduler.tick().unwrap() {
        TickStatus::Skipped(ScheduleError::NonFiniteDose(_)) => {}
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(clock.total_slept(), Duration::ZERO);
}

#[test]
fn window_overrun_never_reaches_the_pin() {
    // A dose this large would need more ON time than the whole window; the
    // negative interval must be caught before any timed wait.
    let (mut scheduler, events, clock) = scheduler_with(1.0e9);
    match scheduler.tick().unwrap() {
        TickStatus::Skipped(ScheduleError::WindowOverrun { needed_ms, window_ms }) => {
            assert!(needed_ms > window_ms);
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(events.lock().unwrap().is_empty());
    assert_eq!(clock.total_slept(), Duration::ZERO);
}

#[test]
fn abort_check_stops_the_pass_with_pump_off() {
    let (pump, events) = RecordingPump::new();
    let clock = ManualClock::new();
    let cell = Arc::new(DoseCell::new(2.5));
    let mut scheduler = build_scheduler(
        pump,
        cal(),
        cell,
        Some(Box::new(clock)),
        Some(Box::new(|| true)),
    )
    .expect("build scheduler");

    assert!(matches!(scheduler.tick().unwrap(), TickStatus::Aborted));
    // The pass never pulsed, and the pump was left OFF.
    assert_eq!(*events.lock().unwrap(), vec![PinEvent::Off]);
    assert_eq!(scheduler.passes(), 0);
}

#[rstest]
#[case::fails_on_first_on(0)]
#[case::fails_on_first_off(1)]
fn pump_fault_is_fatal_to_the_pass(#[case] ok_calls: u32) {
    let clock = ManualClock::new();
    let cell = Arc::new(DoseCell::new(2.5));
    let mut scheduler = build_scheduler(
        FailingPump::new(ok_calls),
        cal(),
        cell,
        Some(Box::new(clock)),
        None,
    )
    .expect("build scheduler");

    let err = scheduler.tick().expect_err("pump fault should bubble");
    assert!(err.to_string().to_lowercase().contains("pump"));
    assert_eq!(scheduler.passes(), 0);
}

#[test]
fn build_rejects_invalid_calibration() {
    let (pump, _events) = RecordingPump::new();
    let bad = Calibration {
        pulse_count: 0,
        mg_per_ml: 0.5,
        pump_rate: 1.5,
    };
    let err = build_scheduler(pump, bad, Arc::new(DoseCell::default()), None, None)
        .expect_err("zero pulse_count must be rejected");
    assert!(format!("{err:#}").contains("pulse_count"));
}
