//! Deterministic pump and clock doubles for exercising the scheduler.

use pulsedose_traits::{Clock, Pump};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Pin transition recorded by [`RecordingPump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    On,
    Off,
}

/// Pump double that records every pin transition.
#[derive(Default)]
pub struct RecordingPump {
    events: Arc<Mutex<Vec<PinEvent>>>,
}

impl RecordingPump {
    /// Returns the pump and a handle onto its event log.
    pub fn new() -> (Self, Arc<Mutex<Vec<PinEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }

    fn record(&self, ev: PinEvent) {
        if let Ok(mut log) = self.events.lock() {
            log.push(ev);
        }
    }
}

impl Pump for RecordingPump {
    fn set_on(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(PinEvent::On);
        Ok(())
    }
    fn set_off(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.record(PinEvent::Off);
        Ok(())
    }
}

/// Pump whose writes start failing after `ok_calls` successful calls.
pub struct FailingPump {
    remaining: u32,
}

impl FailingPump {
    pub fn new(ok_calls: u32) -> Self {
        Self {
            remaining: ok_calls,
        }
    }

    fn take_one(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.remaining == 0 {
            return Err(Box::new(std::io::Error::other("pin write failed")));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl Pump for FailingPump {
    fn set_on(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.take_one()
    }
    fn set_off(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.take_one()
    }
}

/// Clock that advances instantly on `sleep` and records every sleep, so an
/// hour-long pass runs in microseconds and tests can audit the waits.
#[derive(Clone)]
pub struct ManualClock {
    origin: Instant,
    state: Arc<Mutex<ManualState>>,
}

struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(ManualState {
                offset: Duration::ZERO,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .map(|s| s.sleeps.clone())
            .unwrap_or_default()
    }

    /// Sum of all sleeps requested so far.
    pub fn total_slept(&self) -> Duration {
        self.state
            .lock()
            .map(|s| s.sleeps.iter().sum())
            .unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.state.lock().map(|s| s.offset).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.offset = state.offset.saturating_add(d);
            state.sleeps.push(d);
        }
    }
}
