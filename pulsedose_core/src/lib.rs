#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Dose scheduling core (hardware-agnostic).
//!
//! Converts a requested dose into a plan of evenly spaced pump pulses over a
//! fixed one-hour window and drives the actuation pin through that plan. All
//! hardware interaction goes through `pulsedose_traits::Pump`; all waiting
//! goes through `pulsedose_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Plan**: dose → (pulse count, ON ms, OFF ms) arithmetic (`plan` module)
//! - **Cell**: lock-free current-dose cell shared with request intake (`cell`)
//! - **Scheduler**: owns pump + calibration, executes one pass per `tick()`
//! - **Runner**: outer loop with shutdown flag and idle polling (`runner`)
//!
//! The scheduler never feeds a negative or non-finite duration into a timed
//! wait; invalid plans are typed errors and the pass is skipped.

pub mod cell;
pub mod error;
pub mod mocks;
pub mod plan;
pub mod runner;
pub mod scheduler;
pub mod util;

pub use cell::DoseCell;
pub use error::{BuildError, PumpError, Result, ScheduleError};
pub use plan::{Calibration, PulsePlan};
pub use scheduler::{DoseScheduler, TickStatus, build_scheduler};
pub use util::WINDOW_MS;
