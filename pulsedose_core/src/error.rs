use thiserror::Error;

/// Plan-level errors, detected before any actuation. The pass that produced
/// one is skipped and retried on the next loop iteration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("dose is not finite: {0}")]
    NonFiniteDose(f64),
    #[error("pulse plan produced a non-finite duration")]
    NonFinitePlan,
    #[error("total pulse time {needed_ms}ms exceeds the {window_ms}ms window")]
    WindowOverrun { needed_ms: u64, window_ms: u64 },
}

/// Pump I/O failures, fatal to the current pass. There is no higher
/// authority to report to; these surface through the log stream only.
#[derive(Debug, Error, Clone)]
pub enum PumpError {
    #[error("pump fault: {0}")]
    Fault(String),
    #[error("pump error: {0}")]
    Other(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid calibration: {0}")]
    InvalidCalibration(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
