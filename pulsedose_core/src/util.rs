//! Window and time constants for the pulse planner.

/// Length of one dispensing window in milliseconds (one hour).
pub const WINDOW_MS: u64 = 3_600_000;

/// Milliseconds per second, for dose-rate conversions.
pub const MILLIS_PER_SEC: f64 = 1_000.0;
