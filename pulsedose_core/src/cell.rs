//! Shared current-dose cell: one writer (request intake), one reader
//! (the scheduler's actuation thread).

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free `f64` cell holding the current dose.
///
/// The value is stored as its bit pattern in an `AtomicU64`, so reads and
/// writes are single atomic operations and a mid-dispense update is simply
/// observed at the start of the next pass. Initialized to 0 (no dose).
#[derive(Debug, Default)]
pub struct DoseCell(AtomicU64);

impl DoseCell {
    pub fn new(initial: f64) -> Self {
        Self(AtomicU64::new(initial.to_bits()))
    }

    /// Replace the current dose unconditionally, including with 0 or
    /// negative values; validation is the caller's job.
    pub fn set(&self, dose: f64) {
        self.0.store(dose.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::DoseCell;

    #[test]
    fn defaults_to_zero() {
        assert_eq!(DoseCell::default().get(), 0.0);
    }

    #[test]
    fn set_overwrites_wholesale() {
        let cell = DoseCell::new(1.5);
        cell.set(2.5);
        assert_eq!(cell.get(), 2.5);
        cell.set(-4.0);
        assert_eq!(cell.get(), -4.0);
        cell.set(0.0);
        assert_eq!(cell.get(), 0.0);
    }

    #[test]
    fn preserves_exact_bit_pattern() {
        let cell = DoseCell::default();
        cell.set(0.1 + 0.2);
        assert_eq!(cell.get(), 0.1 + 0.2);
    }
}
