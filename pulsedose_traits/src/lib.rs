pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Actuation seam for the pump/valve pin.
///
/// A pulse is ON then OFF; the scheduler owns all timing between the two.
pub trait Pump {
    fn set_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<P: Pump + ?Sized> Pump for Box<P> {
    fn set_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_on()
    }

    fn set_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_off()
    }
}
