//! Pump backends: a simulated pump for development and tests, and a GPIO
//! pump behind the `hardware` feature for the real device.

pub mod error;

use pulsedose_traits::Pump;

/// Simulated pump: logs transitions and counts pulses, never fails.
#[derive(Debug, Default)]
pub struct SimulatedPump {
    is_on: bool,
    pulses: u64,
}

impl SimulatedPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed ON→OFF pulses so far.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}

impl Pump for SimulatedPump {
    fn set_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.is_on = true;
        tracing::debug!("pump on (simulated)");
        Ok(())
    }

    fn set_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.is_on {
            self.pulses += 1;
        }
        self.is_on = false;
        tracing::debug!(pulses = self.pulses, "pump off (simulated)");
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::GpioPump;

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod gpio {
    use crate::error::HwError;
    use pulsedose_traits::Pump;
    use rppal::gpio::{Gpio, OutputPin};

    /// Pump driven through one GPIO output pin, claimed once at startup.
    pub struct GpioPump {
        pin: OutputPin,
    }

    impl GpioPump {
        pub fn new(pin_id: u8) -> Result<Self, HwError> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let mut pin = gpio
                .get(pin_id)
                .map_err(|e| HwError::Gpio(e.to_string()))?
                .into_output();
            // Start and stay LOW until the scheduler pulses.
            pin.set_low();
            tracing::info!(pin = pin_id, "pump GPIO claimed");
            Ok(Self { pin })
        }
    }

    impl Pump for GpioPump {
        fn set_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.pin.set_high();
            Ok(())
        }

        fn set_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.pin.set_low();
            Ok(())
        }
    }

    impl Drop for GpioPump {
        fn drop(&mut self) {
            // Never leave the valve open past process exit.
            self.pin.set_low();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_pump_counts_full_pulses() {
        let mut pump = SimulatedPump::new();
        pump.set_on().unwrap();
        pump.set_off().unwrap();
        pump.set_on().unwrap();
        pump.set_off().unwrap();
        assert_eq!(pump.pulses(), 2);
    }

    #[test]
    fn redundant_off_is_not_a_pulse() {
        let mut pump = SimulatedPump::new();
        pump.set_off().unwrap();
        pump.set_off().unwrap();
        assert_eq!(pump.pulses(), 0);
    }
}
