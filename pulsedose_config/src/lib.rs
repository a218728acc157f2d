#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and validation for the pulse-dose controller.
//!
//! Everything is fixed at startup: the network identity the device hosts,
//! the calibration constants, the actuation pin, and logging options. The
//! TOML is deserialized with serde and validated before anything is built
//! from it.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Network {
    /// Name of the access point the device hosts.
    pub ssid: String,
    /// Access-point passphrase.
    pub passphrase: String,
    /// Address the dose endpoint binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    80
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationCfg {
    /// Discrete pump activations per one-hour dispensing window.
    pub pulse_count: u32,
    /// Concentration, mg per mL.
    pub mg_per_ml: f64,
    /// Pump flow rate at full actuation, mL per second.
    pub pump_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// GPIO id of the pump/valve pin.
    pub pump: u8,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: Network,
    pub calibration: CalibrationCfg,
    pub pins: Pins,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.network.ssid.is_empty() {
            eyre::bail!("network.ssid must not be empty");
        }
        // WPA2 constraint carried over from the device's soft-AP setup.
        if self.network.passphrase.len() < 8 {
            eyre::bail!("network.passphrase must be at least 8 characters");
        }

        if self.calibration.pulse_count == 0 {
            eyre::bail!("calibration.pulse_count must be > 0");
        }
        if !self.calibration.mg_per_ml.is_finite() || self.calibration.mg_per_ml <= 0.0 {
            eyre::bail!("calibration.mg_per_ml must be finite and > 0");
        }
        if !self.calibration.pump_rate.is_finite() || self.calibration.pump_rate <= 0.0 {
            eyre::bail!("calibration.pump_rate must be finite and > 0");
        }

        Ok(())
    }
}
