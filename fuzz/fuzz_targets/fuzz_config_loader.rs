#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validating arbitrary TOML must never panic; both parse
    // errors and validation errors are acceptable outcomes.
    if let Ok(cfg) = toml::from_str::<pulsedose_config::Config>(data) {
        let _ = cfg.validate();
    }
});
