//! Process wiring: config, logging, signals, the actuation thread, and the
//! HTTP intake loop.

mod cli;
mod http;
mod logging;

use clap::Parser;
use eyre::WrapErr;
use pulsedose_core::{Calibration, DoseCell, build_scheduler, runner};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How long the actuation thread sleeps between idle polls of the dose cell.
const IDLE_POLL: Duration = Duration::from_millis(500);

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = cli::Cli::parse();

    let raw = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("reading config {}", args.config.display()))?;
    let mut cfg = pulsedose_config::load_toml(&raw)
        .wrap_err_with(|| format!("parsing config {}", args.config.display()))?;
    if let Some(port) = args.port {
        cfg.network.port = port;
    }
    cfg.validate()
        .wrap_err_with(|| format!("validating config {}", args.config.display()))?;

    if args.check {
        println!("config ok: {}", args.config.display());
        return Ok(());
    }

    logging::init(&args.log_level, args.json, &cfg.logging)?;
    tracing::info!(
        ssid = %cfg.network.ssid,
        pump_pin = cfg.pins.pump,
        "pulse-dose controller starting"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("shutdown signal received");
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("installing signal handler")?;
    }

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let pump: Box<dyn pulsedose_traits::Pump + Send> =
        Box::new(pulsedose_hardware::GpioPump::new(cfg.pins.pump).wrap_err("opening pump pin")?);
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let pump: Box<dyn pulsedose_traits::Pump + Send> =
        Box::new(pulsedose_hardware::SimulatedPump::new());

    let dose = Arc::new(DoseCell::default());
    let calibration = Calibration {
        pulse_count: cfg.calibration.pulse_count,
        mg_per_ml: cfg.calibration.mg_per_ml,
        pump_rate: cfg.calibration.pump_rate,
    };

    let abort = shutdown.clone();
    let scheduler = build_scheduler(
        pump,
        calibration,
        dose.clone(),
        None,
        Some(Box::new(move || abort.load(Ordering::Relaxed))),
    )?;

    let actuator = {
        let shutdown = shutdown.clone();
        std::thread::Builder::new()
            .name("actuator".into())
            .spawn(move || runner::run_until_shutdown(scheduler, shutdown, IDLE_POLL))
            .wrap_err("spawning actuation thread")?
    };

    let addr: SocketAddr = format!("{}:{}", cfg.network.bind, cfg.network.port)
        .parse()
        .wrap_err("invalid bind address")?;
    let state = Arc::new(http::AppState::new(dose));

    let rt = tokio::runtime::Runtime::new().wrap_err("starting runtime")?;
    let served = rt.block_on(http::serve(addr, state, shutdown.clone()));

    // Whatever ended the intake loop, make sure the actuator winds down too.
    shutdown.store(true, Ordering::Relaxed);
    if actuator.join().is_err() {
        tracing::error!("actuation thread panicked");
    }
    served?;

    tracing::info!("pulse-dose controller stopped");
    Ok(())
}
