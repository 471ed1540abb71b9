//! Griddle - Patty Cooking Cell Controller
//!
//! Runs one cooking service on the cell: brings up the mezzanine,
//! connects to the robot controller over Modbus/TCP, finds the patties
//! on the hotplate and cooks each one through the recipe.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use griddle_core::actuator::{ActuatorLink, LinkConfig};
use griddle_core::config::CellConfig;
use griddle_core::recipe::patty::Station;
use griddle_core::traits::MonotonicClock;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use crate::controller::{CellController, RunOutcome};
use crate::detector::CommandDetector;
use crate::modbus::{ModbusSettings, ModbusTcp};

mod config;
mod controller;
mod detector;
mod hardware;
mod modbus;

#[derive(Parser, Debug)]
#[command(name = "griddle", version, about = "Patty cooking cell controller")]
struct Cli {
    /// Configuration file (defaults to the built-in cell.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Load and validate the configuration, print a summary and exit
    #[arg(long)]
    check_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(cli.verbose >= 2)
        .init();
    trace!("CLI args: {:?}", cli);

    let config = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.check_config {
        print_summary(&config);
        return Ok(());
    }
    debug!("Configuration: {:?}", config);

    let mezzanine =
        hardware::bring_up(&config.hardware).context("Failed to bring up the mezzanine")?;
    info!("Mezzanine ready");

    let bus = ModbusTcp::new(ModbusSettings::from(&config.robot));
    let robot = ActuatorLink::connect(bus, LinkConfig::from(&config.robot)).with_context(|| {
        format!(
            "Failed to connect to robot controller at {}:{}",
            config.robot.address, config.robot.port
        )
    })?;

    let station = Station::new(robot, mezzanine, CommandDetector::new(&config.detector));
    let mut controller = CellController::new(station, &config.recipe, config.control.clone());

    let clock = MonotonicClock::start();
    let outcome = match controller.run(&clock) {
        Ok(outcome) => outcome,
        Err(e) => {
            controller.shutdown(RunOutcome::EmergencyStopped).robot.close();
            return Err(e).context("Failed to start service");
        }
    };
    if outcome == RunOutcome::EmergencyStopped {
        warn!("Service stopped from the panel");
    }

    let mut station = controller.shutdown(outcome);
    station.robot.close();
    info!("Robot session closed");
    Ok(())
}

fn print_summary(config: &CellConfig) {
    println!(
        "robot:    {}:{} unit {} (poll {:?}, completion timeout {})",
        config.robot.address,
        config.robot.port,
        config.robot.unit_id,
        config.robot.poll_interval,
        config
            .robot
            .completion_timeout
            .map_or_else(|| "none".to_string(), |t| format!("{:?}", t)),
    );
    println!(
        "recipe:   flip after {:?}, remove after {:?}, done above {:.1} °C",
        config.recipe.flip_after, config.recipe.remove_after, config.recipe.done_temperature_c
    );
    println!(
        "control:  tick {:?}, keep-alive {:?}",
        config.control.tick_interval, config.control.refresh_interval
    );
    for (name, gpio) in config.hardware.gpio_assignments() {
        println!("gpio:     {:<17} {}", name, gpio);
    }
    println!(
        "detector: {} {}",
        config.detector.command,
        config.detector.args.join(" ")
    );
}
