mod action;
mod config;
mod display;
mod hotplug;
mod keys;
mod pressure;
mod report;
mod supervisor;
mod usb;
mod vpen;

use std::sync::Arc;

use clap::Parser;

use config::{Cli, Config};
use pressure::PressureTable;
use supervisor::{SessionEnd, Supervisor};

fn main() {
    let cli = Cli::parse();

    if cli.write_default_config {
        let path = config::default_config_target();
        match config::write_default_config(&path) {
            Ok(()) => println!("default config written to {}", path.display()),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let filter = if cli.quiet { "off" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Arc::new(Config::load(cli)?);
    let table = Arc::new(PressureTable::build(
        &config.pressure_curve,
        config.pen.max_pressure,
    )?);

    log::info!(
        "kamvas-pad starting (device {:04x}:{:04x}, virtual name {:?}, pressure table {} entries)",
        config.vendor_id,
        config.product_id,
        config.device_name,
        table.len()
    );

    let supervisor = Arc::new(Supervisor::new(config.clone(), table));
    let watcher = hotplug::spawn_watcher(supervisor.clone(), config.vendor_id, config.product_id);

    match supervisor.start() {
        Ok(SessionEnd::Disconnected) | Ok(SessionEnd::Busy) => {}
        // With a hotplug watcher running, the next bind retries the claim;
        // without one a failed startup is terminal.
        Err(e) if watcher.is_some() => log::error!("{}", e),
        Err(e) => return Err(e),
    }

    if let Some(watcher) = watcher {
        log::info!("waiting for the tablet to be plugged back in");
        watcher.join().map_err(|_| "hotplug watcher panicked")?;
    }

    Ok(())
}
