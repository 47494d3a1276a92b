use crate::core::hw::DriverContext;
use crate::core::{Dispatcher, Endpoint, EndpointConfig};
use crate::platform::{elevation_hint, is_elevated};
use anyhow::{Context, Result};
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let config = super::load_config(matches)?;

    if !is_elevated() {
        log::warn!("Not running elevated; hardware reads will likely fail");
        println!("{} {}", "Warning:".yellow().bold(), elevation_hint());
    }

    let ctx = DriverContext::native(&config).context("Failed to open hardware access")?;
    let dispatcher = Dispatcher::with_serialization(ctx, config.serialize_hardware_access);

    let endpoint = Endpoint::create(&EndpointConfig::from(&config))
        .context("Failed to create endpoint")?;

    let shutdown = endpoint.shutdown_handle();
    ctrlc::set_handler(move || {
        log::info!("Stop requested");
        shutdown.shutdown();
    })
    .context("Failed to install signal handler")?;

    println!(
        "{} {}",
        "Serving CPU temperature on".green(),
        config.client_path().display()
    );

    endpoint.serve(&dispatcher)?;

    // endpoint and alias are removed when `endpoint` drops
    drop(endpoint);
    println!("Stopped.");
    Ok(())
}
