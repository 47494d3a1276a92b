use crate::core::hw::DriverContext;
use crate::core::thermal;
use crate::core::{ControlRequest, Dispatcher};
use crate::platform::{elevation_hint, is_elevated};
use anyhow::{Context, Result};
use colored::Colorize;

/// Runs one request against the local hardware without going through an endpoint.
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let config = super::load_config(matches)?;
    let ctx = DriverContext::native(&config).context("Failed to open hardware access")?;

    let vendor = thermal::detect(ctx.cpuid.as_ref());
    println!("{:<12} {}", "Vendor:".bold(), vendor);

    let dispatcher = Dispatcher::with_serialization(ctx, config.serialize_hardware_access);
    let result = dispatcher.handle(&ControlRequest::get_cpu_temp());

    match result.temperature() {
        Some(temp) => {
            println!("{:<12} {} °C", "Temperature:".bold(), temp);
            Ok(())
        }
        None => {
            eprintln!("{} {}", "Error:".red().bold(), result.status());
            if !is_elevated() {
                eprintln!("{}", elevation_hint());
            }
            std::process::exit(1);
        }
    }
}
