// Command handlers module
pub mod config;
pub mod probe;
pub mod read;
#[cfg(unix)]
pub mod serve;
pub mod version;

use crate::core::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;

// Re-exports for cleaner imports
pub use probe::execute as probe;
pub use read::execute as read;
#[cfg(unix)]
pub use serve::execute as serve;
pub use version::execute as version;

/// Loads the configuration file and applies command line overrides.
pub fn load_config(matches: &clap::ArgMatches) -> Result<Config> {
    let mut config = match matches.try_get_one::<String>("config").ok().flatten() {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    if let Some(path) = get_arg(matches, "endpoint") {
        config.endpoint_path = PathBuf::from(path);
    }
    if let Some(path) = get_arg(matches, "alias") {
        config.alias_path = PathBuf::from(path);
    }
    if let Some(mode) = get_arg(matches, "mode") {
        config.socket_mode = parse_mode(mode)?;
    }
    if let Some(cpu) = get_arg(matches, "cpu") {
        config.msr_cpu = cpu
            .parse()
            .with_context(|| format!("Invalid CPU index: {}", cpu))?;
    }

    Ok(config)
}

/// Parses permission bits written in octal, with or without a `0o` prefix.
pub fn parse_mode(mode: &str) -> Result<u32> {
    let digits = mode.trim_start_matches("0o");
    let value = u32::from_str_radix(digits, 8)
        .with_context(|| format!("Invalid octal mode: {}", mode))?;
    if value > 0o777 {
        anyhow::bail!("Mode out of range: {}", mode);
    }
    Ok(value)
}

// Arguments are optional per subcommand, so absent ids are not an error
fn get_arg<'a>(matches: &'a clap::ArgMatches, id: &str) -> Option<&'a String> {
    matches.try_get_one::<String>(id).ok().flatten()
}
