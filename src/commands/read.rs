use anyhow::Result;

#[cfg(unix)]
pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    use crate::core::client::{self, ClientError};
    use colored::Colorize;

    let config = super::load_config(matches)?;
    let path = config.client_path();

    match client::query_temperature(path) {
        Ok(temp) => {
            println!("CPU Temperature: {} °C", temp);
            Ok(())
        }
        Err(e) => {
            log::debug!("Query of {:?} failed: {:?}", path, e);
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let ClientError::AccessDenied { path } = &e {
                eprintln!("  (endpoint: {})", path.display());
            }
            std::process::exit(1);
        }
    }
}

#[cfg(not(unix))]
pub fn execute(_matches: &clap::ArgMatches) -> Result<()> {
    anyhow::bail!("The cputemp client requires a Unix platform")
}
