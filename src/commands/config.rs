use crate::core::Config;
use anyhow::Result;
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", sub_matches)) => show(sub_matches),
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        _ => {
            println!("Use 'cputemp config --help' for more information.");
            Ok(())
        }
    }
}

fn show(matches: &clap::ArgMatches) -> Result<()> {
    let config = super::load_config(matches)?;

    println!("{}", "Effective configuration".bold());
    println!("  {:<27} {}", "endpoint_path", config.endpoint_path.display());
    println!("  {:<27} {}", "alias_path", config.alias_path.display());
    println!("  {:<27} {:#o}", "socket_mode", config.socket_mode);
    println!("  {:<27} {}", "msr_cpu", config.msr_cpu);
    println!(
        "  {:<27} {}",
        "serialize_hardware_access", config.serialize_hardware_access
    );
    Ok(())
}
