use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use cputemp::commands;

fn endpoint_arg() -> Arg {
    Arg::new("endpoint")
        .short('e')
        .long("endpoint")
        .value_name("PATH")
        .help("Socket path of the endpoint (overrides config)")
}

fn cpu_arg() -> Arg {
    Arg::new("cpu")
        .long("cpu")
        .value_name("N")
        .help("Logical CPU whose MSR is read (overrides config)")
}

fn main() -> Result<()> {
    cputemp::init_logging();

    let matches = Command::new("cputemp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reads the CPU die temperature through a privileged service")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file to use instead of the default location"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the privileged temperature service (requires root)")
                .arg(endpoint_arg())
                .arg(
                    Arg::new("alias")
                        .short('a')
                        .long("alias")
                        .value_name("PATH")
                        .help("Public alias (symlink) clients open"),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .value_name("OCTAL")
                        .help("Permission bits for the endpoint socket, e.g. 660"),
                )
                .arg(cpu_arg()),
        )
        .subcommand(
            Command::new("read")
                .about("Ask the running service for the CPU temperature")
                .arg(endpoint_arg()),
        )
        .subcommand(
            Command::new("probe")
                .about("Read the CPU temperature directly, without the service (requires root)")
                .arg(cpu_arg()),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect configuration (use 'cputemp config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show the effective configuration"))
                .subcommand(Command::new("path").about("Show the configuration file location")),
        )
        .subcommand(Command::new("version").about("Shows version information"))
        .get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        #[cfg(unix)]
        Some(("serve", sub_matches)) => commands::serve(sub_matches),
        #[cfg(not(unix))]
        Some(("serve", _)) => anyhow::bail!("The cputemp service requires a Unix platform"),
        Some(("read", sub_matches)) => commands::read(sub_matches),
        Some(("probe", sub_matches)) => commands::probe(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => {
            println!("Use 'cputemp --help' for more information.");
            Ok(())
        }
    }
}
