use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ddnsd", version, about = "Dynamic DNS updater for DNSPod")]
pub struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Path to the config.toml file (default: next to the executable)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Launched by the service manager (log to file only)"
    )]
    pub service: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Register ddnsd as a systemd service
    Install,
    /// Unregister the systemd service
    Remove,
    /// Start the installed service
    Start,
    /// Stop the installed service
    Stop,
    /// Run the update loop in the foreground (default)
    Run,
}

impl Cli {
    /// Subcommand to execute, `run` when none was given
    pub fn action(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    /// Whether a human is watching (logs also go to stdout)
    pub fn interactive(&self) -> bool {
        !(self.service && self.action() == Command::Run)
    }
}
