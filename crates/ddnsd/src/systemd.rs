//! systemd integration for `install`, `remove`, `start` and `stop`
//!
//! The unit runs `ddnsd run --service`, so the service manager's Start and
//! Stop map onto process start and SIGTERM.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Unit name registered with systemd
pub const SERVICE_NAME: &str = "ddns-dnspod";

/// Human readable description written into the unit
pub const SERVICE_DESCRIPTION: &str = "Dynamic DNS service for DNSPod";

/// Where the unit file is installed
pub const UNIT_DIR: &str = "/etc/systemd/system";

/// Contents of the unit file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemdUnit {
    /// Absolute path of the ddnsd binary
    pub exec_path: PathBuf,
    /// Config file passed with `-c`
    pub config_path: Option<PathBuf>,
}

impl SystemdUnit {
    /// Build a unit for the running executable
    ///
    /// A relative `config_path` is made absolute against the current
    /// directory, since systemd starts the service elsewhere. Without one,
    /// the default `config.toml` next to the executable is pinned.
    pub fn for_current_exe(config_path: Option<&Path>) -> Result<Self> {
        let exec_path = std::env::current_exe().context("Failed to locate the ddnsd executable")?;

        let config_path = match config_path {
            Some(path) => Some(
                std::path::absolute(path)
                    .with_context(|| format!("Failed to resolve config path {}", path.display()))?,
            ),
            None => ddns_core::config::default_config_path(),
        };

        Ok(Self {
            exec_path,
            config_path,
        })
    }

    /// Path of the installed unit file
    pub fn unit_path() -> PathBuf {
        Path::new(UNIT_DIR).join(format!("{}.service", SERVICE_NAME))
    }

    /// Render the unit file
    pub fn render(&self) -> String {
        let mut exec_start = format!("\"{}\" run --service", self.exec_path.display());
        if let Some(config) = &self.config_path {
            let _ = write!(exec_start, " -c \"{}\"", config.display());
        }

        let working_dir = self
            .exec_path
            .parent()
            .map(|dir| format!("WorkingDirectory={}\n", dir.display()))
            .unwrap_or_default();

        format!(
            "[Unit]\n\
             Description={SERVICE_DESCRIPTION}\n\
             Wants=network-online.target\n\
             After=network-online.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             ExecStart={exec_start}\n\
             {working_dir}\
             Restart=on-failure\n\
             RestartSec=10\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n"
        )
    }
}

fn systemctl(args: &[&str]) -> Result<()> {
    let status = Command::new("systemctl")
        .args(args)
        .status()
        .with_context(|| format!("Failed to run systemctl {}", args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("systemctl {} failed: {}", args.join(" "), status);
    }
    Ok(())
}

/// Write the unit file, reload systemd and enable the service
pub fn install(unit: &SystemdUnit) -> Result<()> {
    let path = SystemdUnit::unit_path();
    std::fs::write(&path, unit.render())
        .with_context(|| format!("Failed to write unit file {}", path.display()))?;
    info!("Wrote unit file {}", path.display());

    systemctl(&["daemon-reload"])?;
    systemctl(&["enable", SERVICE_NAME])?;
    info!("Service {} installed successfully", SERVICE_NAME);
    Ok(())
}

/// Disable the service, delete the unit file and reload systemd
pub fn remove() -> Result<()> {
    if let Err(e) = systemctl(&["disable", "--now", SERVICE_NAME]) {
        warn!("Could not disable {}: {:#}", SERVICE_NAME, e);
    }

    let path = SystemdUnit::unit_path();
    match std::fs::remove_file(&path) {
        Ok(()) => info!("Removed unit file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            anyhow::bail!("Service {} is not installed ({} not found)", SERVICE_NAME, path.display())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to remove unit file {}", path.display()));
        }
    }

    systemctl(&["daemon-reload"])?;
    info!("Service {} removed successfully", SERVICE_NAME);
    Ok(())
}

/// Ask systemd to start the installed service
pub fn start() -> Result<()> {
    systemctl(&["start", SERVICE_NAME])?;
    info!("Service {} started", SERVICE_NAME);
    Ok(())
}

/// Ask systemd to stop the installed service
pub fn stop() -> Result<()> {
    systemctl(&["stop", SERVICE_NAME])?;
    info!("Service {} stopped", SERVICE_NAME);
    Ok(())
}
