// # ddnsd - DNSPod DDNS Daemon
//
// Thin integration layer: all update logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Parsing the command line
// 2. Installing the tracing subscriber
// 3. Loading configuration (file + environment)
// 4. Wiring the HTTP resolver and the DNSPod updater into the update service
// 5. Running until SIGTERM/SIGINT, or managing the systemd unit
//
// ## Configuration
//
// Read from `config.toml` next to the executable (or `-c PATH`), then
// overlaid with environment variables:
//
// - `DNSPOD_SECRET_ID`, `DNSPOD_SECRET_KEY`: Tencent Cloud API credentials
// - `DNSPOD_DOMAIN`: Zone, e.g. `example.com`
// - `DNSPOD_RECORDID_IPV4`, `DNSPOD_RECORDID_IPV6`: Records to update
// - `DNSPOD_SUBDOMAIN_IPV4`, `DNSPOD_SUBDOMAIN_IPV6`: Host labels (default `@`)
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DNSPOD_SECRET_ID=AKID...
// export DNSPOD_SECRET_KEY=...
// export DNSPOD_DOMAIN=example.com
// export DNSPOD_RECORDID_IPV4=123456
//
// ddnsd                # foreground
// sudo ddnsd install   # systemd unit
// ```

mod cli;
mod logging;
mod systemd;

use anyhow::Result;
use clap::Parser;
use ddns_core::{AppConfig, Orchestrator, ServiceHooks, UpdatePlan, UpdateService};
use ddns_ip_http::HttpAddressResolver;
use ddns_provider_dnspod::DnspodProvider;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::cli::{Cli, Command};
use crate::systemd::SystemdUnit;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match logging::parse_log_level(std::env::var(logging::LOG_LEVEL_ENV).ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Held until exit so the non-blocking writer flushes
    let _log_guard = match logging::init(&log_level, cli.interactive(), &logging::log_dir()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let code = match cli.action() {
        Command::Install => service_command("install", || {
            systemd::install(&SystemdUnit::for_current_exe(cli.config.as_deref())?)
        }),
        Command::Remove => service_command("remove", systemd::remove),
        Command::Start => service_command("start", systemd::start),
        Command::Stop => service_command("stop", systemd::stop),
        Command::Run => {
            info!("Starting ddnsd daemon");
            run(AppConfig::load(cli.config.as_deref()), cli.interactive())
        }
    };

    code.into()
}

/// Run a service management command, mapping failure to exit code 1
fn service_command(name: &str, action: impl FnOnce() -> Result<()>) -> DdnsExitCode {
    match action() {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e) => {
            error!("Failed to {} service: {:#}", name, e);
            DdnsExitCode::ConfigError
        }
    }
}

/// Run the update service with `config` until a shutdown signal
fn run(config: AppConfig, interactive: bool) -> DdnsExitCode {
    if interactive && !config.is_complete() {
        error!(
            "Critical configuration (SecretID, SecretKey, Domain, and at least one of RecordIDIPv4 or RecordIDIPv6) is missing or incomplete."
        );
        info!("Please ensure configuration is set via config.toml or environment variables.");
        return DdnsExitCode::ConfigError;
    }

    let plan = match config.into_plan() {
        Ok(plan) => plan,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };
    log_plan(&plan);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError;
        }
    };

    rt.block_on(run_service(plan))
}

fn log_plan(plan: &UpdatePlan) {
    info!("Configuration loaded for domain {}", plan.domain);
    for family in ddns_core::traits::AddressFamily::ALL {
        let target = plan.target(family);
        match target.record_id {
            Some(id) => info!(
                "{} record: id={}, subdomain={}",
                target.record_type,
                id,
                target.effective_sub_domain()
            ),
            None => info!("{} record: not configured", target.record_type),
        }
    }
}

/// Start the service, wait for a signal, stop it
async fn run_service(plan: UpdatePlan) -> DdnsExitCode {
    let orchestrator = Orchestrator::new(
        Arc::new(HttpAddressResolver::new()),
        Arc::new(DnspodProvider::new()),
        plan,
    );
    let mut service = UpdateService::new(orchestrator);

    if let Err(e) = service.start().await {
        error!("Failed to start service: {}", e);
        return if e.is_config() {
            DdnsExitCode::ConfigError
        } else {
            DdnsExitCode::RuntimeError
        };
    }

    let mut code = DdnsExitCode::CleanShutdown;
    match wait_for_shutdown().await {
        Ok(signal) => info!("Received shutdown signal: {}", signal),
        Err(e) => {
            error!("Shutdown error: {}", e);
            code = DdnsExitCode::RuntimeError;
        }
    }

    info!("Shutting down daemon");
    if let Err(e) = service.stop().await {
        error!("Failed to stop service: {}", e);
        code = DdnsExitCode::RuntimeError;
    }

    code
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
