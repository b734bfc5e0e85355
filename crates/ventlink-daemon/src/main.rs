// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use ventlink_config::{load_config, load_config_or_default, validate_config, VentlinkConfig};
use ventlink_control::{ControlWorker, RelayActuator, VentControl};
use ventlink_hal::platforms::{HostClock, HostGpio, HostLink, StaticAddress, TcpSocketProvider};
use ventlink_observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingConfig};
use ventlink_server::{
    relay_channels, NetworkStatus, NetworkSupervisor, ServerConfig, ServerRuntime, SessionPool,
    StartupGate,
};

/// ventlink daemon - multi-client fan control endpoint
#[derive(Parser, Debug)]
#[command(name = "ventlinkd", version, author, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to ventlink.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listening port for every session
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of concurrent sessions
    #[arg(short, long)]
    sessions: Option<usize>,

    /// Interface to bind listeners on
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(port) = self.port {
            overrides.insert("listen_port".to_string(), port.to_string());
        }
        if let Some(sessions) = self.sessions {
            overrides.insert("session_count".to_string(), sessions.to_string());
        }
        if let Some(bind) = &self.bind {
            overrides.insert("bind_host".to_string(), bind.clone());
        }
        if self.verbose {
            overrides.insert("log_level".to_string(), "debug".to_string());
        }
        overrides
    }
}

fn main() -> Result<()> {
    // `--debug-*` flags are read by the logging setup, not by clap
    let args = Args::parse_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));
    let debug_flags = parse_debug_flags();

    let overrides = args.overrides();
    let (config, config_path) = match &args.config {
        Some(path) => (
            load_config(Some(path.as_path()), Some(&overrides))
                .with_context(|| format!("Failed to load {}", path.display()))?,
            Some(path.clone()),
        ),
        None => load_config_or_default(Some(&overrides)).context("Failed to load configuration")?,
    };
    validate_config(&config)?;

    let logging = LoggingConfig {
        level: config.logging.level.clone(),
        log_dir: config.logging.log_dir.clone(),
        file_logging: config.logging.file_logging,
        ..LoggingConfig::default()
    };
    let _log_guard = init_logging(&logging, &debug_flags)?;

    match &config_path {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    run(&config, shutdown)?;

    info!("ventlinkd shutdown complete");
    Ok(())
}

fn run(config: &VentlinkConfig, shutdown: Arc<AtomicBool>) -> Result<()> {
    let server_config = ServerConfig::from_config(config);
    server_config.validate()?;

    let gate = StartupGate::new();
    let network = NetworkStatus::new();
    let (server_endpoint, consumer_endpoint) =
        relay_channels(server_config.queue_capacity, server_config.enqueue_timeout);

    info!(
        "Starting {} sessions on {}:{} (host '{}')",
        server_config.session_count,
        config.network.bind_host,
        server_config.listen_port,
        config.network.hostname
    );

    // Control consumer
    let relay = RelayActuator::new(HostGpio::new(), config.control.relay_pin)?;
    let control = VentControl::new(config.control.initial_speed, relay)?;
    let worker = ControlWorker::spawn(
        control,
        consumer_endpoint,
        Duration::from_millis(config.control.wait_timeout_ms),
        Arc::clone(&shutdown),
    )?;

    // Multiplexer, parked on the startup gate
    let pool = SessionPool::new(
        server_config.clone(),
        TcpSocketProvider::new(config.network.bind_host.clone()),
        HostClock::new(),
        server_endpoint,
    )?;
    let runtime = ServerRuntime::spawn(pool, gate.clone(), network.clone(), Arc::clone(&shutdown))?;

    // Network bring-up releases the gate
    let supervisor = NetworkSupervisor::new(
        HostLink,
        StaticAddress::default(),
        gate,
        network,
        config.network.max_address_retries,
    )
    .spawn(server_config.link_poll_interval, Arc::clone(&shutdown))?;

    info!("ventlinkd running (Press Ctrl+C to stop)...");
    while !shutdown.load(Ordering::Relaxed) {
        if supervisor.is_finished() {
            break;
        }
        if !runtime.is_running() || !worker.is_running() {
            error!("A worker thread exited unexpectedly");
            shutdown.store(true, Ordering::SeqCst);
            break;
        }
        thread::sleep(Duration::from_millis(200));
    }

    let gave_up = !shutdown.load(Ordering::Relaxed);
    shutdown.store(true, Ordering::SeqCst);

    if let Some(pool) = runtime.stop() {
        let stats = pool.stats();
        info!(
            "Multiplexer: {} connections, {} commands forwarded, {} replies sent, {} dropped",
            stats.sessions_opened, stats.frames_forwarded, stats.replies_sent, stats.replies_dropped
        );
    }
    if let Some(control) = worker.stop() {
        info!("Controller: final speed {}", control.speed());
    }
    match supervisor.join() {
        Ok(state) => info!("Supervisor stopped in state {:?}", state),
        Err(_) => warn!("Supervisor thread panicked"),
    }

    if gave_up {
        bail!("Network supervisor gave up; no usable address");
    }
    Ok(())
}
