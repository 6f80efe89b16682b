//! DNS failover service binary.
//!
//! Loads configuration, restores monitors from the store, serves the admin
//! API and shuts everything down on SIGINT/SIGTERM.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use clap::Parser;
use notify::RecommendedWatcher;
use tokio::net::TcpListener;
use tokio::sync::watch;

use dns_failover::admin::{setup_admin_router, AdminState};
use dns_failover::alerts::Notifier;
use dns_failover::config::watcher::ConfigWatcher;
use dns_failover::config::{load_config, AppConfig, IntegrationsConfig};
use dns_failover::dns::CloudflareDns;
use dns_failover::engine::Engine;
use dns_failover::failover::{EventLimits, FailoverSink};
use dns_failover::health::NetworkProber;
use dns_failover::lifecycle::{shutdown, signals, startup, Shutdown};
use dns_failover::observability::{logging, metrics};
use dns_failover::store::Store;

#[derive(Parser)]
#[command(name = "dns-failover")]
#[command(about = "Health-checked DNS failover between primary and backup IPs", long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Data file; overrides `store.path`.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Read a new admin login token from stdin, save it and exit.
    #[arg(long)]
    reset_token: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, config_found) = match load_config(&args.config) {
        Ok(config) => (config, true),
        Err(e) if e.is_not_found() => (AppConfig::default(), false),
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config.display());
            return Err(e.into());
        }
    };

    let store_path = args.data.unwrap_or_else(|| PathBuf::from(&config.store.path));
    if args.reset_token {
        let store = Store::open(&store_path)?;
        println!("Enter the new admin token:");
        startup::reset_token(&store, std::io::stdin().lock())?;
        println!("Token saved to {}. Restart the service and log in with it.", store_path.display());
        return Ok(());
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dns-failover starting");
    if !config_found {
        tracing::warn!(path = ?args.config, "Config file not found, using defaults");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(Store::open(&store_path)?);
    startup::seed_monitors(&store, &config.monitors);

    let integrations = Arc::new(ArcSwap::from_pointee(startup::initial_integrations(
        &config, &store,
    )));
    let dns = Arc::new(CloudflareDns::with_accounts(integrations.clone(), store.clone()));
    let failover = Arc::new(FailoverSink::new(
        dns.clone(),
        Arc::new(Notifier::new(integrations.clone())),
        store.clone(),
        EventLimits {
            history: config.store.history_limit,
            ip_down: config.store.ip_down_limit,
        },
    ));

    let shutdown = Shutdown::new();
    let engine = Arc::new(Engine::new(
        Arc::new(NetworkProber::new()),
        failover.clone(),
        shutdown.subscribe(),
    ));
    startup::start_stored_monitors(&engine, &store).await;

    let _watcher = if config_found {
        watch_integrations(
            &args.config,
            integrations.clone(),
            store.clone(),
            shutdown.subscribe(),
        )
    } else {
        None
    };

    let state = AdminState::new(
        engine.clone(),
        store.clone(),
        failover,
        dns,
        integrations,
        &config.server.api_key,
    );
    let timeout = Duration::from_secs(config.server.request_timeout_secs.max(1));
    let app = setup_admin_router(state, timeout);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        auth = !config.server.api_key.is_empty() || store.auth_token().is_some(),
        "Admin API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(signals::shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    shutdown.trigger();
    engine.stop_all().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Swap reloaded DNS and notification settings into the shared config,
/// unless settings were saved through the admin API.
fn watch_integrations(
    path: &Path,
    integrations: Arc<ArcSwap<IntegrationsConfig>>,
    store: Arc<Store>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Option<RecommendedWatcher> {
    let (watcher, mut updates) = ConfigWatcher::new(path);
    let handle = match watcher.run() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
            return None;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(config) = update else { break };
                    if store.integrations().is_some() {
                        tracing::info!("Config file changed; keeping settings saved through the admin API");
                        continue;
                    }
                    let next = config.integrations();
                    if **integrations.load() != next {
                        integrations.store(Arc::new(next));
                        tracing::info!("Integration settings reloaded");
                    }
                }
                _ = shutdown::wait_for(&mut shutdown_rx) => break,
            }
        }
    });

    Some(handle)
}
