//! domain-hq: WebFinger discovery and OpenPGP public key directory for a
//! single domain.

use std::path::PathBuf;

use axum::{extract::Request, ServiceExt};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use domain_hq::api::{create_app, AppState};
use domain_hq::config::{Config, LogFormat, Overrides};
use domain_hq::{KeyStore, SqliteBackend};

#[derive(Parser)]
#[command(name = "domain-hq")]
#[command(about = "WebFinger discovery and OpenPGP public key directory")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "DOMAIN_HQ_CONFIG", default_value = "domain-hq.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(Some(cli.config.as_path()), &cli.overrides)?;
    let generated_key = config.ensure_api_key();
    config.validate()?;

    init_tracing(&config)?;

    info!("Starting domain-hq");
    info!("Config file: {}", cli.config.display());
    info!("WebFinger domain: {}", config.webfinger.domain);
    info!("Issuer: {}", config.webfinger.resource);
    info!("Lookup format: {}", config.keyserver.lookup_format);

    if let Some(key) = generated_key {
        warn!(api_key = %key, "no API key configured, generated one for this run");
    }

    let backend = if config.in_memory_storage() {
        info!("Database: in-memory");
        SqliteBackend::open_in_memory()?
    } else {
        info!("Database: {}", config.storage.database.display());
        SqliteBackend::open(&config.storage.database)?
    };
    let store = KeyStore::new(backend, config.keyserver.fingerprint_prefix.clone());
    info!("Fingerprint prefix: {}", store.fingerprint_prefix());
    info!(keys = store.count()?, "key store ready");

    let app = create_app(AppState::new(store, &config));

    let addr = config.listen_socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "domain_hq={level},tower_http={level}",
            level = config.log.level.to_lowercase()
        ))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
