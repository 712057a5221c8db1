//! leadboard-server - lead pipeline HTTP service
//!
//! Resolves configuration, opens (or creates) the SQLite database, installs
//! the classifier, and serves the API until Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadboard_common::config::{load_toml_config, resolve_settings, CliOverrides};
use leadboard_common::db::init_database;
use leadboard_server::assessment::{
    AssessmentEngine, Classifier, DisabledClassifier, Instrument, OpenAiClassifier,
};
use leadboard_server::{build_router, AppState};

/// Command-line arguments for leadboard-server
#[derive(Parser, Debug)]
#[command(name = "leadboard-server")]
#[command(about = "Lead pipeline service with questionnaire assessment")]
#[command(version)]
struct Args {
    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    /// Questionnaire instrument (aesthetic or retail)
    #[arg(long)]
    instrument: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;
    let cli = CliOverrides {
        config_file: args.config.clone(),
        database_path: args.database.clone(),
        bind_addr: args.bind.clone(),
        log_level: args.log_level.clone(),
        instrument: args.instrument.clone(),
    };
    let settings = resolve_settings(&cli, toml);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},tower_http=info", settings.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting leadboard-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &cli.config_file {
        info!("Config file: {}", path.display());
    }

    info!("Database path: {}", settings.database_path.display());
    let pool = init_database(&settings.database_path)
        .await
        .context("Failed to initialize database")?;

    let instrument: Instrument = settings
        .instrument
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid assessment instrument")?;

    let classifier: Arc<dyn Classifier> = match OpenAiClassifier::new(&settings.classifier) {
        Ok(client) => {
            info!(
                model = %settings.classifier.model,
                endpoint = %client.endpoint(),
                "Classifier enabled"
            );
            Arc::new(client)
        }
        Err(e) => {
            warn!("Classifier disabled ({}); complete questionnaires will be marked Incomplete", e);
            Arc::new(DisabledClassifier)
        }
    };
    info!(
        instrument = %instrument,
        threshold = instrument.threshold(),
        "Assessment instrument selected"
    );

    if settings.agent_key.is_some() {
        info!("Agent key required on API routes");
    } else {
        info!("Agent key check disabled");
    }

    let engine = AssessmentEngine::new(instrument, classifier);
    let state = AppState::new(pool, engine, settings.agent_key.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.bind_addr))?;
    info!("leadboard-server listening on http://{}", settings.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
