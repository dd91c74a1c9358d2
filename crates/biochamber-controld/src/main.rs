//! BioChamber control daemon

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use biochamber_controld::{
    api::{self, AppState},
    build_store, ControlConfig, ControlCycle, ControlLoop, ProfileHandle, CONTROLD_VERSION,
};
use biochamber_regulator::Regulator;
use biochamber_surrogate::SurrogateCache;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "biochamber_controld=info,biochamber_surrogate=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BioChamber control daemon v{}", CONTROLD_VERSION);

    // Load configuration
    let config = ControlConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let profile = ProfileHandle::new(config.initial_profile()?);
    info!(profile = %profile.snapshot(), "Active profile");
    let store = build_store(&config.store)?;
    info!(store = %store.describe(), backend = ?config.store.backend, "Store ready");

    // The first fit happens before any tick; a training error stops startup
    let surrogate = Arc::new(SurrogateCache::new(config.surrogate.clone()));
    let model = surrogate
        .model(&profile.snapshot())
        .await
        .context("fitting efficiency surrogate")?;
    info!(
        trained_for = %model.info().trained_for,
        trees = model.info().trees,
        "Surrogate fitted"
    );

    let cycle = ControlCycle::new(
        store,
        surrogate.clone(),
        Regulator::new(config.dead_bands),
        profile.clone(),
        config.fallback,
    );
    let control = ControlLoop::new(cycle, config.tick_interval());

    let state = AppState {
        snapshot: control.subscribe(),
        profile,
        surrogate,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let control_task = tokio::spawn(control.run(shutdown_rx));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API listening on {}", addr);
    info!("Endpoints: /health, /api/v1/state, /api/v1/profile, /api/v1/profiles, /api/v1/estimator");

    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    };

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    control_task.await?;
    info!("Shutting down BioChamber control daemon");
    Ok(())
}
