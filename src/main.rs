mod api;
mod config;
mod domain;
mod error;
mod optimizer;
mod simulation;
mod telemetry;

use anyhow::Result;
use config::Config;
use simulation::Simulation;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let simulation = Simulation::new(cfg.simulation.clone());
    simulation.spawn_tick_loop();

    let state = api::AppState {
        simulation,
        http_client: reqwest::Client::new(),
    };
    let app = api::router(state);

    let addr = cfg.server.socket_addr()?;
    info!(%addr, "starting charge station controller");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
