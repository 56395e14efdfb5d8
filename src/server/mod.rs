//! Prediction HTTP service
//!
//! Serves one trained model over three endpoints: `GET /health`,
//! `GET /model` and `POST /invocations`.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::PredictionResponse;
pub use state::AppState;

use crate::config::ServiceConfig;
use crate::training::ModelPipeline;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Serve `model` in the foreground until ctrl+c
pub async fn run_server(model: Arc<ModelPipeline>, config: ServiceConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    let model_id = model.metadata().model_id.clone();
    let app = create_router(Arc::new(AppState::new(model)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        model_id = %model_id,
        pid = std::process::id(),
        "Prediction service listening"
    );

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            return;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Prediction service shut down cleanly");
    Ok(())
}
