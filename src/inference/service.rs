//! Background prediction service with an HTTP client

use crate::config::ServiceConfig;
use crate::error::{PipelineError, Result};
use crate::server::{create_router, AppState, PredictionResponse};
use crate::training::ModelPipeline;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A model served on a background task.
///
/// Dropping the handle without [`PredictionService::stop`] leaves the server
/// running until the runtime shuts down.
pub struct PredictionService {
    address: SocketAddr,
    client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PredictionService {
    /// Bind, spawn the server and wait until `/health` answers.
    ///
    /// Fails with [`PipelineError::Service`] if the service is not healthy
    /// within the configured startup timeout.
    pub async fn start(model: Arc<ModelPipeline>, config: &ServiceConfig) -> Result<Self> {
        let bind = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(|e| PipelineError::Service(format!("cannot bind {}: {}", bind, e)))?;
        let address = listener.local_addr()?;

        let app = create_router(Arc::new(AppState::new(model)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                error!(error = %e, "Prediction service stopped with an error");
            }
        });

        let service = Self {
            address,
            client: reqwest::Client::new(),
            shutdown: Some(shutdown_tx),
            task: Some(task),
        };

        let timeout = config.startup_timeout();
        if tokio::time::timeout(timeout, service.wait_until_healthy()).await.is_err() {
            service.stop().await;
            return Err(PipelineError::Service(format!(
                "prediction service not healthy after {}s",
                timeout.as_secs_f64()
            )));
        }

        info!(address = %address, "Prediction service started");
        Ok(service)
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    /// POST a split-orientation payload to `/invocations`
    pub async fn predict(&self, payload: &Value) -> Result<Vec<f64>> {
        let response = self
            .client
            .post(format!("{}/invocations", self.url()))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Service(format!(
                "prediction request failed with {}: {}",
                status, body
            )));
        }

        let body: PredictionResponse = response.json().await?;
        debug!(rows = body.predictions.len(), "Received predictions");
        Ok(body.predictions)
    }

    /// Shut the server down and wait for it to finish
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Prediction service task panicked");
            }
        }
        info!(address = %self.address, "Prediction service stopped");
    }

    async fn wait_until_healthy(&self) {
        let url = format!("{}/health", self.url());
        loop {
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                Ok(resp) => debug!(status = %resp.status(), "Service not ready"),
                Err(e) => debug!(error = %e, "Service not reachable yet"),
            }
            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::sample_payload;
    use crate::registry::test_support::tiny_model;

    fn local_config() -> ServiceConfig {
        ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            startup_timeout_secs: 10,
        }
    }

    #[tokio::test]
    async fn test_start_predict_stop() {
        let service = PredictionService::start(Arc::new(tiny_model()), &local_config())
            .await
            .unwrap();
        assert_ne!(service.address().port(), 0);

        let predictions = service.predict(&sample_payload()).await.unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.is_finite()));

        service.stop().await;
    }

    #[tokio::test]
    async fn test_bad_payload_is_service_error() {
        let service = PredictionService::start(Arc::new(tiny_model()), &local_config())
            .await
            .unwrap();
        let err = service
            .predict(&serde_json::json!({ "data": [[1.0]] }))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Service(_)));
        service.stop().await;
    }
}
