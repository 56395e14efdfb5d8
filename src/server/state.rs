//! Application state shared across handlers

use crate::training::ModelPipeline;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// The served model is read-only for the lifetime of the server
pub struct AppState {
    pub model: Arc<ModelPipeline>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(model: Arc<ModelPipeline>) -> Self {
        Self {
            model,
            started_at: Utc::now(),
        }
    }
}
