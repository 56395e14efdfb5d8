use super::training::{run_training_pipeline, TrainingOutcome};
use crate::config::{DeploymentPolicy, PipelineConfig};
use crate::error::Result;
use crate::evaluation::EvaluationMetrics;
use crate::registry::{ArtifactStore, Stage};
use tracing::info;

#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub training: TrainingOutcome,
    /// Version the trained model was registered as
    pub version: u32,
    /// Whether the version was promoted to production
    pub deployed: bool,
    /// Why the version was not promoted
    pub rejection: Option<String>,
}

/// Train, register, and promote to production if the policy allows
pub fn run_deployment_pipeline(
    config: &PipelineConfig,
    store: &dyn ArtifactStore,
) -> Result<DeploymentOutcome> {
    let training = run_training_pipeline(config)?;
    let version = store.register(&config.model_name, &training.model)?;

    let rejection = deployment_trigger(&config.deployment, &training.metrics);
    let deployed = match &rejection {
        None => {
            store.transition(&config.model_name, version, Stage::Production)?;
            true
        }
        Some(reason) => {
            info!(
                model = %config.model_name,
                version,
                reason = %reason,
                "Model kept out of production"
            );
            false
        }
    };

    info!(model = %config.model_name, version, deployed, "Deployment pipeline finished");
    Ok(DeploymentOutcome {
        training,
        version,
        deployed,
        rejection,
    })
}

/// `None` when the metrics clear every gate of the policy
fn deployment_trigger(policy: &DeploymentPolicy, metrics: &EvaluationMetrics) -> Option<String> {
    if !policy.deploy {
        return Some("deployment disabled".to_string());
    }
    if let Some(max_mse) = policy.max_mse {
        if metrics.mse() > max_mse {
            return Some(format!("mse {:.6} above {:.6}", metrics.mse(), max_mse));
        }
    }
    if let Some(min_r2) = policy.min_r_squared {
        if metrics.r_squared() < min_r2 {
            return Some(format!("r_squared {:.6} below {:.6}", metrics.r_squared(), min_r2));
        }
    }
    None
}
