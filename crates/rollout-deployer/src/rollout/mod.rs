//! Deploy pipeline
//!
//! The sequence is deliberately linear and fail-fast: image check,
//! launch template version bump, fleet repoint, instance refresh,
//! audit record, optional watch. Version creation and the fleet update
//! are not transactional; a created-but-unused version is inert and a
//! re-run picks up cleanly from it.

pub mod monitor;
pub mod record;
pub mod status;

use crate::aws::error::classify_anyhow_error;
use crate::aws::operations::ControlPlaneOps;
use crate::config::DeployConfig;
use crate::error::DeployError;
use chrono::Utc;
use monitor::{RolloutSummary, watch_rollout};
use record::DeploymentRecord;
use std::path::PathBuf;
use tracing::{info, warn};

/// What a deploy run produced.
#[derive(Debug)]
pub struct DeployOutcome {
    /// Template version before this deploy
    pub previous_version: i64,
    /// Freshly created template version
    pub new_version: i64,
    /// Instance refresh id
    pub refresh_id: String,
    /// Where the deployment record landed, if the write succeeded
    pub record_path: Option<PathBuf>,
    /// Present when the run waited for the rollout to finish
    pub rollout: Option<RolloutSummary>,
}

/// Run the whole deploy: validate, cut a template version for the
/// image, repoint the fleet, start the instance refresh, and watch it
/// when configured to.
pub async fn run_deploy(
    ops: &impl ControlPlaneOps,
    config: &DeployConfig,
) -> Result<DeployOutcome, DeployError> {
    config.validate()?;
    let target = &config.target;

    // The image must be fully baked before any version is cut.
    let image_state = ops
        .image_state(&target.image_id)
        .await
        .map_err(|e| access_error(format!("image {}", target.image_id), &e))?;
    if image_state != "available" {
        return Err(DeployError::ImageNotReady {
            image_id: target.image_id.clone(),
            state: image_state,
        });
    }

    let current = ops
        .current_template_version(&target.template_id)
        .await
        .map_err(|e| access_error(format!("launch template {}", target.template_id), &e))?;
    info!(
        template_id = %target.template_id,
        version = current.number,
        image_id = ?current.image_id,
        "Current launch template version"
    );

    let new_version = ops
        .create_template_version(&target.template_id, current.number, &target.image_id)
        .await
        .map_err(|e| creation_error("launch template version", &e))?;
    if new_version <= current.number {
        return Err(DeployError::Creation {
            what: "launch template version",
            reason: format!(
                "platform returned version {new_version}, not greater than current {}",
                current.number
            ),
        });
    }

    ops.point_fleet_at_version(&target.fleet_name, &target.template_id, new_version)
        .await
        .map_err(|e| access_error(format!("auto scaling group {}", target.fleet_name), &e))?;

    // Read-after-write check is advisory only: the update call itself
    // succeeded, so a mismatch is reported but does not abort.
    match ops.fleet_template_version(&target.fleet_name).await {
        Ok(Some(reported)) if reported == new_version.to_string() => {
            info!(
                fleet = %target.fleet_name,
                version = new_version,
                "Fleet launch template version verified"
            );
        }
        Ok(reported) => {
            warn!(
                fleet = %target.fleet_name,
                expected = new_version,
                reported = ?reported,
                "Verification warning: fleet reports a different launch template version"
            );
        }
        Err(e) => {
            warn!(
                fleet = %target.fleet_name,
                error = %format!("{e:#}"),
                "Verification warning: could not read back fleet launch template version"
            );
        }
    }

    let refresh_id = ops
        .start_rollout(&target.fleet_name, &config.rollout)
        .await
        .map_err(|e| creation_error("instance refresh", &e))?;

    let deployment = DeploymentRecord {
        refresh_id: refresh_id.clone(),
        image_id: target.image_id.clone(),
        template_id: target.template_id.clone(),
        template_version: new_version,
        fleet_name: target.fleet_name.clone(),
        deployed_at: Utc::now(),
        project: config.runtime.project.clone(),
        environment: config.runtime.environment.clone(),
        region: config.aws.region.clone(),
    };
    // The refresh is already running; losing the local note must not
    // abort the rollout.
    let record_path = match deployment.write_to(&config.runtime.output_dir) {
        Ok(path) => {
            info!(path = %path.display(), "Deployment record written");
            Some(path)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Could not write deployment record");
            None
        }
    };

    let rollout = if config.runtime.wait {
        let policy = config.poll_policy();
        let fleet: &str = &target.fleet_name;
        let id: &str = &refresh_id;
        let summary =
            watch_rollout(id, &policy, move || ops.rollout_status(fleet, Some(id))).await?;
        Some(summary)
    } else {
        info!(
            refresh_id = %refresh_id,
            "Rollout triggered; not waiting for completion"
        );
        None
    };

    Ok(DeployOutcome {
        previous_version: current.number,
        new_version,
        refresh_id,
        record_path,
        rollout,
    })
}

fn access_error(resource: String, error: &anyhow::Error) -> DeployError {
    let classified = classify_anyhow_error(error);
    let reason = match classified.suggestion() {
        Some(hint) => format!("{classified}. {hint}"),
        None => classified.to_string(),
    };
    DeployError::Access { resource, reason }
}

fn creation_error(what: &'static str, error: &anyhow::Error) -> DeployError {
    let classified = classify_anyhow_error(error);
    let reason = match classified.suggestion() {
        Some(hint) => format!("{classified}. {hint}"),
        None => classified.to_string(),
    };
    DeployError::Creation { what, reason }
}
