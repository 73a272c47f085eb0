//! Configuration types for the deployer
//!
//! All tunables live in one explicit [`DeployConfig`] value that is
//! passed to the pipeline; components never read configuration from the
//! environment themselves.

use crate::error::DeployError;
use crate::wait::PollPolicy;
use rollout_common::defaults::{
    DEFAULT_CHECKPOINT_DELAY_SECS, DEFAULT_CHECKPOINT_PERCENTAGES, DEFAULT_INSTANCE_WARMUP_SECS,
    DEFAULT_MIN_HEALTHY_PERCENTAGE, ENV_FLEET_NAME, ENV_LAUNCH_TEMPLATE_ID,
};
use std::path::PathBuf;
use std::time::Duration;

/// What to deploy and where.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Machine image (AMI) id to roll out
    pub image_id: String,
    /// Launch template to cut a new version of
    pub template_id: String,
    /// Auto scaling group to refresh
    pub fleet_name: String,
}

/// AWS connection settings.
#[derive(Debug, Clone)]
pub struct AwsSettings {
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub profile: Option<String>,
}

/// Instance refresh policy, forwarded verbatim to the control plane.
/// The deployer does not interpret these numbers.
#[derive(Debug, Clone)]
pub struct RolloutPolicy {
    /// Seconds a fresh instance warms up before counting as healthy
    pub instance_warmup_secs: i32,
    /// Minimum healthy percentage of the group during replacement
    pub min_healthy_percentage: i32,
    /// Seconds to pause at each checkpoint
    pub checkpoint_delay_secs: i32,
    /// Ordered percentages at which the rollout pauses (empty disables
    /// checkpoints)
    pub checkpoint_percentages: Vec<i32>,
}

impl Default for RolloutPolicy {
    fn default() -> Self {
        Self {
            instance_warmup_secs: DEFAULT_INSTANCE_WARMUP_SECS,
            min_healthy_percentage: DEFAULT_MIN_HEALTHY_PERCENTAGE,
            checkpoint_delay_secs: DEFAULT_CHECKPOINT_DELAY_SECS,
            checkpoint_percentages: DEFAULT_CHECKPOINT_PERCENTAGES.to_vec(),
        }
    }
}

/// Runtime behaviour flags.
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    /// Watch the instance refresh until terminal instead of exiting
    /// right after triggering it
    pub wait: bool,
    /// Wall-clock budget for watching, in seconds
    pub timeout_secs: u64,
    /// Seconds between status polls
    pub poll_interval_secs: u64,
    /// Use exponential backoff between polls
    pub exponential_backoff: bool,
    /// Directory the deployment record is written to
    pub output_dir: PathBuf,
    /// Project name for the deployment record
    pub project: String,
    /// Environment name for the deployment record
    pub environment: String,
}

/// Configuration for one deploy run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub target: TargetConfig,
    pub aws: AwsSettings,
    pub rollout: RolloutPolicy,
    pub runtime: RuntimeFlags,
}

impl DeployConfig {
    /// Check required inputs before any AWS call is made.
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.target.image_id.trim().is_empty() {
            return Err(DeployError::Validation(
                "--image-id is required".to_string(),
            ));
        }
        if !self.target.image_id.starts_with("ami-") {
            return Err(DeployError::Validation(format!(
                "'{}' does not look like an image id (expected ami-...)",
                self.target.image_id
            )));
        }
        if self.target.template_id.trim().is_empty() {
            return Err(DeployError::Validation(format!(
                "--template-id is required (or set {ENV_LAUNCH_TEMPLATE_ID})"
            )));
        }
        if self.target.fleet_name.trim().is_empty() {
            return Err(DeployError::Validation(format!(
                "--fleet is required (or set {ENV_FLEET_NAME})"
            )));
        }
        Ok(())
    }

    /// Poll policy for watching the rollout, per the runtime flags.
    pub fn poll_policy(&self) -> PollPolicy {
        let interval = Duration::from_secs(self.runtime.poll_interval_secs);
        let timeout = Duration::from_secs(self.runtime.timeout_secs);
        if self.runtime.exponential_backoff {
            PollPolicy::exponential(interval, Duration::from_secs(120), timeout, 0.25)
        } else {
            PollPolicy::fixed(interval, timeout)
        }
    }
}
