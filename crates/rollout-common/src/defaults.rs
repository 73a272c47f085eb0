//! Default configuration values shared between the deployer and the
//! sample application.
//!
//! These constants keep the CLI flags, the env-var fallbacks, and the
//! audit record consistent across components.

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default project name recorded in audit files and reported by the app
pub const DEFAULT_PROJECT: &str = "image-pipeline-poc";

/// Default environment name
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Default interval between rollout status polls, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default wall-clock budget for watching a rollout, in seconds
pub const DEFAULT_ROLLOUT_TIMEOUT_SECS: u64 = 1800;

/// Default instance warm-up before an instance counts as healthy, in seconds
pub const DEFAULT_INSTANCE_WARMUP_SECS: i32 = 300;

/// Default minimum healthy percentage during instance replacement
pub const DEFAULT_MIN_HEALTHY_PERCENTAGE: i32 = 90;

/// Default pause duration at each rollout checkpoint, in seconds
pub const DEFAULT_CHECKPOINT_DELAY_SECS: i32 = 300;

/// Default checkpoint percentages at which the rollout pauses
pub const DEFAULT_CHECKPOINT_PERCENTAGES: &[i32] = &[50, 100];

/// Environment variable fallback for the launch template id
pub const ENV_LAUNCH_TEMPLATE_ID: &str = "LAUNCH_TEMPLATE_ID";

/// Environment variable fallback for the auto scaling group name
pub const ENV_FLEET_NAME: &str = "ASG_NAME";

/// Default listen port for the sample application
pub const DEFAULT_APP_PORT: u16 = 8080;
