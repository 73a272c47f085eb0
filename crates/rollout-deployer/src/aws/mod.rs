//! AWS client modules for the deployer
//!
//! This module wraps the AWS SDK clients the pipeline needs:
//! - EC2: machine image state, launch template versions
//! - Auto Scaling: fleet launch template pointer, instance refresh
//! - STS: caller identity preflight

pub mod account;
pub mod context;
pub mod ec2;
pub mod error;
pub mod fleet;
pub mod operations;

pub use account::{AccountId, get_current_account_id};
pub use context::AwsContext;
pub use ec2::{Ec2Client, TemplateVersion};
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
pub use fleet::FleetClient;
pub use operations::{ControlPlane, ControlPlaneOps};
