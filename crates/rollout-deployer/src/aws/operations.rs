//! Control plane operations trait for testing

use super::context::AwsContext;
use super::ec2::{Ec2Client, TemplateVersion};
use super::fleet::FleetClient;
use crate::config::RolloutPolicy;
use crate::rollout::monitor::RefreshObservation;
use anyhow::Result;
use std::future::Future;

/// Trait over every control-plane round trip the deploy pipeline makes.
///
/// This abstracts the EC2 and Auto Scaling clients so orchestration
/// logic can be unit tested without hitting real AWS.
pub trait ControlPlaneOps: Send + Sync {
    /// Availability state of a machine image
    fn image_state(&self, image_id: &str) -> impl Future<Output = Result<String>> + Send;

    /// Current default version of a launch template
    fn current_template_version(
        &self,
        template_id: &str,
    ) -> impl Future<Output = Result<TemplateVersion>> + Send;

    /// Create a new template version with the image id overridden
    fn create_template_version(
        &self,
        template_id: &str,
        source_version: i64,
        image_id: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Point the fleet's launch template pointer at a version
    fn point_fleet_at_version(
        &self,
        fleet: &str,
        template_id: &str,
        version: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Launch template version string the fleet currently reports
    fn fleet_template_version(
        &self,
        fleet: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Start an instance refresh and return its id
    fn start_rollout(
        &self,
        fleet: &str,
        policy: &RolloutPolicy,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Observe an instance refresh (latest when `refresh_id` is None)
    fn rollout_status(
        &self,
        fleet: &str,
        refresh_id: Option<&str>,
    ) -> impl Future<Output = Result<RefreshObservation>> + Send;
}

/// Real control plane: EC2 + Auto Scaling clients.
pub struct ControlPlane {
    pub ec2: Ec2Client,
    pub fleet: FleetClient,
}

impl ControlPlane {
    /// Build both clients from one loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            ec2: Ec2Client::from_context(ctx),
            fleet: FleetClient::from_context(ctx),
        }
    }
}

impl ControlPlaneOps for ControlPlane {
    async fn image_state(&self, image_id: &str) -> Result<String> {
        self.ec2.image_state(image_id).await
    }

    async fn current_template_version(&self, template_id: &str) -> Result<TemplateVersion> {
        self.ec2.current_template_version(template_id).await
    }

    async fn create_template_version(
        &self,
        template_id: &str,
        source_version: i64,
        image_id: &str,
    ) -> Result<i64> {
        self.ec2
            .create_template_version(template_id, source_version, image_id)
            .await
    }

    async fn point_fleet_at_version(
        &self,
        fleet: &str,
        template_id: &str,
        version: i64,
    ) -> Result<()> {
        self.fleet
            .point_fleet_at_version(fleet, template_id, version)
            .await
    }

    async fn fleet_template_version(&self, fleet: &str) -> Result<Option<String>> {
        self.fleet.fleet_template_version(fleet).await
    }

    async fn start_rollout(&self, fleet: &str, policy: &RolloutPolicy) -> Result<String> {
        self.fleet.start_rollout(fleet, policy).await
    }

    async fn rollout_status(
        &self,
        fleet: &str,
        refresh_id: Option<&str>,
    ) -> Result<RefreshObservation> {
        self.fleet.rollout_status(fleet, refresh_id).await
    }
}
