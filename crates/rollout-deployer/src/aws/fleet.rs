//! Auto scaling group and instance refresh operations

use crate::aws::context::AwsContext;
use crate::config::RolloutPolicy;
use crate::rollout::monitor::RefreshObservation;
use crate::rollout::status::RefreshStatus;
use anyhow::{Context, Result};
use aws_sdk_autoscaling::types::{LaunchTemplateSpecification, RefreshPreferences};
use tracing::{debug, info};

/// Auto Scaling client for fleet updates and instance refreshes
pub struct FleetClient {
    pub(crate) client: aws_sdk_autoscaling::Client,
}

impl FleetClient {
    /// Create a fleet client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.autoscaling_client(),
        }
    }

    /// Point the group's launch template pointer at a specific version.
    /// The call is a pointer reassignment only; running instances are
    /// untouched until an instance refresh replaces them.
    pub async fn point_fleet_at_version(
        &self,
        fleet: &str,
        template_id: &str,
        version: i64,
    ) -> Result<()> {
        self.client
            .update_auto_scaling_group()
            .auto_scaling_group_name(fleet)
            .launch_template(
                LaunchTemplateSpecification::builder()
                    .launch_template_id(template_id)
                    .version(version.to_string())
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("Failed to update auto scaling group {fleet}"))?;

        info!(
            fleet = %fleet,
            template_id = %template_id,
            version = version,
            "Fleet now launches from the new template version"
        );

        Ok(())
    }

    /// Read back the launch template version string the group currently
    /// reports. `None` when the group has no version pinned.
    pub async fn fleet_template_version(&self, fleet: &str) -> Result<Option<String>> {
        let response = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(fleet)
            .send()
            .await
            .with_context(|| format!("Failed to describe auto scaling group {fleet}"))?;

        let group = response
            .auto_scaling_groups()
            .first()
            .with_context(|| format!("Auto scaling group {fleet} not found"))?;

        Ok(group
            .launch_template()
            .and_then(|lt| lt.version())
            .map(str::to_string))
    }

    /// Start a rolling instance refresh. The policy numbers are
    /// forwarded verbatim; the control plane interprets them.
    pub async fn start_rollout(&self, fleet: &str, policy: &RolloutPolicy) -> Result<String> {
        let mut preferences = RefreshPreferences::builder()
            .instance_warmup(policy.instance_warmup_secs)
            .min_healthy_percentage(policy.min_healthy_percentage);
        if !policy.checkpoint_percentages.is_empty() {
            preferences = preferences
                .checkpoint_delay(policy.checkpoint_delay_secs)
                .set_checkpoint_percentages(Some(policy.checkpoint_percentages.clone()));
        }

        let response = self
            .client
            .start_instance_refresh()
            .auto_scaling_group_name(fleet)
            .preferences(preferences.build())
            .send()
            .await
            .with_context(|| format!("Failed to start instance refresh on {fleet}"))?;

        let refresh_id = response
            .instance_refresh_id()
            .context("StartInstanceRefresh returned no refresh id")?;

        info!(
            fleet = %fleet,
            refresh_id = %refresh_id,
            warmup = policy.instance_warmup_secs,
            min_healthy = policy.min_healthy_percentage,
            checkpoints = ?policy.checkpoint_percentages,
            "Instance refresh started"
        );

        Ok(refresh_id.to_string())
    }

    /// Observe an instance refresh: a specific one by id, or the most
    /// recent one on the group when no id is given. A refresh the
    /// platform has not statused yet reads as `Pending`.
    pub async fn rollout_status(
        &self,
        fleet: &str,
        refresh_id: Option<&str>,
    ) -> Result<RefreshObservation> {
        let mut request = self
            .client
            .describe_instance_refreshes()
            .auto_scaling_group_name(fleet);
        if let Some(id) = refresh_id {
            request = request.instance_refresh_ids(id);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to describe instance refreshes on {fleet}"))?;

        let refresh = response.instance_refreshes().first().with_context(|| {
            match refresh_id {
                Some(id) => format!("Instance refresh {id} not found on {fleet}"),
                None => format!("No instance refreshes found on {fleet}"),
            }
        })?;

        let status = refresh
            .status()
            .map(|s| RefreshStatus::parse(s.as_str()))
            .unwrap_or(RefreshStatus::Pending);

        let observation = RefreshObservation {
            status,
            percent_complete: refresh.percentage_complete(),
            status_reason: refresh.status_reason().map(str::to_string),
        };

        debug!(
            fleet = %fleet,
            status = %observation.status,
            percent = ?observation.percent_complete,
            "Observed instance refresh"
        );

        Ok(observation)
    }
}
