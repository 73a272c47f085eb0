//! Machine image and launch template operations

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::RequestLaunchTemplateData;
use tracing::{debug, info};

/// A launch template's current default version.
#[derive(Debug, Clone)]
pub struct TemplateVersion {
    /// Monotonic version number
    pub number: i64,
    /// Image id the version references, if any
    pub image_id: Option<String>,
}

/// EC2 client for image and launch template queries
pub struct Ec2Client {
    pub(crate) client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// Report the availability state of a machine image
    /// (`available`, `pending`, `failed`, ...).
    pub async fn image_state(&self, image_id: &str) -> Result<String> {
        let response = self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
            .with_context(|| format!("Failed to describe image {image_id}"))?;

        let image = response
            .images()
            .first()
            .with_context(|| format!("Image {image_id} not found in this region"))?;

        let state = image
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        debug!(image_id = %image_id, state = %state, "Described image");

        Ok(state)
    }

    /// Read the default version of a launch template.
    pub async fn current_template_version(&self, template_id: &str) -> Result<TemplateVersion> {
        let response = self
            .client
            .describe_launch_template_versions()
            .launch_template_id(template_id)
            .versions("$Default")
            .send()
            .await
            .with_context(|| format!("Failed to describe launch template {template_id}"))?;

        let version = response
            .launch_template_versions()
            .first()
            .with_context(|| format!("Launch template {template_id} has no default version"))?;

        let number = version
            .version_number()
            .with_context(|| format!("Launch template {template_id} returned no version number"))?;

        let image_id = version
            .launch_template_data()
            .and_then(|data| data.image_id())
            .map(str::to_string);

        debug!(
            template_id = %template_id,
            version = number,
            image_id = ?image_id,
            "Read current launch template version"
        );

        Ok(TemplateVersion { number, image_id })
    }

    /// Create a new launch template version from `source_version` with
    /// only the image id overridden, and promote it to the default
    /// version so later `$Default` reads see it. All other launch
    /// parameters are inherited from the source version.
    pub async fn create_template_version(
        &self,
        template_id: &str,
        source_version: i64,
        image_id: &str,
    ) -> Result<i64> {
        let data = RequestLaunchTemplateData::builder()
            .image_id(image_id)
            .build();

        let response = self
            .client
            .create_launch_template_version()
            .launch_template_id(template_id)
            .source_version(source_version.to_string())
            .launch_template_data(data)
            .version_description(format!("image {image_id}"))
            .send()
            .await
            .with_context(|| {
                format!("Failed to create a new version of launch template {template_id}")
            })?;

        let number = response
            .launch_template_version()
            .and_then(|v| v.version_number())
            .context("CreateLaunchTemplateVersion returned no version number")?;

        self.client
            .modify_launch_template()
            .launch_template_id(template_id)
            .default_version(number.to_string())
            .send()
            .await
            .with_context(|| {
                format!("Failed to set default version {number} on launch template {template_id}")
            })?;

        info!(
            template_id = %template_id,
            version = number,
            image_id = %image_id,
            "Created launch template version"
        );

        Ok(number)
    }
}
