//! rollout-deployer: roll a freshly built machine image out to an auto
//! scaling group by cutting a launch template version and starting a
//! managed instance refresh.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rollout_common::defaults::{
    DEFAULT_CHECKPOINT_DELAY_SECS, DEFAULT_CHECKPOINT_PERCENTAGES, DEFAULT_ENVIRONMENT,
    DEFAULT_INSTANCE_WARMUP_SECS, DEFAULT_MIN_HEALTHY_PERCENTAGE, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_PROJECT, DEFAULT_REGION, DEFAULT_ROLLOUT_TIMEOUT_SECS, ENV_FLEET_NAME,
    ENV_LAUNCH_TEMPLATE_ID,
};
use rollout_deployer::aws::{AwsContext, ControlPlane, FleetClient, get_current_account_id};
use rollout_deployer::config::{
    AwsSettings, DeployConfig, RolloutPolicy, RuntimeFlags, TargetConfig,
};
use rollout_deployer::rollout;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rollout-deployer")]
#[command(about = "AMI rollout via launch template versioning and ASG instance refresh")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the deploy command
#[derive(clap::Args, Debug)]
struct DeployArgs {
    /// Machine image (AMI) to deploy
    #[arg(short = 'i', long)]
    image_id: Option<String>,

    /// Launch template to cut a new version of
    #[arg(short = 't', long, env = ENV_LAUNCH_TEMPLATE_ID)]
    template_id: Option<String>,

    /// Auto scaling group to refresh
    #[arg(short = 'f', long = "fleet", env = ENV_FLEET_NAME)]
    fleet: Option<String>,

    /// AWS region
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Project name recorded in the deployment record
    #[arg(long, default_value = DEFAULT_PROJECT)]
    project: String,

    /// Environment name recorded in the deployment record
    #[arg(long, default_value = DEFAULT_ENVIRONMENT)]
    environment: String,

    /// Wait for the instance refresh to finish instead of exiting after
    /// triggering it
    #[arg(long)]
    wait: bool,

    /// Wall-clock budget when waiting, in seconds
    #[arg(long, default_value_t = DEFAULT_ROLLOUT_TIMEOUT_SECS)]
    timeout: u64,

    /// Seconds between status polls
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    poll_interval: u64,

    /// Use exponential backoff between polls instead of a fixed interval
    #[arg(long)]
    backoff: bool,

    /// Seconds a fresh instance warms up before counting as healthy
    #[arg(long, default_value_t = DEFAULT_INSTANCE_WARMUP_SECS)]
    instance_warmup: i32,

    /// Minimum healthy percentage of the group during replacement
    #[arg(long, default_value_t = DEFAULT_MIN_HEALTHY_PERCENTAGE)]
    min_healthy_percentage: i32,

    /// Seconds to pause at each checkpoint
    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_DELAY_SECS)]
    checkpoint_delay: i32,

    /// Comma-separated checkpoint percentages at which the rollout pauses
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_CHECKPOINT_PERCENTAGES.iter().copied())]
    checkpoint_percentages: Vec<i32>,

    /// Directory for the deployment record
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl From<DeployArgs> for DeployConfig {
    fn from(args: DeployArgs) -> Self {
        Self {
            target: TargetConfig {
                image_id: args.image_id.unwrap_or_default(),
                template_id: args.template_id.unwrap_or_default(),
                fleet_name: args.fleet.unwrap_or_default(),
            },
            aws: AwsSettings {
                region: args.region,
                profile: args.aws_profile,
            },
            rollout: RolloutPolicy {
                instance_warmup_secs: args.instance_warmup,
                min_healthy_percentage: args.min_healthy_percentage,
                checkpoint_delay_secs: args.checkpoint_delay,
                checkpoint_percentages: args.checkpoint_percentages,
            },
            runtime: RuntimeFlags {
                wait: args.wait,
                timeout_secs: args.timeout,
                poll_interval_secs: args.poll_interval,
                exponential_backoff: args.backoff,
                output_dir: args.output_dir,
                project: args.project,
                environment: args.environment,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut a launch template version for an image and refresh the fleet
    Deploy(Box<DeployArgs>),

    /// Show the status of an instance refresh
    Status {
        /// Auto scaling group to inspect
        #[arg(short = 'f', long = "fleet", env = ENV_FLEET_NAME)]
        fleet: Option<String>,

        /// Specific refresh id (most recent refresh when omitted)
        #[arg(long)]
        refresh_id: Option<String>,

        /// AWS region
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,

        /// AWS profile to use (overrides AWS_PROFILE env var)
        #[arg(long)]
        aws_profile: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Deploy(args) => handle_deploy(*args).await,
        Command::Status {
            fleet,
            refresh_id,
            region,
            aws_profile,
        } => handle_status(fleet, refresh_id, region, aws_profile).await,
    }
}

async fn handle_deploy(args: DeployArgs) -> Result<()> {
    let config: DeployConfig = args.into();
    // Bad input must fail before any AWS round trip is made.
    config.validate()?;

    let ctx = AwsContext::with_profile(&config.aws.region, config.aws.profile.as_deref()).await;
    let account = get_current_account_id(ctx.sdk_config()).await?;
    info!(
        account = %account,
        region = %config.aws.region,
        image_id = %config.target.image_id,
        fleet = %config.target.fleet_name,
        "Starting deploy"
    );

    let ops = ControlPlane::from_context(&ctx);
    let outcome = rollout::run_deploy(&ops, &config).await?;

    match &outcome.rollout {
        Some(summary) => {
            println!(
                "Rollout {} completed: template version {} -> {} in {}s ({} polls)",
                summary.refresh_id,
                outcome.previous_version,
                outcome.new_version,
                summary.elapsed.as_secs(),
                summary.polls,
            );
        }
        None => {
            println!(
                "Rollout {} triggered: template version {} -> {} (not waiting)",
                outcome.refresh_id, outcome.previous_version, outcome.new_version,
            );
        }
    }

    Ok(())
}

async fn handle_status(
    fleet: Option<String>,
    refresh_id: Option<String>,
    region: String,
    aws_profile: Option<String>,
) -> Result<()> {
    let fleet = fleet
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("--fleet is required (or set ASG_NAME)"))?;

    let ctx = AwsContext::with_profile(&region, aws_profile.as_deref()).await;
    let client = FleetClient::from_context(&ctx);
    let observation = client.rollout_status(&fleet, refresh_id.as_deref()).await?;

    println!("fleet:   {fleet}");
    println!("status:  {}", observation.status);
    if let Some(percent) = observation.percent_complete {
        println!("percent: {percent}%");
    }
    if let Some(reason) = &observation.status_reason {
        println!("reason:  {reason}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy_args() -> DeployArgs {
        DeployArgs {
            image_id: Some("ami-0123456789abcdef0".to_string()),
            template_id: Some("lt-0fedcba9876543210".to_string()),
            fleet: Some("web-fleet".to_string()),
            region: DEFAULT_REGION.to_string(),
            aws_profile: None,
            project: DEFAULT_PROJECT.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            wait: false,
            timeout: DEFAULT_ROLLOUT_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
            backoff: false,
            instance_warmup: DEFAULT_INSTANCE_WARMUP_SECS,
            min_healthy_percentage: DEFAULT_MIN_HEALTHY_PERCENTAGE,
            checkpoint_delay: DEFAULT_CHECKPOINT_DELAY_SECS,
            checkpoint_percentages: DEFAULT_CHECKPOINT_PERCENTAGES.to_vec(),
            output_dir: PathBuf::from("."),
        }
    }

    // Finishes without credentials or network only because the input
    // check runs before the AWS context is loaded.
    #[tokio::test]
    async fn deploy_rejects_missing_image_id_before_touching_aws() {
        let mut args = deploy_args();
        args.image_id = None;

        let err = handle_deploy(args).await.unwrap_err();

        assert!(err.to_string().contains("--image-id"));
    }

    #[tokio::test]
    async fn deploy_rejects_malformed_image_id_before_touching_aws() {
        let mut args = deploy_args();
        args.image_id = Some("snap-0123".to_string());

        let err = handle_deploy(args).await.unwrap_err();

        assert!(err.to_string().contains("snap-0123"));
    }
}
