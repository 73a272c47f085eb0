//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()`
//! method instead of string matching on Debug format.

use thiserror::Error;

/// AWS error categories the pipeline reacts to
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (wrong id or wrong region)
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Credentials lack a permission for this call
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// An instance refresh is already running on the target group
    #[error("An instance refresh is already running on this auto scaling group")]
    ActiveRolloutInProgress,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a permission problem
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AwsError::AccessDenied { .. })
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AwsError::AccessDenied { .. } => Some(
                "Check the IAM policy of the current credentials; the error message names the denied action".to_string(),
            ),
            AwsError::ActiveRolloutInProgress => Some(
                "Wait for the running instance refresh to finish, or cancel it first".to_string(),
            ),
            AwsError::Throttled => {
                Some("AWS API rate limit hit; re-run in a moment".to_string())
            }
            AwsError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidLaunchTemplateId.NotFound",
    "InvalidLaunchTemplateName.NotFoundException",
    "InvalidLaunchTemplateId.VersionNotFound",
    "InvalidAMIID.NotFound",
];

/// Known AWS error codes for permission problems
const ACCESS_DENIED_CODES: &[&str] = &[
    "UnauthorizedOperation",
    "AccessDenied",
    "AccessDeniedException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            resource_type: "resource",
            resource_id: message.clone(),
        },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some("InstanceRefreshInProgress") => AwsError::ActiveRolloutInProgress,
        // Auto Scaling reports a missing group as a ValidationError
        Some("ValidationError") if message.contains("not found") => AwsError::NotFound {
            resource_type: "auto scaling group",
            resource_id: message.clone(),
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain using `ProvideErrorMetadata` to extract
/// `.code()` and `.message()` from any AWS SDK error. Falls back to
/// string matching on the Debug representation if no typed error is
/// found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> AwsError {
    use aws_sdk_ec2::error::ProvideErrorMetadata;

    macro_rules! try_downcast {
        ($cause:expr, $sdk:ident, $op:ident, $err:ident) => {
            if let Some(e) = $cause.downcast_ref::<$sdk::error::SdkError<
                $sdk::operation::$op::$err,
            >>() {
                let meta = ProvideErrorMetadata::meta(e);
                return classify_aws_error(meta.code(), meta.message());
            }
        };
    }

    for cause in error.chain() {
        // EC2 operations
        try_downcast!(cause, aws_sdk_ec2, describe_images, DescribeImagesError);
        try_downcast!(
            cause,
            aws_sdk_ec2,
            describe_launch_template_versions,
            DescribeLaunchTemplateVersionsError
        );
        try_downcast!(
            cause,
            aws_sdk_ec2,
            create_launch_template_version,
            CreateLaunchTemplateVersionError
        );
        try_downcast!(
            cause,
            aws_sdk_ec2,
            modify_launch_template,
            ModifyLaunchTemplateError
        );
        // Auto Scaling operations
        try_downcast!(
            cause,
            aws_sdk_autoscaling,
            update_auto_scaling_group,
            UpdateAutoScalingGroupError
        );
        try_downcast!(
            cause,
            aws_sdk_autoscaling,
            describe_auto_scaling_groups,
            DescribeAutoScalingGroupsError
        );
        try_downcast!(
            cause,
            aws_sdk_autoscaling,
            start_instance_refresh,
            StartInstanceRefreshError
        );
        try_downcast!(
            cause,
            aws_sdk_autoscaling,
            describe_instance_refreshes,
            DescribeInstanceRefreshesError
        );
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&debug_str));
    }

    AwsError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// All known AWS error codes for extraction from debug strings
const ALL_KNOWN_CODES: &[&str] = &[
    // Not found
    "InvalidLaunchTemplateId.NotFound",
    "InvalidLaunchTemplateName.NotFoundException",
    "InvalidLaunchTemplateId.VersionNotFound",
    "InvalidAMIID.NotFound",
    // Access denied
    "UnauthorizedOperation",
    "AccessDeniedException",
    "AccessDenied",
    // Throttling
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    // Instance refresh
    "InstanceRefreshInProgress",
    // Launch template limits
    "LaunchTemplateVersionLimitExceeded",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in ALL_KNOWN_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "InvalidLaunchTemplateId.NotFound",
        "Check the launch template id and the region.",
    ),
    (
        "InvalidAMIID.NotFound",
        "Check the image id; the AMI may live in a different region.",
    ),
    (
        "LaunchTemplateVersionLimitExceeded",
        "Delete old launch template versions or request a limit increase.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit; re-run in a moment.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit; re-run in a moment.",
    ),
    (
        "RequestLimitExceeded",
        "AWS API rate limit hit; re-run in a moment.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
