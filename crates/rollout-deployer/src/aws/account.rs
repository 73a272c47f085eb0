//! AWS credential preflight
//!
//! The deployer validates credentials with STS before making any
//! mutating call, so a misconfigured environment fails before a launch
//! template version exists.

use anyhow::{Context, Result};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    /// Create an AccountId for testing purposes
    #[cfg(test)]
    pub fn new(s: String) -> Self {
        AccountId(s)
    }
}

/// Fetch the current AWS account ID via STS GetCallerIdentity.
///
/// GetCallerIdentity needs no special permissions, so a failure here
/// means the credentials themselves are absent or invalid rather than
/// under-scoped.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check AWS_PROFILE / credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS credentials validated");

    Ok(AccountId(account.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_display_and_deref() {
        let id = AccountId::new("123456789012".to_string());
        assert_eq!(id.to_string(), "123456789012");
        assert_eq!(id.len(), 12);
    }
}
