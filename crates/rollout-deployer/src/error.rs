//! Deploy pipeline error taxonomy
//!
//! Every variant aborts the whole deploy (fail-fast); the only
//! non-fatal condition, a post-update verification mismatch, is a
//! warning log rather than an error.

use thiserror::Error;

/// Typed failures of the deploy pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required input is missing or malformed
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A resource could not be read or written. Usually a missing
    /// permission or a wrong id.
    #[error("Cannot access {resource}: {reason}")]
    Access { resource: String, reason: String },

    /// The machine image is not in the `available` state yet
    #[error("Image {image_id} is not ready (state: {state}); wait for the image build to finish")]
    ImageNotReady { image_id: String, state: String },

    /// A launch template version or instance refresh could not be created
    #[error("Failed to create {what}: {reason}")]
    Creation { what: &'static str, reason: String },

    /// The polling budget ran out while the rollout was still going.
    /// The instance refresh itself keeps running on the AWS side.
    #[error("Gave up watching rollout after {budget_secs}s; the instance refresh is still running")]
    Timeout { budget_secs: u64 },

    /// The rollout reached a terminal failure state
    #[error("Rollout {refresh_id} ended in terminal state {status}")]
    RolloutFailed { refresh_id: String, status: String },
}

impl DeployError {
    /// Whether the error came from the rollout itself rather than from
    /// the preparation steps (version creation, fleet update).
    pub fn is_rollout_failure(&self) -> bool {
        matches!(
            self,
            DeployError::RolloutFailed { .. } | DeployError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource() {
        let err = DeployError::Access {
            resource: "launch template lt-123".to_string(),
            reason: "UnauthorizedOperation".to_string(),
        };
        assert!(err.to_string().contains("lt-123"));

        let err = DeployError::ImageNotReady {
            image_id: "ami-abc".to_string(),
            state: "pending".to_string(),
        };
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn rollout_failure_classification() {
        assert!(
            DeployError::Timeout { budget_secs: 1800 }.is_rollout_failure()
        );
        assert!(
            DeployError::RolloutFailed {
                refresh_id: "r-1".to_string(),
                status: "Failed".to_string()
            }
            .is_rollout_failure()
        );
        assert!(!DeployError::Validation("x".to_string()).is_rollout_failure());
    }
}
