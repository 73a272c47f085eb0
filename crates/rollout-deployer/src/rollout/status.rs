//! Instance refresh status vocabulary

use std::fmt;

/// Status of a rolling instance refresh as reported by the platform.
///
/// The platform's status vocabulary is not exhaustively documented, so
/// anything outside the five known values lands in [`Unknown`] and is
/// treated as non-terminal.
///
/// [`Unknown`]: RefreshStatus::Unknown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Created but not started replacing instances yet
    Pending,
    /// Actively replacing instances
    InProgress,
    /// All instances replaced
    Successful,
    /// The refresh gave up (health checks, capacity, ...)
    Failed,
    /// Cancelled by an operator out-of-band
    Cancelled,
    /// Any status string this tool does not recognize
    Unknown(String),
}

impl RefreshStatus {
    /// Parse a platform status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "Pending" => RefreshStatus::Pending,
            "InProgress" => RefreshStatus::InProgress,
            "Successful" => RefreshStatus::Successful,
            "Failed" => RefreshStatus::Failed,
            "Cancelled" => RefreshStatus::Cancelled,
            other => RefreshStatus::Unknown(other.to_string()),
        }
    }

    /// Whether the refresh will never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefreshStatus::Successful | RefreshStatus::Failed | RefreshStatus::Cancelled
        )
    }

    /// Whether this is the terminal success state.
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshStatus::Successful)
    }
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshStatus::Pending => write!(f, "Pending"),
            RefreshStatus::InProgress => write!(f, "InProgress"),
            RefreshStatus::Successful => write!(f, "Successful"),
            RefreshStatus::Failed => write!(f, "Failed"),
            RefreshStatus::Cancelled => write!(f, "Cancelled"),
            RefreshStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(RefreshStatus::parse("Pending"), RefreshStatus::Pending);
        assert_eq!(RefreshStatus::parse("InProgress"), RefreshStatus::InProgress);
        assert_eq!(RefreshStatus::parse("Successful"), RefreshStatus::Successful);
        assert_eq!(RefreshStatus::parse("Failed"), RefreshStatus::Failed);
        assert_eq!(RefreshStatus::parse("Cancelled"), RefreshStatus::Cancelled);
    }

    #[test]
    fn unrecognized_status_is_unknown_and_non_terminal() {
        let status = RefreshStatus::parse("RollbackInProgress");
        assert_eq!(
            status,
            RefreshStatus::Unknown("RollbackInProgress".to_string())
        );
        assert!(!status.is_terminal());
        assert_eq!(status.to_string(), "RollbackInProgress");
    }

    #[test]
    fn terminal_states() {
        assert!(RefreshStatus::Successful.is_terminal());
        assert!(RefreshStatus::Failed.is_terminal());
        assert!(RefreshStatus::Cancelled.is_terminal());
        assert!(!RefreshStatus::Pending.is_terminal());
        assert!(!RefreshStatus::InProgress.is_terminal());
    }

    #[test]
    fn only_successful_is_success() {
        assert!(RefreshStatus::Successful.is_success());
        assert!(!RefreshStatus::Failed.is_success());
        assert!(!RefreshStatus::Cancelled.is_success());
    }
}
