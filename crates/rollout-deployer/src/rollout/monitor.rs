//! Rollout monitoring
//!
//! Polls the instance refresh status until it reaches a terminal state
//! or the wall-clock budget runs out. The status fetch is injected so
//! the loop is testable with scripted sequences and millisecond
//! policies; there is no push-based transition.

use crate::error::DeployError;
use crate::rollout::status::RefreshStatus;
use crate::wait::PollPolicy;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One observation of the rollout from the control plane.
#[derive(Debug, Clone)]
pub struct RefreshObservation {
    pub status: RefreshStatus,
    /// Percentage of instances replaced so far, when reported
    pub percent_complete: Option<i32>,
    /// Platform-provided explanation for the current status
    pub status_reason: Option<String>,
}

/// Summary of a rollout that reached `Successful`.
#[derive(Debug, Clone)]
pub struct RolloutSummary {
    pub refresh_id: String,
    /// Number of status polls performed, including the final one
    pub polls: u32,
    pub elapsed: Duration,
}

/// Watch a rollout until terminal state or timeout.
///
/// `fetch` is called once per poll. On a timeout the refresh itself is
/// left running on the platform; only this monitor gives up watching.
pub async fn watch_rollout<F, Fut>(
    refresh_id: &str,
    policy: &PollPolicy,
    fetch: F,
) -> Result<RolloutSummary, DeployError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<RefreshObservation>>,
{
    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        if start.elapsed() >= policy.timeout {
            warn!(
                refresh_id = %refresh_id,
                polls = polls,
                "Polling budget exhausted; the instance refresh keeps running on AWS"
            );
            return Err(DeployError::Timeout {
                budget_secs: policy.timeout.as_secs(),
            });
        }

        let observation = fetch().await.map_err(|e| DeployError::Access {
            resource: format!("instance refresh {refresh_id}"),
            reason: format!("{e:#}"),
        })?;
        polls += 1;

        match &observation.status {
            RefreshStatus::Successful => {
                info!(
                    refresh_id = %refresh_id,
                    polls = polls,
                    elapsed_secs = start.elapsed().as_secs(),
                    "Rollout completed successfully"
                );
                return Ok(RolloutSummary {
                    refresh_id: refresh_id.to_string(),
                    polls,
                    elapsed: start.elapsed(),
                });
            }
            RefreshStatus::Failed | RefreshStatus::Cancelled => {
                if let Some(reason) = &observation.status_reason {
                    warn!(refresh_id = %refresh_id, reason = %reason, "Rollout ended");
                }
                return Err(DeployError::RolloutFailed {
                    refresh_id: refresh_id.to_string(),
                    status: observation.status.to_string(),
                });
            }
            RefreshStatus::Pending | RefreshStatus::InProgress => {
                debug!(
                    refresh_id = %refresh_id,
                    status = %observation.status,
                    percent = ?observation.percent_complete,
                    "Rollout not finished yet"
                );
            }
            RefreshStatus::Unknown(raw) => {
                warn!(
                    refresh_id = %refresh_id,
                    status = %raw,
                    "Unrecognized rollout status; continuing to poll"
                );
            }
        }

        // Never sleep past the budget; the timeout check above fires on
        // the next iteration.
        let delay = policy.delay_for(polls - 1);
        let remaining = policy.timeout.saturating_sub(start.elapsed());
        tokio::time::sleep(delay.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn observation(status: RefreshStatus) -> RefreshObservation {
        RefreshObservation {
            status,
            percent_complete: None,
            status_reason: None,
        }
    }

    /// Scripted fetch: returns statuses in order, repeating the last one.
    struct Script {
        statuses: Vec<RefreshStatus>,
        calls: AtomicU32,
    }

    impl Script {
        fn new(statuses: Vec<RefreshStatus>) -> Self {
            Self {
                statuses,
                calls: AtomicU32::new(0),
            }
        }

        fn next(&self) -> RefreshObservation {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let index = call.min(self.statuses.len() - 1);
            observation(self.statuses[index].clone())
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn fast_policy(timeout_ms: u64) -> PollPolicy {
        PollPolicy::fixed(
            Duration::from_millis(5),
            Duration::from_millis(timeout_ms),
        )
    }

    #[tokio::test]
    async fn success_after_scripted_sequence_takes_exactly_four_polls() {
        let script = Script::new(vec![
            RefreshStatus::Pending,
            RefreshStatus::InProgress,
            RefreshStatus::InProgress,
            RefreshStatus::Successful,
        ]);

        let script = &script;
        let summary = watch_rollout("refresh-1", &fast_policy(5000), move || async move {
            Ok(script.next())
        })
        .await
        .unwrap();

        assert_eq!(summary.polls, 4);
        assert_eq!(script.calls(), 4);
        assert_eq!(summary.refresh_id, "refresh-1");
    }

    #[tokio::test]
    async fn failed_status_stops_polling_immediately() {
        let script = Script::new(vec![RefreshStatus::InProgress, RefreshStatus::Failed]);

        let script = &script;
        let err = watch_rollout("refresh-2", &fast_policy(5000), move || async move {
            Ok(script.next())
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DeployError::RolloutFailed { ref status, .. } if status == "Failed"
        ));
        assert_eq!(script.calls(), 2);
    }

    #[tokio::test]
    async fn cancelled_is_terminal_failure() {
        let script = Script::new(vec![RefreshStatus::Cancelled]);

        let script = &script;
        let err = watch_rollout("refresh-3", &fast_policy(5000), move || async move {
            Ok(script.next())
        })
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            DeployError::RolloutFailed { ref status, .. } if status == "Cancelled"
        ));
        assert_eq!(script.calls(), 1);
    }

    #[tokio::test]
    async fn never_terminal_times_out_instead_of_hanging() {
        let script = Script::new(vec![RefreshStatus::InProgress]);
        let start = Instant::now();

        let script = &script;
        let err = watch_rollout("refresh-4", &fast_policy(50), move || async move {
            Ok(script.next())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(script.calls() >= 1);
    }

    #[tokio::test]
    async fn unknown_status_keeps_polling_until_terminal() {
        let script = Script::new(vec![
            RefreshStatus::Unknown("RollbackInProgress".to_string()),
            RefreshStatus::Unknown("Baking".to_string()),
            RefreshStatus::Successful,
        ]);

        let script = &script;
        let summary = watch_rollout("refresh-5", &fast_policy(5000), move || async move {
            Ok(script.next())
        })
        .await
        .unwrap();

        assert_eq!(summary.polls, 3);
    }

    #[tokio::test]
    async fn fetch_error_aborts_the_watch() {
        let calls = Mutex::new(0u32);

        let calls = &calls;
        let err = watch_rollout("refresh-6", &fast_policy(5000), move || {
            *calls.lock().unwrap() += 1;
            async { anyhow::bail!("DescribeInstanceRefreshes exploded") }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DeployError::Access { .. }));
        assert!(err.to_string().contains("refresh-6"));
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
