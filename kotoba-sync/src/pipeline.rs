//! Retry rounds layered over [`SyncCoordinator::sync_all`].
//!
//! The coordinator itself never retries. This layer re-invokes it with the
//! identities whose failure is retryable (transport errors, 5xx, 408, 429),
//! backing off exponentially between rounds, and folds every round into one
//! report.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

use kotoba_core::{MirrorConfig, ResourceIdentity};

use crate::coordinator::{SyncCoordinator, SyncReport};

/// How many extra rounds to run and how long to wait before the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_rounds: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_rounds: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_mirror(config: &MirrorConfig) -> Self {
        Self {
            max_rounds: config.retries,
            backoff: config.retry_backoff(),
        }
    }

    /// `backoff * 2^round`, saturating.
    pub fn delay_for_round(&self, round: u32) -> Duration {
        let factor = 1u32.checked_shl(round).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Run one batch plus up to `policy.max_rounds` retry rounds.
pub async fn sync_with_retries(
    coordinator: &SyncCoordinator,
    identities: &[ResourceIdentity],
    policy: RetryPolicy,
) -> SyncReport {
    let (_tx, rx) = watch::channel(false);
    sync_with_retries_until(coordinator, identities, policy, rx).await
}

/// [`sync_with_retries`] that stops as soon as `cancel` flips to `true`.
pub async fn sync_with_retries_until(
    coordinator: &SyncCoordinator,
    identities: &[ResourceIdentity],
    policy: RetryPolicy,
    cancel: watch::Receiver<bool>,
) -> SyncReport {
    let mut report = coordinator
        .sync_all_until(identities, cancelled(cancel.clone()))
        .await;

    for round in 0..policy.max_rounds {
        if *cancel.borrow() {
            break;
        }
        let retry = report.retryable_identities();
        if retry.is_empty() {
            break;
        }

        let delay = policy.delay_for_round(round);
        tracing::info!(
            round = round + 1,
            count = retry.len(),
            delay_ms = delay.as_millis() as u64,
            "retrying failed assets",
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancelled(cancel.clone()) => break,
        }

        let again = coordinator
            .sync_all_until(&retry, cancelled(cancel.clone()))
            .await;
        report.merge(again);
    }

    report
}

/// Resolves once `cancel` reads `true`; never resolves if the sender is gone.
fn cancelled(mut cancel: watch::Receiver<bool>) -> impl Future<Output = ()> {
    async move {
        let sender_gone = cancel.wait_for(|flag| *flag).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    }
}
