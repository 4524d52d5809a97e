//! Sync coordinator: fetch a batch of identities concurrently and mirror the
//! stale ones.
//!
//! Per identity the pipeline is strictly sequential:
//! stat local file → fetch → freshness check → (write). Across identities
//! nothing is ordered. A semaphore caps simultaneous pipelines at
//! `concurrency_limit`; results are gathered from a `JoinSet` before the
//! report is returned. Each identity maps to its own local path, so no
//! locking is needed beyond directory creation.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use kotoba_core::{AssetLayout, MirrorConfig, ResourceIdentity};

use crate::error::FetchError;
use crate::fetcher::AssetFetcher;
use crate::freshness::{self, Freshness, LocalStamp};
use crate::writer;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything one coordinator needs; no global state.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory the assets are mirrored into.
    pub base_dir: PathBuf,
    pub concurrency_limit: usize,
    pub mtime_tolerance: Duration,
    pub layout: Arc<dyn AssetLayout>,
}

impl SyncConfig {
    pub fn new(base_dir: impl Into<PathBuf>, layout: Arc<dyn AssetLayout>) -> Self {
        Self {
            base_dir: base_dir.into(),
            concurrency_limit: 8,
            mtime_tolerance: Duration::ZERO,
            layout,
        }
    }

    /// Limits and tolerance from `config`, layout from its `base_url`.
    pub fn from_mirror(config: &MirrorConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            concurrency_limit: config.concurrency_limit,
            mtime_tolerance: config.mtime_tolerance(),
            layout: Arc::new(config.audio_layout()),
        }
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_mtime_tolerance(mut self, tolerance: Duration) -> Self {
        self.mtime_tolerance = tolerance;
        self
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal result for one identity in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local copy was missing or stale and has been rewritten.
    Downloaded,
    /// Local copy already matched the remote descriptor; nothing written.
    SkippedFresh,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Fetch(FetchError),
    /// Local filesystem failure while committing.
    Io(String),
    /// The identity's task panicked.
    Join(String),
    /// The batch was cancelled before this identity finished.
    Cancelled,
}

impl FailureReason {
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureReason::Fetch(err) => err.is_retryable(),
            FailureReason::Io(_) | FailureReason::Join(_) | FailureReason::Cancelled => false,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Fetch(err) => err.fmt(f),
            FailureReason::Io(msg) => write!(f, "write failed: {msg}"),
            FailureReason::Join(msg) => write!(f, "task failed: {msg}"),
            FailureReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// One line of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub identity: ResourceIdentity,
    pub local_path: PathBuf,
    pub outcome: SyncOutcome,
}

/// Outcome of one batch: exactly one item per distinct input identity, in
/// first-seen input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub items: Vec<ItemReport>,
}

impl SyncReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Downloaded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::SkippedFresh))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ItemReport, &FailureReason)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            SyncOutcome::Failed(reason) => Some((item, reason)),
            _ => None,
        })
    }

    /// Identities worth handing to another `sync_all` call.
    pub fn retryable_identities(&self) -> Vec<ResourceIdentity> {
        self.failures()
            .filter(|(_, reason)| reason.is_retryable())
            .map(|(item, _)| item.identity.clone())
            .collect()
    }

    /// Overwrite items with the outcome from a later run of the same identity.
    pub fn merge(&mut self, later: SyncReport) {
        for item in later.items {
            match self.items.iter_mut().find(|i| i.identity == item.identity) {
                Some(existing) => *existing = item,
                None => self.items.push(item),
            }
        }
    }

    pub fn outcome_of(&self, identity: &ResourceIdentity) -> Option<&SyncOutcome> {
        self.items
            .iter()
            .find(|i| &i.identity == identity)
            .map(|i| &i.outcome)
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct SyncCoordinator {
    fetcher: Arc<dyn AssetFetcher>,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(fetcher: Arc<dyn AssetFetcher>, config: SyncConfig) -> Self {
        Self { fetcher, config }
    }

    /// Mirror every identity; never fails as a whole.
    pub async fn sync_all(&self, identities: &[ResourceIdentity]) -> SyncReport {
        self.sync_all_until(identities, std::future::pending()).await
    }

    /// [`Self::sync_all`], abandoning unfinished identities once `shutdown`
    /// resolves. Abandoned identities are reported as
    /// [`FailureReason::Cancelled`].
    pub async fn sync_all_until<S>(&self, identities: &[ResourceIdentity], shutdown: S) -> SyncReport
    where
        S: Future<Output = ()>,
    {
        let started = Instant::now();
        let batch = dedup(identities);
        let paths: Vec<PathBuf> = batch
            .iter()
            .map(|id| self.config.layout.local_path(&self.config.base_dir, id))
            .collect();

        tracing::info!(
            count = batch.len(),
            base_dir = %self.config.base_dir.display(),
            concurrency = self.config.concurrency_limit,
            "starting asset sync",
        );

        let permits = self.config.concurrency_limit.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();
        for (index, (identity, path)) in batch.iter().zip(&paths).enumerate() {
            let semaphore = semaphore.clone();
            let fetcher = self.fetcher.clone();
            let identity = identity.clone();
            let path = path.clone();
            let tolerance = self.config.mtime_tolerance;
            tasks.spawn(async move {
                // The semaphore is never closed, so acquire only fails if it were.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = sync_one(fetcher.as_ref(), &identity, path, tolerance).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<SyncOutcome>> = vec![None; batch.len()];
        let mut panic_message = None;
        let mut cancelled = false;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown, if !cancelled => {
                    tracing::warn!("sync cancelled; abandoning in-flight fetches");
                    cancelled = true;
                    tasks.abort_all();
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((index, outcome))) => slots[index] = Some(outcome),
                    Some(Err(err)) if err.is_cancelled() => {}
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "sync task failed");
                        panic_message = Some(err.to_string());
                    }
                },
            }
        }

        let items: Vec<ItemReport> = batch
            .into_iter()
            .zip(paths)
            .zip(slots)
            .map(|((identity, local_path), slot)| {
                let outcome = slot.unwrap_or_else(|| {
                    SyncOutcome::Failed(if cancelled {
                        FailureReason::Cancelled
                    } else {
                        FailureReason::Join(
                            panic_message
                                .clone()
                                .unwrap_or_else(|| "task ended without an outcome".to_owned()),
                        )
                    })
                });
                ItemReport {
                    identity,
                    local_path,
                    outcome,
                }
            })
            .collect();

        let report = SyncReport { items };
        tracing::info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "asset sync finished",
        );
        report
    }
}

/// Keep the first occurrence of each identity so none is fetched twice.
fn dedup(identities: &[ResourceIdentity]) -> Vec<ResourceIdentity> {
    let mut seen = HashSet::new();
    identities
        .iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

async fn sync_one(
    fetcher: &dyn AssetFetcher,
    identity: &ResourceIdentity,
    path: PathBuf,
    tolerance: Duration,
) -> SyncOutcome {
    // Snapshot the local file before this run touches it.
    let stat_path = path.clone();
    let local = match tokio::task::spawn_blocking(move || LocalStamp::read(&stat_path)).await {
        Ok(Ok(stamp)) => stamp,
        Ok(Err(err)) => {
            tracing::debug!(identity = %identity, error = %err, "local stat failed; treating as absent");
            None
        }
        Err(err) => return SyncOutcome::Failed(FailureReason::Join(err.to_string())),
    };

    let asset = match fetcher.fetch(identity).await {
        Ok(asset) => asset,
        Err(err) => {
            tracing::warn!(identity = %identity, error = %err, "could not download");
            return SyncOutcome::Failed(FailureReason::Fetch(err));
        }
    };

    match freshness::check(local.as_ref(), &asset.descriptor, tolerance) {
        Freshness::Fresh => {
            tracing::debug!(identity = %identity, path = %path.display(), "already downloaded");
            return SyncOutcome::SkippedFresh;
        }
        Freshness::Stale(reason) => {
            tracing::info!(identity = %identity, path = %path.display(), %reason, "downloading");
        }
    }

    let committed = tokio::task::spawn_blocking(move || {
        writer::commit(&path, &asset.bytes, &asset.descriptor)
    })
    .await;
    match committed {
        Ok(Ok(())) => SyncOutcome::Downloaded,
        Ok(Err(err)) => {
            tracing::warn!(identity = %identity, error = %err, "could not write");
            SyncOutcome::Failed(FailureReason::Io(err.to_string()))
        }
        Err(err) => SyncOutcome::Failed(FailureReason::Join(err.to_string())),
    }
}
