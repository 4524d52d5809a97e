//! # kotoba-sync
//!
//! Incremental mirror of remote assets into a local directory.
//!
//! Build a [`SyncCoordinator`] from a [`SyncConfig`] and an [`AssetFetcher`]
//! (usually [`HttpFetcher`]), then call [`SyncCoordinator::sync_all`]. Each
//! identity is fetched, compared against its local copy by size and mtime
//! ([`freshness`]) and committed atomically only when stale ([`writer`]).
//! [`pipeline`] adds retry rounds on top.

pub mod coordinator;
pub mod error;
pub mod fetcher;
pub mod freshness;
pub mod pipeline;
pub mod writer;

pub use coordinator::{
    FailureReason, ItemReport, SyncConfig, SyncCoordinator, SyncOutcome, SyncReport,
};
pub use error::{FetchError, SyncError};
pub use fetcher::{AssetFetcher, FetchOptions, FetchedAsset, HttpFetcher};
pub use freshness::{is_fresh, Freshness, LocalStamp, StaleReason};
pub use pipeline::RetryPolicy;
