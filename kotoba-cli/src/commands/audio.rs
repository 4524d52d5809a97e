//! `kotoba audio`: mirror each level's audio into `media/`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::sync::watch;

use kotoba_catalog::{identities, CatalogClient, CatalogQuery};
use kotoba_core::{AssetLayout, LanguageId, LevelId, MirrorConfig};
use kotoba_sync::{
    pipeline, AssetFetcher, FetchOptions, HttpFetcher, RetryPolicy, SyncConfig, SyncCoordinator,
    SyncReport,
};

use super::{load_config, pick_levels};

/// Audio assets are shared by every gloss language; any listing names them all.
const LISTING_LANGUAGE: &str = "en";

/// Arguments for `kotoba audio`.
#[derive(Args, Debug)]
pub struct AudioArgs {
    /// Level to mirror (repeatable; default: every configured one).
    #[arg(long = "level", value_name = "V")]
    pub levels: Vec<String>,

    /// Maximum parallel downloads (overrides `concurrency_limit`).
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Retry rounds for transient failures (overrides `retries`).
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Exit non-zero if any asset failed.
    #[arg(long)]
    pub strict: bool,
}

impl AudioArgs {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let mut config = load_config(config_path)?;
        if let Some(limit) = self.concurrency {
            config.concurrency_limit = limit;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        config.validate().context("invalid audio options")?;

        let levels = pick_levels(&self.levels, &config);
        let totals = mirror_audio(&config, &levels).await?;
        totals.finish(self.strict)
    }
}

/// Counters summed over every level of one `audio` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AudioTotals {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unlisted_levels: usize,
    pub cancelled: bool,
}

impl AudioTotals {
    fn add(&mut self, report: &SyncReport) {
        self.downloaded += report.downloaded();
        self.skipped += report.skipped();
        self.failed += report.failed();
    }

    /// Turn the totals into the process result.
    pub fn finish(self, strict: bool) -> Result<()> {
        if self.cancelled {
            bail!("audio sync cancelled");
        }
        if self.unlisted_levels > 0 {
            bail!("{} level listing(s) could not be fetched", self.unlisted_levels);
        }
        if strict && self.failed > 0 {
            bail!("{} asset(s) failed to sync", self.failed);
        }
        Ok(())
    }
}

pub async fn mirror_audio(config: &MirrorConfig, levels: &[LevelId]) -> Result<AudioTotals> {
    let catalog = CatalogClient::from_config(config).context("failed to set up catalog client")?;
    let layout: Arc<dyn AssetLayout> = Arc::new(config.audio_layout());
    let options = FetchOptions {
        request_timeout: config.request_timeout(),
        pool_max_idle_per_host: config.concurrency_limit,
    };
    let fetcher: Arc<dyn AssetFetcher> =
        Arc::new(HttpFetcher::new(layout, &options).context("failed to set up HTTP client")?);
    let policy = RetryPolicy::from_mirror(config);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let signal_handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, cancelling audio sync");
            let _ = cancel_tx.send(true);
        }
    });

    let mut totals = AudioTotals::default();
    for level in levels {
        if *cancel_rx.borrow() {
            break;
        }

        let query = CatalogQuery::new(LanguageId::from(LISTING_LANGUAGE), level.clone());
        let response = match catalog.list_words(&query).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(level = %level, error = %err, "level listing failed");
                println!("✗ {level}: {err}");
                totals.unlisted_levels += 1;
                continue;
            }
        };
        let ids = identities(&response);

        let base_dir = config.media_dir(level);
        let coordinator = SyncCoordinator::new(
            Arc::clone(&fetcher),
            SyncConfig::from_mirror(config, base_dir.clone()),
        );
        tracing::info!(level = %level, assets = ids.len(), "starting audio sync");
        let report =
            pipeline::sync_with_retries_until(&coordinator, &ids, policy, cancel_rx.clone()).await;
        tracing::info!(level = %level, "audio sync finished");

        print_report(level, &base_dir, &report);
        totals.add(&report);
    }

    totals.cancelled = *cancel_rx.borrow();
    signal_handle.abort();
    Ok(totals)
}

fn print_report(level: &LevelId, base_dir: &Path, report: &SyncReport) {
    println!(
        "✓ {level}: {} downloaded, {} fresh, {} failed ({})",
        report.downloaded(),
        report.skipped(),
        report.failed(),
        base_dir.display()
    );
    for (item, reason) in report.failures() {
        println!("  ✗ {}: {reason}", item.identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_only_fail_the_run_when_strict() {
        let totals = AudioTotals {
            downloaded: 3,
            failed: 1,
            ..AudioTotals::default()
        };
        assert!(totals.finish(false).is_ok());
        assert!(totals.finish(true).is_err());
    }

    #[test]
    fn missing_listing_or_cancel_always_fails() {
        let unlisted = AudioTotals {
            unlisted_levels: 1,
            ..AudioTotals::default()
        };
        assert!(unlisted.finish(false).is_err());

        let cancelled = AudioTotals {
            cancelled: true,
            ..AudioTotals::default()
        };
        assert!(cancelled.finish(false).is_err());
    }
}
