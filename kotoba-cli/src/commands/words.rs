//! `kotoba words`: export each (language, level) listing as a CSV file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::task::JoinSet;

use kotoba_catalog::{export_csv, extract_rows, CatalogClient, CatalogError, CatalogQuery};
use kotoba_core::{LanguageId, LevelId, MirrorConfig};

use super::{load_config, pick_languages, pick_levels};

/// Arguments for `kotoba words`.
#[derive(Args, Debug)]
pub struct WordsArgs {
    /// Gloss language to export (repeatable; default: every configured one).
    #[arg(long = "language", short = 'l', value_name = "L")]
    pub languages: Vec<String>,

    /// Level to export (repeatable; default: every configured one).
    #[arg(long = "level", value_name = "V")]
    pub levels: Vec<String>,
}

impl WordsArgs {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let languages = pick_languages(&self.languages, &config);
        let levels = pick_levels(&self.levels, &config);
        export_words(&config, &languages, &levels).await
    }
}

/// Export every language in turn; the levels of one language are listed
/// concurrently. Fails after all exports were attempted if any of them failed.
pub async fn export_words(
    config: &MirrorConfig,
    languages: &[LanguageId],
    levels: &[LevelId],
) -> Result<()> {
    let client = CatalogClient::from_config(config).context("failed to set up catalog client")?;

    let mut failed = 0usize;
    for language in languages {
        let mut tasks = JoinSet::new();
        for level in levels {
            let client = client.clone();
            let path = config.words_csv_path(language, level);
            let query = CatalogQuery::new(language.clone(), level.clone());
            tasks.spawn(async move {
                let result = export_one(&client, &query, &path).await;
                (query, path, result)
            });
        }

        let mut results = Vec::with_capacity(levels.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined.context("word export task failed")?);
        }
        results.sort_by_key(|(query, _, _)| levels.iter().position(|l| *l == query.level));

        for (query, path, result) in results {
            match result {
                Ok(rows) => println!(
                    "✓ Exported {}-{} ({rows} words) to {}",
                    query.language,
                    query.level,
                    path.display()
                ),
                Err(err) => {
                    failed += 1;
                    tracing::warn!(language = %query.language, level = %query.level, error = %err, "word export failed");
                    println!("✗ {}-{}: {err}", query.language, query.level);
                }
            }
        }
    }

    if failed > 0 {
        bail!("{failed} word list(s) could not be exported");
    }
    Ok(())
}

async fn export_one(
    client: &CatalogClient,
    query: &CatalogQuery,
    path: &Path,
) -> Result<usize, CatalogError> {
    tracing::info!(language = %query.language, level = %query.level, "exporting word list");
    let response = client.list_words(query).await?;
    let rows = extract_rows(&response);
    export_csv(path, &rows)?;
    Ok(rows.len())
}
