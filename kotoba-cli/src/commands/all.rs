//! `kotoba all`: every word list, then every level's audio.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use super::{audio::mirror_audio, load_config, words::export_words};

/// Arguments for `kotoba all`.
#[derive(Args, Debug)]
pub struct AllArgs {
    /// Exit non-zero if any audio asset failed.
    #[arg(long)]
    pub strict: bool,
}

impl AllArgs {
    pub async fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;

        // A failed word list must not keep the audio mirror from running.
        let words = export_words(&config, &config.languages, &config.levels).await;
        if let Err(err) = &words {
            tracing::warn!(error = %err, "word export incomplete; continuing with audio");
        }

        let audio = mirror_audio(&config, &config.levels)
            .await
            .and_then(|totals| totals.finish(self.strict));

        match (words, audio) {
            (Ok(()), audio) => audio,
            (Err(words), Ok(())) => Err(words),
            (Err(words), Err(audio)) => bail!("{words}; {audio}"),
        }
    }
}
