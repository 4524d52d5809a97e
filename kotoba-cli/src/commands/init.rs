//! `kotoba init [--base-url URL] [--output-dir DIR] [--force]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use kotoba_core::{config, MirrorConfig};

/// Write a default config file.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Catalog host, e.g. https://words.marugotoweb.jp
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory that receives `words/` and `media/`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let mut cfg = MirrorConfig::default();
        if let Some(base_url) = self.base_url {
            cfg.base_url = base_url;
        }
        if let Some(output_dir) = self.output_dir {
            cfg.output_dir = output_dir;
        }

        config::init_to(config_path, &cfg, self.force)
            .with_context(|| format!("failed to write config '{}'", config_path.display()))?;

        println!("✓ Wrote config to {}", config_path.display());
        println!("  base_url:   {}", cfg.base_url);
        println!("  output_dir: {}", cfg.output_dir.display());
        Ok(())
    }
}
