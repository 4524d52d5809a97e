pub mod all;
pub mod audio;
pub mod init;
pub mod status;
pub mod words;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use kotoba_core::{config, LanguageId, LevelId, MirrorConfig};

/// `--config` if given, else `~/.kotoba/config.yaml`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => config::config_path().context("could not determine home directory"),
    }
}

/// Load the config at `path`, or the defaults when it does not exist yet.
pub fn load_config(path: &Path) -> Result<MirrorConfig> {
    config::load_from(path).with_context(|| format!("failed to load config '{}'", path.display()))
}

/// CLI selection if non-empty, else the configured list.
pub fn pick_levels(cli: &[String], config: &MirrorConfig) -> Vec<LevelId> {
    if cli.is_empty() {
        config.levels.clone()
    } else {
        cli.iter().map(|l| LevelId::from(l.as_str())).collect()
    }
}

pub fn pick_languages(cli: &[String], config: &MirrorConfig) -> Vec<LanguageId> {
    if cli.is_empty() {
        config.languages.clone()
    } else {
        cli.iter().map(|l| LanguageId::from(l.as_str())).collect()
    }
}
