//! `kotoba status`: offline view of the local mirror.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use kotoba_core::{layout::AUDIO_EXTENSION, MirrorConfig};
use kotoba_sync::writer::TMP_SUFFIX;

use super::load_config;

/// Arguments for `kotoba status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let report = build_report(&config)?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    output_dir: PathBuf,
    levels: Vec<LevelStatus>,
    word_lists: Vec<WordListStatus>,
}

#[derive(Debug, Serialize)]
struct LevelStatus {
    level: String,
    dir: PathBuf,
    assets: usize,
    bytes: u64,
    leftover_tmp: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct WordListStatus {
    language: String,
    level: String,
    path: PathBuf,
    present: bool,
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "level")]
    level: String,
    #[tabled(rename = "assets")]
    assets: usize,
    #[tabled(rename = "size")]
    size: String,
    #[tabled(rename = "leftover tmp")]
    leftover: usize,
}

fn build_report(config: &MirrorConfig) -> Result<StatusReport> {
    let mut levels = Vec::with_capacity(config.levels.len());
    for level in &config.levels {
        let dir = config.media_dir(level);
        let status = scan_media_dir(&dir)
            .with_context(|| format!("failed to scan '{}'", dir.display()))?;
        levels.push(LevelStatus {
            level: level.to_string(),
            dir,
            ..status
        });
    }

    let mut word_lists = Vec::new();
    for language in &config.languages {
        for level in &config.levels {
            let path = config.words_csv_path(language, level);
            word_lists.push(WordListStatus {
                language: language.to_string(),
                level: level.to_string(),
                present: path.is_file(),
                path,
            });
        }
    }

    Ok(StatusReport {
        output_dir: config.output_dir.clone(),
        levels,
        word_lists,
    })
}

/// Count the mirrored assets in `dir`. A directory that does not exist yet is
/// an empty mirror.
fn scan_media_dir(dir: &Path) -> io::Result<LevelStatus> {
    let mut status = LevelStatus {
        level: String::new(),
        dir: dir.to_path_buf(),
        assets: 0,
        bytes: 0,
        leftover_tmp: Vec::new(),
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(status),
        Err(err) => return Err(err),
    };

    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(TMP_SUFFIX) {
            status.leftover_tmp.push(entry.path());
        } else if name.ends_with(AUDIO_EXTENSION) {
            status.assets += 1;
            status.bytes += metadata.len();
        }
    }
    status.leftover_tmp.sort();
    Ok(status)
}

fn print_table(report: &StatusReport) {
    println!(
        "Kotoba v{} | output {}",
        env!("CARGO_PKG_VERSION"),
        report.output_dir.display()
    );

    let rows: Vec<LevelRow> = report
        .levels
        .iter()
        .map(|level| LevelRow {
            level: level.level.clone(),
            assets: level.assets,
            size: format_bytes(level.bytes),
            leftover: level.leftover_tmp.len(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for level in &report.levels {
        for tmp in &level.leftover_tmp {
            println!("{} leftover {}", "!".yellow().bold(), tmp.display());
        }
    }

    println!("Word lists:");
    for list in &report.word_lists {
        let mark = if list.present {
            "■".green().bold()
        } else {
            "■".bright_black().bold()
        };
        println!("  {mark} {}-{}  {}", list.language, list.level, list.path.display());
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_counts_audio_and_leftovers_separately() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("A1W_0001.mp3"), b"12345").unwrap();
        fs::write(dir.path().join("A1W_0002.mp3"), b"123").unwrap();
        fs::write(dir.path().join("A1W_0003.mp3.kotoba.tmp"), b"1").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let status = scan_media_dir(dir.path()).unwrap();
        assert_eq!(status.assets, 2);
        assert_eq!(status.bytes, 8);
        assert_eq!(status.leftover_tmp.len(), 1);
    }

    #[test]
    fn missing_dir_is_empty_mirror() {
        let dir = tempfile::TempDir::new().unwrap();
        let status = scan_media_dir(&dir.path().join("absent")).unwrap();
        assert_eq!(status.assets, 0);
        assert!(status.leftover_tmp.is_empty());
    }

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
