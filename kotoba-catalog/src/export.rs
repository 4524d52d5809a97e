//! Pipe-delimited word-list export.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use kotoba_core::layout::{audio_file_name, AUDIO_EXTENSION};
use kotoba_core::ResourceIdentity;

use crate::error::{io_err, CatalogError};
use crate::model::{CatalogResponse, WordAttribute, WordEntry};

pub const DELIMITER: char = '|';

/// One exported line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRow {
    pub raw_id: String,
    pub kana: String,
    pub kanji: String,
    pub romaji: String,
    pub meaning: String,
    /// `[sound:<file name>]`
    pub sound: String,
    /// Space-separated, sorted, de-duplicated.
    pub tags: String,
}

impl WordRow {
    pub fn from_entry(word: &WordEntry) -> Self {
        Self {
            raw_id: word.raw_id.clone(),
            kana: word.kana.clone(),
            kanji: word.kanji.clone(),
            romaji: word.romaji.clone(),
            meaning: word.meaning.clone(),
            sound: format!("[sound:{}]", sound_file(&word.raw_id)),
            tags: tags(&word.attributes).join(" "),
        }
    }

    pub fn fields(&self) -> [&str; 7] {
        [
            &self.raw_id,
            &self.kana,
            &self.kanji,
            &self.romaji,
            &self.meaning,
            &self.sound,
            &self.tags,
        ]
    }
}

pub fn extract_rows(response: &CatalogResponse) -> Vec<WordRow> {
    response.data.iter().map(WordRow::from_entry).collect()
}

/// Ids that are not audio identities keep their raw text as the stem.
fn sound_file(raw_id: &str) -> String {
    match ResourceIdentity::parse(raw_id) {
        Ok(identity) => audio_file_name(&identity),
        Err(_) => format!("{raw_id}{AUDIO_EXTENSION}"),
    }
}

fn tags(attributes: &[WordAttribute]) -> Vec<String> {
    let set: BTreeSet<String> = attributes
        .iter()
        .flat_map(|attr| {
            [
                attr.level.clone(),
                attr.utext.clone(),
                format!("Topic{}", attr.topic),
                format!("Lesson{}", attr.lesson),
            ]
        })
        .collect();
    set.into_iter().collect()
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == '"' || c == '\r' || c == '\n');
    if needs_quotes {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Render `rows` as `|`-delimited lines terminated by `\r\n`.
pub fn render_csv(rows: &[WordRow]) -> String {
    let mut out = String::new();
    for row in rows {
        for (i, field) in row.fields().iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            push_field(&mut out, field);
        }
        out.push_str("\r\n");
    }
    out
}

/// Write `rows` to `path`, replacing any previous export atomically.
pub fn export_csv(path: &Path, rows: &[WordRow]) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = path.with_extension("csv.tmp");
    if let Err(e) = fs::write(&tmp, render_csv(rows)) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    tracing::info!(path = %path.display(), rows = rows.len(), "word list exported");
    Ok(())
}
