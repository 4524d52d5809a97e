//! Query parameters for `SearchCategoryAPI`.

use kotoba_core::{LanguageId, LevelId};

/// One listing request: every word of `level`, glossed in `language`.
///
/// Topics, lessons and text kinds default to the full catalog
/// (`1..=9`, `1..=18`, `act,comp,vocab`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub language: LanguageId,
    pub level: LevelId,
    pub topics: Vec<u32>,
    pub lessons: Vec<u32>,
    pub texts: Vec<String>,
}

impl CatalogQuery {
    pub fn new(language: LanguageId, level: LevelId) -> Self {
        Self {
            language,
            level,
            topics: (1..=9).collect(),
            lessons: (1..=18).collect(),
            texts: ["act", "comp", "vocab"].iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_topics(mut self, topics: impl IntoIterator<Item = u32>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    pub fn with_lessons(mut self, lessons: impl IntoIterator<Item = u32>) -> Self {
        self.lessons = lessons.into_iter().collect();
        self
    }

    pub fn with_texts<S: Into<String>>(mut self, texts: impl IntoIterator<Item = S>) -> Self {
        self.texts = texts.into_iter().map(Into::into).collect();
        self
    }

    /// `lv`, `tp`, `ls`, `tx`, `ut` in the order the API documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lv", self.level.to_string()),
            ("tp", join(&self.topics)),
            ("ls", join(&self.lessons)),
            ("tx", self.texts.join(",")),
            ("ut", self.language.to_string()),
        ]
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
