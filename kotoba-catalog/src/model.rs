//! Wire shape of a `SearchCategoryAPI` response.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use kotoba_core::ResourceIdentity;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogResponse {
    #[serde(rename = "DATA", default)]
    pub data: Vec<WordEntry>,
}

/// One vocabulary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WordEntry {
    #[serde(rename = "RAWID", deserialize_with = "text")]
    pub raw_id: String,
    #[serde(rename = "KANA", default, deserialize_with = "text")]
    pub kana: String,
    #[serde(rename = "KANJI", default, deserialize_with = "text")]
    pub kanji: String,
    #[serde(rename = "ROMAJI", default, deserialize_with = "text")]
    pub romaji: String,
    /// Gloss in the requested language.
    #[serde(rename = "UWRD", default, deserialize_with = "text")]
    pub meaning: String,
    #[serde(rename = "ATTR", default)]
    pub attributes: Vec<WordAttribute>,
}

/// Where a word appears in the course material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WordAttribute {
    #[serde(default, deserialize_with = "text")]
    pub level: String,
    #[serde(default, deserialize_with = "text")]
    pub utext: String,
    #[serde(default, deserialize_with = "text")]
    pub topic: String,
    #[serde(default, deserialize_with = "text")]
    pub lesson: String,
}

/// The API is inconsistent about scalar types: topic and lesson come back as
/// strings or numbers, and empty fields sometimes as `null`.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// Valid asset identities of `response`, in catalog order.
///
/// Raw ids that do not name an audio asset are logged and skipped.
pub fn identities(response: &CatalogResponse) -> Vec<ResourceIdentity> {
    response
        .data
        .iter()
        .filter_map(|word| match ResourceIdentity::parse(&word.raw_id) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::warn!(raw_id = %word.raw_id, error = %err, "skipping word without audio identity");
                None
            }
        })
        .collect()
}
