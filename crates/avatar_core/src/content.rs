//! crates/avatar_core/src/content.rs
//!
//! The static content table: pre-authored text and images for every avatar
//! point (1–22), in a male and a female variant.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

use crate::calculator::MISSING_DESCRIPTION;
use crate::domain::{ContentRecord, Gender};

/// The content document compiled into the binary.
const EMBEDDED_CONTENT: &str = include_str!("../content/avatars.json");

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Content document is not valid: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Avatar {0} appears more than once in the content document")]
    DuplicateIndex(u32),
}

//=========================================================================================
// Document Shape
//=========================================================================================

#[derive(Deserialize)]
struct ContentDocument {
    version: u32,
    avatars: Vec<AvatarEntry>,
}

#[derive(Deserialize)]
struct AvatarEntry {
    index: u32,
    #[serde(default)]
    image: Option<String>,
    male: VariantEntry,
    female: VariantEntry,
}

#[derive(Deserialize, Clone)]
struct VariantEntry {
    title: String,
    #[serde(alias = "description")]
    character: String,
    #[serde(default)]
    talents: String,
    #[serde(default)]
    money: String,
    #[serde(default)]
    lessons: String,
    #[serde(default, deserialize_with = "lenient_list")]
    recommendations: Vec<String>,
}

/// Accepts a list of strings or a single string. Any other shape reads as empty,
/// which renders as the "no recommendations" placeholder.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn reading_or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        MISSING_DESCRIPTION.to_string()
    } else {
        text.to_string()
    }
}

impl VariantEntry {
    fn to_record(&self, image: &Option<String>) -> ContentRecord {
        ContentRecord {
            title: self.title.clone(),
            image: image.clone(),
            character: reading_or_placeholder(&self.character),
            talents: reading_or_placeholder(&self.talents),
            money: reading_or_placeholder(&self.money),
            lessons: reading_or_placeholder(&self.lessons),
            recommendations: self.recommendations.clone(),
        }
    }
}

//=========================================================================================
// Table
//=========================================================================================

/// Read-only lookup of content by avatar index and gender.
#[derive(Debug, Clone)]
pub struct ContentTable {
    version: u32,
    records: HashMap<(u32, Gender), ContentRecord>,
}

impl ContentTable {
    /// Loads the content table shipped with the crate.
    pub fn embedded() -> Result<Self, ContentError> {
        Self::from_json(EMBEDDED_CONTENT)
    }

    /// Parses a content document. Entries may be missing; lookups for them yield `None`.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let document: ContentDocument = serde_json::from_str(json)?;
        let mut records = HashMap::with_capacity(document.avatars.len() * 2);
        for entry in &document.avatars {
            if records.contains_key(&(entry.index, Gender::Male)) {
                return Err(ContentError::DuplicateIndex(entry.index));
            }
            records.insert((entry.index, Gender::Male), entry.male.to_record(&entry.image));
            records.insert((entry.index, Gender::Female), entry.female.to_record(&entry.image));
        }
        Ok(Self {
            version: document.version,
            records,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The gender-specific record for an avatar index, if the table has one.
    pub fn content_for(&self, index: u32, gender: Gender) -> Option<&ContentRecord> {
        self.records.get(&(index, gender))
    }
}
