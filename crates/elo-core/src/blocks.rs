//! Block identifiers and the shape of per-document sidecar files.
//!
//! A block is a heading-delimited section of a document. It is identified by
//! a short token written at the end of the heading (`## Intro ^ab12cd`) and
//! mirrored as a key in the document's sidecar JSON:
//!
//! ```json
//! {
//!   "ab12cd": { "score": 0, "difficulty": 0, "importance": 3, "attempts": 1 }
//! }
//! ```
//!
//! This module holds the pure parts: id extraction and generation, the field
//! registry, sidecar path derivation and in-memory sidecar updates. Reading
//! and writing sidecars lives in `elo-vault`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::defaults::{BLOCK_ID_LEN, BLOCK_ID_MAX_ATTEMPTS, SIDECAR_EXTENSION};
use crate::error::{Error, Result};

static BLOCK_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^([a-zA-Z0-9-]+)$").expect("block id pattern is valid"));

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Parsed sidecar contents: block id → field object.
pub type FileMetadata = Map<String, JsonValue>;

/// A heading as reported by the heading extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    /// Heading text, without the leading `#` markers.
    pub text: String,
    /// Block id already present at the end of the heading, if any.
    pub block_id: Option<String>,
    /// 0-based line of the heading in the document.
    pub line_start: usize,
}

impl HeadingRef {
    pub fn new(text: impl Into<String>, line_start: usize) -> Self {
        let text = text.into();
        let block_id = extract_block_id(&text).map(str::to_string);
        Self {
            text,
            block_id,
            line_start,
        }
    }
}

/// Kind of a registered block field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Boolean,
}

/// Declaration of one block metadata field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderFieldConfig {
    pub key: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
    pub default_value: i64,
}

impl HeaderFieldConfig {
    pub fn default_json(&self) -> JsonValue {
        JsonValue::from(self.default_value)
    }
}

pub const SCORE: &str = "score";
pub const DIFFICULTY: &str = "difficulty";
pub const IMPORTANCE: &str = "importance";
pub const ATTEMPTS: &str = "attempts";

/// Registry of fields every block entry carries.
pub const HEADER_FIELDS: &[HeaderFieldConfig] = &[
    HeaderFieldConfig {
        key: SCORE,
        description: "Score associated with the block content",
        field_type: FieldType::Number,
        default_value: 0,
    },
    HeaderFieldConfig {
        key: DIFFICULTY,
        description: "Difficulty level",
        field_type: FieldType::Number,
        default_value: 0,
    },
    HeaderFieldConfig {
        key: IMPORTANCE,
        description: "Importance level",
        field_type: FieldType::Number,
        default_value: 0,
    },
    HeaderFieldConfig {
        key: ATTEMPTS,
        description: "Number of attempts",
        field_type: FieldType::Number,
        default_value: 0,
    },
];

/// Typed partial update for a block entry. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<i64>,
}

impl From<HeaderMetadata> for Map<String, JsonValue> {
    fn from(meta: HeaderMetadata) -> Self {
        [
            (SCORE, meta.score),
            (DIFFICULTY, meta.difficulty),
            (IMPORTANCE, meta.importance),
            (ATTEMPTS, meta.attempts),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), JsonValue::from(v))))
        .collect()
    }
}

/// Fresh entry with every registry default.
pub fn default_entry() -> Map<String, JsonValue> {
    HEADER_FIELDS
        .iter()
        .map(|field| (field.key.to_string(), field.default_json()))
        .collect()
}

/// Trailing `^token` of a heading, if present.
pub fn extract_block_id(heading_text: &str) -> Option<&str> {
    BLOCK_ID_RE
        .captures(heading_text.trim_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Existing block id of `heading`, or a freshly generated one.
///
/// Fresh ids are not checked against anything; with 36^6 possible tokens a
/// document with `n` generated ids collides with probability about
/// `n² / 4.4e9`. Use [`ensure_unique_block_id`] when the known ids are at hand.
pub fn ensure_block_id(heading: &HeadingRef) -> String {
    match heading.block_id.as_deref().or_else(|| extract_block_id(&heading.text)) {
        Some(id) => id.to_string(),
        None => generate_block_id(),
    }
}

/// Like [`ensure_block_id`], but regenerates until the token is not in `taken`.
///
/// An id already written in the heading is returned as is.
pub fn ensure_unique_block_id(heading: &HeadingRef, taken: &HashSet<String>) -> Result<String> {
    if let Some(id) = heading.block_id.as_deref().or_else(|| extract_block_id(&heading.text)) {
        return Ok(id.to_string());
    }

    for attempt in 0..BLOCK_ID_MAX_ATTEMPTS {
        let candidate = generate_block_id();
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        trace!(subsystem = "blocks", attempt, block_id = %candidate, "block id collision");
    }

    Err(Error::Internal(format!(
        "no free block id after {} attempts",
        BLOCK_ID_MAX_ATTEMPTS
    )))
}

/// Random lowercase base-36 token of [`BLOCK_ID_LEN`] characters.
pub fn generate_block_id() -> String {
    let mut rng = rand::thread_rng();
    (0..BLOCK_ID_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Sidecar path for a document: the final extension is replaced by `.json`.
///
/// Only the file name is considered, so dots in folder names are left alone.
/// A name without an extension gets `.json` appended.
pub fn sidecar_path(doc_path: &str) -> String {
    sidecar_path_with(doc_path, SIDECAR_EXTENSION)
}

/// [`sidecar_path`] with a custom sidecar extension (without the dot).
pub fn sidecar_path_with(doc_path: &str, extension: &str) -> String {
    let (dir, name) = match doc_path.rfind('/') {
        Some(idx) => doc_path.split_at(idx + 1),
        None => ("", doc_path),
    };
    let stem = match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    };
    format!("{dir}{stem}.{extension}")
}

/// Interpret sidecar text. Anything but a JSON object yields `None`.
pub fn parse_sidecar(text: &str) -> Option<FileMetadata> {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(map)) => Some(map),
        _ => None,
    }
}

/// Shallow-merge `partial` into the entry for `block_id`.
///
/// A missing entry, or one that is not an object, starts out empty.
/// Fields in `partial` overwrite existing ones.
pub fn apply_partial(data: &mut FileMetadata, block_id: &str, partial: Map<String, JsonValue>) {
    let entry = data
        .entry(block_id.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()));
    if !entry.is_object() {
        *entry = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(fields) = entry {
        fields.extend(partial);
    }
}

/// Make sure every id has an entry carrying every registry field.
///
/// Fields already present are never touched. Returns `true` when anything
/// was added.
pub fn fill_defaults<S: AsRef<str>>(data: &mut FileMetadata, block_ids: &[S]) -> bool {
    let mut changed = false;

    for id in block_ids {
        let id = id.as_ref();
        match data.get_mut(id) {
            Some(JsonValue::Object(fields)) => {
                for field in HEADER_FIELDS {
                    if !fields.contains_key(field.key) {
                        fields.insert(field.key.to_string(), field.default_json());
                        changed = true;
                    }
                }
            }
            _ => {
                data.insert(id.to_string(), JsonValue::Object(default_entry()));
                changed = true;
            }
        }
    }

    changed
}

/// Map an importance score (0–10) to a star rating (0–5).
pub fn importance_to_stars(importance: i64) -> i64 {
    if importance <= 0 {
        return 0;
    }
    ((importance + 1) / 2).min(5)
}

/// Coarse difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Low,
    Medium,
    High,
}

pub fn difficulty_level(difficulty: i64) -> DifficultyLevel {
    match difficulty {
        d if d < 4 => DifficultyLevel::Low,
        d if d < 7 => DifficultyLevel::Medium,
        _ => DifficultyLevel::High,
    }
}
