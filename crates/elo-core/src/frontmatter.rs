//! Metadata block codec.
//!
//! A document may start with a YAML block framed by `---` lines:
//!
//! ```text
//! ---
//! Municipio: Madrid
//! tags: [Places/City]
//! ---
//! Body text
//! ```
//!
//! The block must begin at offset 0. Leading whitespace, a missing closing
//! sentinel or any other deviation means the document has no metadata and
//! the whole text is body. Parsing never fails loudly: malformed blocks
//! resolve to `None` so callers can continue with "no metadata".

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::defaults::BLOCK_SENTINEL;
use crate::value::{MetadataMap, MetadataValue};

static BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^---[ \t\r]*\n([\s\S]*?)\n---[ \t\r]*(?:\n|$)")
        .expect("metadata block pattern is valid")
});

/// A document split into its metadata text and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDocument<'a> {
    /// Raw text between the sentinels, `None` when the document has no block.
    pub metadata_text: Option<&'a str>,
    /// Everything after the closing sentinel line.
    pub body: &'a str,
}

/// Split `content` into metadata text and body.
pub fn split(content: &str) -> SplitDocument<'_> {
    match BLOCK_RE.captures(content) {
        Some(caps) => {
            let (Some(block), Some(text)) = (caps.get(0), caps.get(1)) else {
                return SplitDocument {
                    metadata_text: None,
                    body: content,
                };
            };
            SplitDocument {
                metadata_text: Some(text.as_str()),
                body: &content[block.end()..],
            }
        }
        None => SplitDocument {
            metadata_text: None,
            body: content,
        },
    }
}

/// Parse metadata text into a map.
///
/// Returns `None` for empty text, invalid YAML, and any top-level value that
/// is not a mapping.
pub fn parse(metadata_text: &str) -> Option<MetadataMap> {
    if metadata_text.trim().is_empty() {
        return None;
    }

    // The captured text stops before the newline of the closing sentinel,
    // which block scalars need for their final line break.
    let yaml = format!("{metadata_text}\n");
    match serde_yaml::from_str::<serde_yaml::Value>(&yaml) {
        Ok(serde_yaml::Value::Mapping(mapping)) => Some(mapping_to_map(mapping)),
        Ok(other) => {
            debug!(
                subsystem = "codec",
                kind = yaml_kind(&other),
                "metadata block is not a mapping"
            );
            None
        }
        Err(e) => {
            warn!(subsystem = "codec", error = %e, "failed to parse metadata block");
            None
        }
    }
}

/// Split and parse in one step.
pub fn parse_document(content: &str) -> (Option<MetadataMap>, &str) {
    let split = split(content);
    (split.metadata_text.and_then(parse), split.body)
}

/// Render `map` as a complete metadata block, sentinels included.
pub fn serialize(map: &MetadataMap) -> String {
    let yaml = serde_yaml::to_string(map).unwrap_or_else(|e| {
        warn!(subsystem = "codec", error = %e, "failed to serialize metadata block");
        "{}".to_string()
    });
    // Only the emitter's terminating newline goes; block scalars keep theirs.
    let yaml = yaml.strip_suffix('\n').unwrap_or(&yaml);
    format!("{sentinel}\n{yaml}\n{sentinel}", sentinel = BLOCK_SENTINEL)
}

/// Remove a leading metadata block and the newlines that follow it.
pub fn strip_leading_block(text: &str) -> &str {
    let split = split(text);
    match split.metadata_text {
        Some(_) => split.body.trim_start_matches(['\n', '\r']),
        None => text,
    }
}

/// Assemble a document from an optional metadata map and a body.
///
/// Leading newlines of the body are dropped and the block and body are
/// separated by one blank line. An absent or empty map emits no block.
pub fn compose(map: Option<&MetadataMap>, body: &str) -> String {
    let body = body.trim_start_matches(['\n', '\r']);
    let block = map.filter(|m| !m.is_empty()).map(serialize);

    match block {
        Some(block) if body.is_empty() => block,
        Some(block) => format!("{block}\n\n{body}"),
        None => body.to_string(),
    }
}

/// Pretty JSON rendering of a metadata map for handing to text collaborators.
pub fn to_prompt_json(map: Option<&MetadataMap>) -> String {
    let Some(map) = map else {
        return "{}".to_string();
    };
    serde_json::to_string_pretty(map).unwrap_or_else(|e| {
        warn!(subsystem = "codec", error = %e, "failed to render metadata as JSON");
        "{}".to_string()
    })
}

/// Merge a template document into the current document.
///
/// The metadata blocks are combined with
/// [`merge_template_and_current`](crate::merge::merge_template_and_current).
/// With `use_template_body` the template body (any stray block removed,
/// trailing whitespace trimmed) comes first, followed by the current body;
/// otherwise only the current body is kept.
pub fn merge_documents(template_text: &str, current_text: &str, use_template_body: bool) -> String {
    let template = split(template_text);
    let current = split(current_text);

    let merged = crate::merge::merge_template_and_current(
        template.metadata_text.and_then(parse).as_ref(),
        current.metadata_text.and_then(parse).as_ref(),
    );

    let body = if use_template_body {
        merge_bodies(template.body, current.body)
    } else {
        current.body.to_string()
    };

    compose(merged.as_ref(), &body)
}

fn merge_bodies(template_body: &str, current_body: &str) -> String {
    let template = strip_leading_block(template_body).trim_end();
    let current = strip_leading_block(current_body).trim_start();

    match (template.is_empty(), current.is_empty()) {
        (true, _) => current.to_string(),
        (false, true) => template.to_string(),
        (false, false) => format!("{template}\n\n{current}"),
    }
}

fn mapping_to_map(mapping: serde_yaml::Mapping) -> MetadataMap {
    mapping
        .into_iter()
        .map(|(k, v)| (yaml_key(k), yaml_to_value(v)))
        .collect()
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn yaml_to_value(value: serde_yaml::Value) -> MetadataValue {
    match value {
        serde_yaml::Value::Null => MetadataValue::Null,
        serde_yaml::Value::Bool(b) => MetadataValue::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::from(i)
            } else if let Some(u) = n.as_u64() {
                MetadataValue::Number(u.into())
            } else {
                n.as_f64()
                    .map(MetadataValue::from_f64)
                    .unwrap_or(MetadataValue::Null)
            }
        }
        serde_yaml::Value::String(s) => MetadataValue::String(s),
        serde_yaml::Value::Sequence(items) => {
            MetadataValue::Array(items.into_iter().map(yaml_to_value).collect())
        }
        serde_yaml::Value::Mapping(mapping) => MetadataValue::Object(mapping_to_map(mapping)),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(tagged.value),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}
