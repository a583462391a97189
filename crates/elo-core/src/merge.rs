//! Metadata merge policies.
//!
//! Each source of metadata has its own precedence rule:
//!
//! | Source        | Rule |
//! |---------------|------|
//! | template      | declares keys and order; loses to any meaningful current value |
//! | current       | wins over the template when meaningful |
//! | suggestion    | only fills keys that are missing or not meaningful |
//! | forced update | overwrites whenever the value is meaningful and different |
//!
//! All functions are pure; reading and writing documents is the caller's job.

use tracing::debug;

use crate::value::{is_meaningful, MetadataMap, MetadataValue};

/// Origin of a metadata map taking part in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSource {
    Template,
    Current,
    Suggestion,
    ForcedUpdate,
}

impl std::fmt::Display for MergeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::Current => write!(f, "current"),
            Self::Suggestion => write!(f, "suggestion"),
            Self::ForcedUpdate => write!(f, "forced-update"),
        }
    }
}

/// Result of a merge that may leave the document untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// At least one key changed; the full merged map.
    Updated(MetadataMap),
    /// Nothing changed, callers can skip the write.
    Unchanged,
}

impl MergeOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, MergeOutcome::Updated(_))
    }

    /// The merged map, if anything changed.
    pub fn into_updated(self) -> Option<MetadataMap> {
        match self {
            MergeOutcome::Updated(map) => Some(map),
            MergeOutcome::Unchanged => None,
        }
    }
}

/// Combine a template block with the current block.
///
/// Template keys come first in template order. Each takes the current value
/// when it is meaningful and the template value otherwise, even when the
/// template value is itself empty. Keys only present in `current` follow in
/// their original order, but only when meaningful. Returns `None` when the
/// result has no keys.
pub fn merge_template_and_current(
    template: Option<&MetadataMap>,
    current: Option<&MetadataMap>,
) -> Option<MetadataMap> {
    let mut merged = MetadataMap::new();

    if let Some(template) = template {
        for (key, template_value) in template.iter() {
            let current_value = current.and_then(|c| c.get(key));
            let chosen = match current_value {
                Some(value) if value.is_meaningful() => value,
                _ => template_value,
            };
            merged.insert(key, chosen.clone());
        }
    }

    if let Some(current) = current {
        for (key, value) in current.iter() {
            if value.is_meaningful() {
                merged.insert(key, value.clone());
            }
        }
    }

    debug!(
        subsystem = "merge",
        source = %MergeSource::Template,
        keys = merged.len(),
        "merged template and current metadata"
    );

    (!merged.is_empty()).then_some(merged)
}

/// Fill gaps in `current` from `suggestions`.
///
/// A key is written only when the current value is absent or not meaningful
/// and the suggested value is meaningful. Existing meaningful values are
/// never overwritten.
pub fn merge_suggestions(current: Option<&MetadataMap>, suggestions: &MetadataMap) -> MergeOutcome {
    let mut base = current.cloned().unwrap_or_default();
    let mut changed = 0usize;

    for (key, value) in suggestions.iter() {
        if !is_meaningful(base.get(key)) && value.is_meaningful() {
            base.insert(key, value.clone());
            changed += 1;
        }
    }

    outcome(MergeSource::Suggestion, base, changed)
}

/// Apply authoritative values on top of `current`.
///
/// Every meaningful update overwrites the existing value unless the two are
/// already equal. Non-meaningful updates are ignored.
pub fn apply_forced_updates(current: Option<&MetadataMap>, updates: &MetadataMap) -> MergeOutcome {
    let mut base = current.cloned().unwrap_or_default();
    let mut changed = 0usize;

    for (key, value) in updates.iter() {
        if value.is_meaningful() && base.get(key) != Some(value) {
            base.insert(key, value.clone());
            changed += 1;
        }
    }

    outcome(MergeSource::ForcedUpdate, base, changed)
}

fn outcome(source: MergeSource, merged: MetadataMap, changed: usize) -> MergeOutcome {
    debug!(subsystem = "merge", source = %source, changed_keys = changed, "merge finished");
    if changed == 0 {
        MergeOutcome::Unchanged
    } else {
        MergeOutcome::Updated(merged)
    }
}

/// Union of string tags, existing order first, duplicates dropped.
///
/// A scalar string under `key` is treated as a one-element list.
pub fn union_tags(current: Option<&MetadataMap>, key: &str, tags: &[String]) -> MergeOutcome {
    let mut base = current.cloned().unwrap_or_default();
    let mut values: Vec<MetadataValue> = match base.get(key) {
        Some(MetadataValue::Array(items)) => items.clone(),
        Some(value) if value.is_meaningful() => vec![value.clone()],
        _ => Vec::new(),
    };

    let mut changed = 0usize;
    for tag in tags {
        let candidate = MetadataValue::from(tag.as_str());
        if candidate.is_meaningful() && !values.contains(&candidate) {
            values.push(candidate);
            changed += 1;
        }
    }

    if changed > 0 {
        base.insert(key, MetadataValue::Array(values));
    }
    outcome(MergeSource::Suggestion, base, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_map;

    #[test]
    fn test_template_only_keeps_empty_template_values() {
        let template = metadata_map! { "a" => "1", "b" => "" };
        let merged = merge_template_and_current(Some(&template), None).unwrap();
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(merged.get("b"), Some(&MetadataValue::from("")));
    }

    #[test]
    fn test_current_only_drops_empty_values() {
        let current = metadata_map! { "a" => "1", "b" => "" };
        let merged = merge_template_and_current(None, Some(&current)).unwrap();
        assert_eq!(merged, metadata_map! { "a" => "1" });
    }

    #[test]
    fn test_template_order_first_then_current_only_keys() {
        let template = metadata_map! { "type" => "place", "rating" => MetadataValue::Null, "tags" => Vec::<String>::new() };
        let current = metadata_map! { "extra" => "x", "rating" => 4, "tags" => vec!["a"], "blank" => "  " };
        let merged = merge_template_and_current(Some(&template), Some(&current)).unwrap();

        assert_eq!(
            merged.keys().collect::<Vec<_>>(),
            vec!["type", "rating", "tags", "extra"]
        );
        assert_eq!(merged.get("rating"), Some(&MetadataValue::from(4)));
        assert_eq!(merged.get("tags"), Some(&MetadataValue::from(vec!["a"])));
    }

    #[test]
    fn test_template_wins_over_non_meaningful_current() {
        let template = metadata_map! { "status" => "draft" };
        let current = metadata_map! { "status" => "" };
        let merged = merge_template_and_current(Some(&template), Some(&current)).unwrap();
        assert_eq!(merged.get("status"), Some(&MetadataValue::from("draft")));
    }

    #[test]
    fn test_current_zero_and_false_beat_template() {
        let template = metadata_map! { "count" => 3, "done" => true };
        let current = metadata_map! { "count" => 0, "done" => false };
        let merged = merge_template_and_current(Some(&template), Some(&current)).unwrap();
        assert_eq!(merged, metadata_map! { "count" => 0, "done" => false });
    }

    #[test]
    fn test_template_and_current_empty_is_none() {
        assert!(merge_template_and_current(None, None).is_none());
        let current = metadata_map! { "a" => "" };
        assert!(merge_template_and_current(None, Some(&current)).is_none());
    }

    #[test]
    fn test_suggestions_fill_only_gaps() {
        let current = metadata_map! { "tags" => vec!["x"] };
        let suggestions = metadata_map! { "tags" => vec!["y"], "rating" => 5 };
        let outcome = merge_suggestions(Some(&current), &suggestions);
        assert_eq!(
            outcome,
            MergeOutcome::Updated(metadata_map! { "tags" => vec!["x"], "rating" => 5 })
        );
    }

    #[test]
    fn test_suggestions_replace_blank_values() {
        let current = metadata_map! { "summary" => " ", "tags" => Vec::<String>::new() };
        let suggestions = metadata_map! { "summary" => "A city", "tags" => vec!["Places/City"] };
        let merged = merge_suggestions(Some(&current), &suggestions)
            .into_updated()
            .unwrap();
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["summary", "tags"]);
        assert_eq!(merged.get("summary"), Some(&MetadataValue::from("A city")));
    }

    #[test]
    fn test_suggestions_no_change_signals_unchanged() {
        let current = metadata_map! { "a" => 1 };
        let suggestions = metadata_map! { "a" => 2, "b" => "" };
        assert_eq!(merge_suggestions(Some(&current), &suggestions), MergeOutcome::Unchanged);
        assert_eq!(
            merge_suggestions(Some(&current), &MetadataMap::new()),
            MergeOutcome::Unchanged
        );
    }

    #[test]
    fn test_suggestions_without_current() {
        let suggestions = metadata_map! { "a" => 1 };
        assert_eq!(
            merge_suggestions(None, &suggestions),
            MergeOutcome::Updated(metadata_map! { "a" => 1 })
        );
        assert_eq!(merge_suggestions(None, &MetadataMap::new()), MergeOutcome::Unchanged);
    }

    #[test]
    fn test_forced_updates_equal_value_is_unchanged() {
        let current = metadata_map! { "score" => 3 };
        let updates = metadata_map! { "score" => 3 };
        assert_eq!(apply_forced_updates(Some(&current), &updates), MergeOutcome::Unchanged);
    }

    #[test]
    fn test_forced_updates_overwrite_meaningful_values() {
        let current = metadata_map! { "Provincia" => "Malaga", "keep" => 1 };
        let updates = metadata_map! { "Provincia" => "Málaga", "Pais" => "Spain" };
        let merged = apply_forced_updates(Some(&current), &updates)
            .into_updated()
            .unwrap();
        assert_eq!(
            merged,
            metadata_map! { "Provincia" => "Málaga", "keep" => 1, "Pais" => "Spain" }
        );
    }

    #[test]
    fn test_forced_updates_ignore_empty_values() {
        let current = metadata_map! { "Region" => "Andalucía" };
        let updates = metadata_map! { "Region" => "", "Municipio" => MetadataValue::Null };
        assert_eq!(apply_forced_updates(Some(&current), &updates), MergeOutcome::Unchanged);
    }

    #[test]
    fn test_forced_updates_compare_deeply() {
        let current = metadata_map! { "tags" => vec!["a", "b"] };
        let same = metadata_map! { "tags" => vec!["a", "b"] };
        let reordered = metadata_map! { "tags" => vec!["b", "a"] };
        assert!(!apply_forced_updates(Some(&current), &same).is_updated());
        assert!(apply_forced_updates(Some(&current), &reordered).is_updated());
    }

    #[test]
    fn test_union_tags() {
        let current = metadata_map! { "tags" => "Places/City" };
        let tags = vec!["Places/City".to_string(), "Places/Beach".to_string()];
        let merged = union_tags(Some(&current), "tags", &tags).into_updated().unwrap();
        assert_eq!(
            merged.get("tags"),
            Some(&MetadataValue::from(vec!["Places/City", "Places/Beach"]))
        );

        let again = union_tags(Some(&merged), "tags", &tags);
        assert_eq!(again, MergeOutcome::Unchanged);
    }

    #[test]
    fn test_merge_source_display() {
        assert_eq!(MergeSource::ForcedUpdate.to_string(), "forced-update");
        assert_eq!(MergeSource::Template.to_string(), "template");
    }
}
