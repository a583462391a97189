//! Document-level operations built from the pure metadata rules.
//!
//! Each workflow reads a document through a [`DocumentStore`], applies one
//! of the merge policies or the place path rules, and writes back only
//! when the text actually changed.

use std::collections::HashSet;

use tracing::{debug, info, trace};

use elo_core::blocks::ensure_unique_block_id;
use elo_core::frontmatter::{self, compose, parse_document};
use elo_core::headings::annotate_heading_line;
use elo_core::merge::{self, union_tags};
use elo_core::{
    DocumentStore, Error, FolderProbe, Geocoder, HeadingSource, MarkdownHeadings, MergeOutcome,
    MetadataMap, PlaceComponents, PlaceHierarchyConfig, PlacePathBuilder, Result,
};

use crate::block_store::BlockMetadataStore;

/// Parsed metadata block of a stored document.
pub async fn read_metadata<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
) -> Result<Option<MetadataMap>> {
    let content = store.read(path).await?;
    Ok(parse_document(&content).0)
}

/// Merge a template document into a stored document.
///
/// Returns `true` when the document was rewritten.
pub async fn apply_template<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
    template_text: &str,
    use_template_body: bool,
) -> Result<bool> {
    let current = store.read(path).await?;
    let merged = frontmatter::merge_documents(template_text, &current, use_template_body);
    write_if_changed(store, path, &current, &merged, "apply_template").await
}

/// Fill missing metadata from suggestions.
pub async fn apply_suggestions<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
    suggestions: &MetadataMap,
) -> Result<bool> {
    rewrite_metadata(store, path, "apply_suggestions", |current| {
        merge::merge_suggestions(current, suggestions)
    })
    .await
}

/// Overwrite metadata with authoritative values.
pub async fn apply_forced_updates<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
    updates: &MetadataMap,
) -> Result<bool> {
    rewrite_metadata(store, path, "apply_forced_updates", |current| {
        merge::apply_forced_updates(current, updates)
    })
    .await
}

/// Add tags to the list under `key`, keeping existing ones.
pub async fn apply_tags<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
    key: &str,
    tags: &[String],
) -> Result<bool> {
    rewrite_metadata(store, path, "apply_tags", |current| {
        union_tags(current, key, tags)
    })
    .await
}

async fn rewrite_metadata<S, F>(store: &S, path: &str, op: &'static str, merge: F) -> Result<bool>
where
    S: DocumentStore + ?Sized,
    F: FnOnce(Option<&MetadataMap>) -> MergeOutcome,
{
    let content = store.read(path).await?;
    let (current, body) = parse_document(&content);

    match merge(current.as_ref()) {
        MergeOutcome::Updated(merged) => {
            let updated = compose(Some(&merged), body);
            write_if_changed(store, path, &content, &updated, op).await
        }
        MergeOutcome::Unchanged => {
            debug!(subsystem = "vault", op, doc_path = %path, "metadata unchanged");
            Ok(false)
        }
    }
}

async fn write_if_changed<S: DocumentStore + ?Sized>(
    store: &S,
    path: &str,
    before: &str,
    after: &str,
    op: &'static str,
) -> Result<bool> {
    if before == after {
        debug!(subsystem = "vault", op, doc_path = %path, "text unchanged, skipping write");
        return Ok(false);
    }
    store.write(path, after).await?;
    info!(subsystem = "vault", op, doc_path = %path, "document updated");
    Ok(true)
}

// =============================================================================
// PLACES
// =============================================================================

/// File the place document at `path` into the place hierarchy.
///
/// The components are first written into the document as forced updates.
/// The target path is computed with `probe` before anything is created;
/// an existing document at the target is never overwritten. The block
/// metadata sidecar follows the document. Returns the final path.
pub async fn organize_place<S: DocumentStore>(
    blocks: &BlockMetadataStore<S>,
    probe: &dyn FolderProbe,
    config: &PlaceHierarchyConfig,
    path: &str,
    components: &PlaceComponents,
) -> Result<String> {
    let store = blocks.store();

    apply_forced_updates(store, path, &components.to_metadata_updates()).await?;

    let place_name = file_stem(path);
    let target = PlacePathBuilder::new(config.clone()).build_path(place_name, components, probe);

    if target == path {
        debug!(subsystem = "vault", op = "organize_place", doc_path = %path, "already in place");
        return Ok(target);
    }
    if store.exists(&target).await? {
        return Err(Error::AlreadyExists(target));
    }

    if let Some((parent, _)) = target.rsplit_once('/') {
        if !DocumentStore::folder_exists(store, parent).await? {
            store.create_folder(parent).await?;
        }
    }

    store.rename(path, &target).await?;
    blocks.handle_rename(path, &target).await;

    info!(
        subsystem = "vault",
        op = "organize_place",
        doc_path = %path,
        target_path = %target,
        "place document moved"
    );
    Ok(target)
}

/// [`organize_place`] with components read from the document's own block.
pub async fn organize_place_from_metadata<S: DocumentStore>(
    blocks: &BlockMetadataStore<S>,
    probe: &dyn FolderProbe,
    config: &PlaceHierarchyConfig,
    path: &str,
    is_region_famous: bool,
) -> Result<String> {
    let metadata = read_metadata(blocks.store(), path)
        .await?
        .ok_or_else(|| Error::InvalidInput(format!("{} has no metadata block", path)))?;
    let components = PlaceComponents::from_metadata(&metadata, is_region_famous);
    organize_place(blocks, probe, config, path, &components).await
}

/// Geocode the document's name, then [`organize_place`].
///
/// Fails with `Error::NotFound` when the geocoder knows no such place.
pub async fn locate_and_organize_place<S: DocumentStore>(
    geocoder: &dyn Geocoder,
    blocks: &BlockMetadataStore<S>,
    probe: &dyn FolderProbe,
    config: &PlaceHierarchyConfig,
    path: &str,
) -> Result<String> {
    let query = file_stem(path);
    let components = geocoder
        .locate(query)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no place matches {}", query)))?;
    debug!(subsystem = "vault", op = "locate_place", doc_path = %path, "place located");
    organize_place(blocks, probe, config, path, &components).await
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

// =============================================================================
// BLOCK IDS
// =============================================================================

/// Outcome of [`generate_header_metadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMetadataReport {
    /// Ids of all headings, in document order.
    pub block_ids: Vec<String>,
    /// Ids newly written into headings.
    pub added: Vec<String>,
    pub document_written: bool,
    pub sidecar_written: bool,
}

/// Give every heading a block id and a complete sidecar entry.
pub async fn generate_header_metadata<S: DocumentStore>(
    blocks: &BlockMetadataStore<S>,
    path: &str,
) -> Result<HeaderMetadataReport> {
    generate_header_metadata_with(blocks, &MarkdownHeadings, path).await
}

/// [`generate_header_metadata`] with a custom heading source.
///
/// New ids are unique against ids already in the document and in its
/// sidecar.
pub async fn generate_header_metadata_with<S: DocumentStore>(
    blocks: &BlockMetadataStore<S>,
    headings: &dyn HeadingSource,
    path: &str,
) -> Result<HeaderMetadataReport> {
    let store = blocks.store();
    let original = store.read(path).await?;
    let found = headings.headings(&original);
    let sidecar = blocks.get_file_metadata(path).await?;

    let mut taken: HashSet<String> = sidecar.keys().cloned().collect();
    taken.extend(found.iter().filter_map(|h| h.block_id.clone()));

    let mut content = original.clone();
    let mut report = HeaderMetadataReport::default();

    for heading in &found {
        let id = ensure_unique_block_id(heading, &taken)?;
        if heading.block_id.is_none() {
            if let Some(updated) = annotate_heading_line(&content, heading.line_start, &id) {
                content = updated;
                trace!(subsystem = "vault", block_id = %id, line = heading.line_start, "heading annotated");
            }
            taken.insert(id.clone());
            report.added.push(id.clone());
        }
        report.block_ids.push(id);
    }

    if content != original {
        store.write(path, &content).await?;
        report.document_written = true;
    }
    report.sidecar_written = blocks.sync_metadata(path, &report.block_ids).await?;

    info!(
        subsystem = "vault",
        op = "generate_header_metadata",
        doc_path = %path,
        block_count = report.block_ids.len(),
        added = report.added.len(),
        "header metadata generated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;
    use elo_core::{metadata_map, MetadataValue};

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("a/b/Madrid.md"), "Madrid");
        assert_eq!(file_stem("Madrid.md"), "Madrid");
        assert_eq!(file_stem("a/St. Ives.md"), "St. Ives");
        assert_eq!(file_stem("a/README"), "README");
    }

    #[tokio::test]
    async fn test_apply_suggestions_writes_only_on_change() {
        let store = MemoryDocumentStore::new().with_file("a.md", "---\ntags:\n- x\n---\nBody\n");

        let changed = apply_suggestions(&store, "a.md", &metadata_map! { "tags" => vec!["y"] })
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(store.call_count("write"), 0);

        let changed = apply_suggestions(&store, "a.md", &metadata_map! { "rating" => 5 })
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(
            store.content("a.md").unwrap(),
            "---\ntags:\n- x\nrating: 5\n---\n\nBody\n"
        );
    }

    #[tokio::test]
    async fn test_apply_forced_updates_on_document_without_block() {
        let store = MemoryDocumentStore::new().with_file("a.md", "Body");
        let changed = apply_forced_updates(&store, "a.md", &metadata_map! { "Pais" => "Spain" })
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(store.content("a.md").unwrap(), "---\nPais: Spain\n---\n\nBody");

        let metadata = read_metadata(&store, "a.md").await.unwrap().unwrap();
        assert_eq!(metadata.get("Pais"), Some(&MetadataValue::from("Spain")));
    }

    #[tokio::test]
    async fn test_apply_tags() {
        let store = MemoryDocumentStore::new().with_file("a.md", "---\ntags: a\n---\n");
        let tags = vec!["a".to_string(), "b".to_string()];
        assert!(apply_tags(&store, "a.md", "tags", &tags).await.unwrap());
        assert!(!apply_tags(&store, "a.md", "tags", &tags).await.unwrap());
        assert_eq!(store.content("a.md").unwrap(), "---\ntags:\n- a\n- b\n---");
    }

    #[tokio::test]
    async fn test_apply_template_is_noop_when_identical() {
        let store = MemoryDocumentStore::new().with_file("a.md", "---\ntype: place\n---\n\nBody");
        let changed = apply_template(&store, "a.md", "---\ntype: \"\"\n---\n", false)
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_read_metadata_missing_document() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            read_metadata(&store, "nope.md").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
