//! Collaborator traits.
//!
//! Everything that touches the outside world is injected through these
//! traits so the metadata rules stay pure and testable. Paths are
//! vault-relative strings using `/` separators.

use async_trait::async_trait;

use crate::blocks::HeadingRef;
use crate::error::Result;
use crate::place::PlaceComponents;

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Access to the documents and sidecars of a vault.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a file as UTF-8 text. Missing files yield `Error::NotFound`.
    async fn read(&self, path: &str) -> Result<String>;

    /// Create or replace a file.
    async fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Check whether a file exists.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Move a file. The target must not exist.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a folder and any missing parents.
    async fn create_folder(&self, path: &str) -> Result<()>;

    /// Check whether a folder exists.
    async fn folder_exists(&self, path: &str) -> Result<bool>;
}

// =============================================================================
// GEOCODING
// =============================================================================

/// Resolves a free-text place query into its administrative hierarchy.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the query does not match any place.
    async fn locate(&self, query: &str) -> Result<Option<PlaceComponents>>;
}

// =============================================================================
// HEADINGS
// =============================================================================

/// Source of the headings of a document.
pub trait HeadingSource: Send + Sync {
    fn headings(&self, content: &str) -> Vec<HeadingRef>;
}

/// Markdown ATX heading scanner, see [`crate::headings::extract_headings`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownHeadings;

impl HeadingSource for MarkdownHeadings {
    fn headings(&self, content: &str) -> Vec<HeadingRef> {
        crate::headings::extract_headings(content)
    }
}
