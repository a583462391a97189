//! Per-document block metadata sidecars.
//!
//! Every managed document `notes/Intro.md` may have a sidecar
//! `notes/Intro.json` mapping block ids to numeric fields. The sidecar is
//! read, modified and written back whole on every update; concurrent
//! updates of the same sidecar are last-writer-wins.

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info, trace, warn};

use elo_core::blocks::{self, FileMetadata, HeadingRef};
use elo_core::defaults::{MANAGED_EXTENSION, SIDECAR_EXTENSION};
use elo_core::{DocumentStore, Error, Result};

use crate::config::VaultConfig;

/// Sidecar-backed block metadata store.
#[derive(Debug, Clone)]
pub struct BlockMetadataStore<S> {
    store: S,
    sidecar_extension: String,
}

impl<S: DocumentStore> BlockMetadataStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            sidecar_extension: SIDECAR_EXTENSION.to_string(),
        }
    }

    /// Store using the sidecar extension of `config`.
    pub fn from_config(store: S, config: &VaultConfig) -> Self {
        Self::new(store).with_sidecar_extension(config.sidecar_extension.clone())
    }

    /// Use a different sidecar extension (without the dot).
    pub fn with_sidecar_extension(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = extension.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sidecar path of a document.
    pub fn sidecar_path(&self, doc_path: &str) -> String {
        blocks::sidecar_path_with(doc_path, &self.sidecar_extension)
    }

    /// Existing block id of a heading, or a fresh one.
    pub fn ensure_block_id(&self, heading: &HeadingRef) -> String {
        blocks::ensure_block_id(heading)
    }

    /// Parsed sidecar of a document.
    ///
    /// A missing sidecar, undecodable bytes, unparsable JSON or a top-level
    /// value that is not an object all read as an empty map. Other store
    /// failures propagate.
    pub async fn get_file_metadata(&self, doc_path: &str) -> Result<FileMetadata> {
        let sidecar = self.sidecar_path(doc_path);
        let text = match self.store.read(&sidecar).await {
            Ok(text) => text,
            Err(Error::NotFound(_)) => {
                trace!(subsystem = "blocks", sidecar_path = %sidecar, "no sidecar");
                return Ok(FileMetadata::new());
            }
            Err(Error::Serialization(e)) => {
                warn!(
                    subsystem = "blocks",
                    sidecar_path = %sidecar,
                    error = %e,
                    "sidecar is not readable text, treating as empty"
                );
                return Ok(FileMetadata::new());
            }
            Err(e) => return Err(e),
        };

        match blocks::parse_sidecar(&text) {
            Some(data) => Ok(data),
            None => {
                warn!(
                    subsystem = "blocks",
                    sidecar_path = %sidecar,
                    "sidecar is not a JSON object, treating as empty"
                );
                Ok(FileMetadata::new())
            }
        }
    }

    /// Shallow-merge `partial` into the entry for `block_id` and write the sidecar.
    pub async fn update_block_metadata(
        &self,
        doc_path: &str,
        block_id: &str,
        partial: impl Into<Map<String, JsonValue>>,
    ) -> Result<()> {
        let mut data = self.get_file_metadata(doc_path).await?;
        blocks::apply_partial(&mut data, block_id, partial.into());
        self.write_sidecar(doc_path, &data).await?;
        debug!(
            subsystem = "blocks",
            op = "update_block_metadata",
            doc_path = %doc_path,
            block_id = %block_id,
            "block metadata updated"
        );
        Ok(())
    }

    /// Make sure every id has a complete entry. Writes only when something
    /// was added and returns whether it did.
    pub async fn sync_metadata<I: AsRef<str>>(&self, doc_path: &str, block_ids: &[I]) -> Result<bool> {
        let mut data = self.get_file_metadata(doc_path).await?;
        let changed = blocks::fill_defaults(&mut data, block_ids);

        debug!(
            subsystem = "blocks",
            op = "sync_metadata",
            doc_path = %doc_path,
            block_count = block_ids.len(),
            changed,
            "sidecar sync checked"
        );

        if changed {
            self.write_sidecar(doc_path, &data).await?;
        }
        Ok(changed)
    }

    /// Move the sidecar along with a renamed document.
    ///
    /// Only documents with the managed extension are handled. Returns `true`
    /// when a sidecar was moved. Failures are logged and swallowed.
    pub async fn handle_rename(&self, old_path: &str, new_path: &str) -> bool {
        if !is_managed(old_path) {
            return false;
        }

        let old_sidecar = self.sidecar_path(old_path);
        let new_sidecar = self.sidecar_path(new_path);

        match self.store.exists(&old_sidecar).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(subsystem = "blocks", sidecar_path = %old_sidecar, error = %e, "sidecar lookup failed");
                return false;
            }
        }

        match self.store.rename(&old_sidecar, &new_sidecar).await {
            Ok(()) => {
                info!(
                    subsystem = "blocks",
                    op = "handle_rename",
                    sidecar_path = %old_sidecar,
                    target_path = %new_sidecar,
                    "sidecar moved"
                );
                true
            }
            Err(e) => {
                warn!(
                    subsystem = "blocks",
                    op = "handle_rename",
                    sidecar_path = %old_sidecar,
                    target_path = %new_sidecar,
                    error = %e,
                    "sidecar rename failed"
                );
                false
            }
        }
    }

    async fn write_sidecar(&self, doc_path: &str, data: &FileMetadata) -> Result<()> {
        let text = serde_json::to_string_pretty(data)?;
        self.store.write(&self.sidecar_path(doc_path), &text).await
    }
}

/// Whether a document's sidecar follows it on rename.
pub fn is_managed(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && ext.eq_ignore_ascii_case(MANAGED_EXTENSION),
        None => false,
    }
}
