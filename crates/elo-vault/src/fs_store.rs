//! Filesystem-backed document store.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use elo_core::{DocumentStore, Error, FolderProbe, Result};

use crate::config::VaultConfig;

/// Stores documents as files under a vault root directory.
///
/// Paths are vault-relative with `/` separators. Absolute paths and `..`
/// components are rejected.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store rooted at the configured vault directory.
    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(Error::InvalidInput(format!(
                "path escapes the vault root: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    /// Check that the root exists and is writable.
    pub async fn validate(&self) -> Result<()> {
        let probe = self.root.join(".elo-health-check");
        fs::create_dir_all(&self.root).await?;
        fs::write(&probe, b"elo").await?;
        let _ = fs::remove_file(&probe).await; // Best-effort cleanup
        Ok(())
    }
}

fn not_found(path: &str, e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::NotFound => Error::NotFound(path.to_string()),
        ErrorKind::InvalidData => Error::Serialization(format!("{} is not valid UTF-8: {}", path, e)),
        _ => Error::Io(e),
    }
}

#[async_trait]
impl DocumentStore for FilesystemStore {
    async fn read(&self, path: &str) -> Result<String> {
        let full_path = self.full_path(path)?;
        fs::read_to_string(&full_path)
            .await
            .map_err(|e| not_found(path, e))
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        debug!(doc_path = %path, size = content.len(), "fs_store: write");

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "fs_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let mut temp_name = full_path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = full_path.with_file_name(temp_name);
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "fs_store: File::create failed");
            e
        })?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "fs_store: rename failed");
            e
        })?;

        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        Ok(fs::try_exists(full_path).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.full_path(from)?;
        let target = self.full_path(to)?;
        if fs::try_exists(&target).await? {
            return Err(Error::AlreadyExists(to.to_string()));
        }
        debug!(doc_path = %from, target_path = %to, "fs_store: rename");
        fs::rename(&source, &target).await.map_err(|e| {
            warn!(doc_path = %from, error = %e, "fs_store: rename failed");
            not_found(from, e)
        })
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path)?;
        fs::create_dir_all(full_path).await?;
        Ok(())
    }

    async fn folder_exists(&self, path: &str) -> Result<bool> {
        let full_path = self.full_path(path)?;
        match fs::metadata(full_path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl FolderProbe for FilesystemStore {
    fn folder_exists(&self, path: &str) -> bool {
        self.full_path(path).map(|p| p.is_dir()).unwrap_or(false)
    }
}
