//! In-memory collaborators for deterministic testing.
//!
//! ```rust
//! use elo_vault::memory::MemoryDocumentStore;
//!
//! let store = MemoryDocumentStore::new().with_file("Madrid.md", "# Madrid\n");
//! assert_eq!(store.content("Madrid.md").as_deref(), Some("# Madrid\n"));
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use elo_core::{DocumentStore, Error, FolderProbe, Geocoder, PlaceComponents, Result};

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub operation: &'static str,
    pub path: String,
}

/// Document store backed by in-memory maps.
///
/// Writing a file makes all of its parent folders exist. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    files: Arc<Mutex<BTreeMap<String, String>>>,
    folders: Arc<Mutex<BTreeSet<String>>>,
    failing_renames: Arc<Mutex<HashSet<String>>>,
    call_log: Arc<Mutex<Vec<StoreCall>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.files.lock().unwrap().insert(path, content.into());
        self
    }

    /// Seed an empty folder.
    pub fn with_folder(self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.add_parents(&path);
        self.folders.lock().unwrap().insert(path);
        self
    }

    /// Make every rename of `path` fail with an I/O error.
    pub fn with_failing_rename(self, path: impl Into<String>) -> Self {
        self.failing_renames.lock().unwrap().insert(path.into());
        self
    }

    /// Current content of a file, if present.
    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of recorded calls of one operation.
    pub fn call_count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    fn record(&self, operation: &'static str, path: &str) {
        self.call_log.lock().unwrap().push(StoreCall {
            operation,
            path: path.to_string(),
        });
    }

    fn add_parents(&self, path: &str) {
        let mut folders = self.folders.lock().unwrap();
        let mut end = 0;
        while let Some(idx) = path[end..].find('/') {
            end += idx;
            folders.insert(path[..end].to_string());
            end += 1;
        }
    }

    fn has_folder(&self, path: &str) -> bool {
        let path = path.trim_end_matches('/');
        self.folders.lock().unwrap().contains(path)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, path: &str) -> Result<String> {
        self.record("read", path);
        self.content(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        self.record("write", path);
        self.add_parents(path);
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.record("exists", path);
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.record("rename", from);
        if self.failing_renames.lock().unwrap().contains(from) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("rename of {} refused", from),
            )));
        }

        let mut files = self.files.lock().unwrap();
        if files.contains_key(to) {
            return Err(Error::AlreadyExists(to.to_string()));
        }
        let content = files
            .remove(from)
            .ok_or_else(|| Error::NotFound(from.to_string()))?;
        files.insert(to.to_string(), content);
        drop(files);

        self.add_parents(to);
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        self.record("create_folder", path);
        let path = path.trim_end_matches('/');
        self.add_parents(path);
        self.folders.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    async fn folder_exists(&self, path: &str) -> Result<bool> {
        self.record("folder_exists", path);
        Ok(self.has_folder(path))
    }
}

impl FolderProbe for MemoryDocumentStore {
    fn folder_exists(&self, path: &str) -> bool {
        self.record("probe", path);
        self.has_folder(path)
    }
}

/// Geocoder answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    places: HashMap<String, PlaceComponents>,
    queries: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `components`. Lookup ignores case.
    pub fn with_place(mut self, query: &str, components: PlaceComponents) -> Self {
        self.places.insert(query.to_lowercase(), components);
        self
    }

    /// Fail every lookup.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Queries received, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn locate(&self, query: &str) -> Result<Option<PlaceComponents>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(Error::Collaborator(format!("geocoder unavailable for {}", query)));
        }
        Ok(self.places.get(&query.to_lowercase()).cloned())
    }
}
