//! # elo-vault
//!
//! Vault-facing layer of elo: document stores, block metadata sidecars,
//! configuration, tracing setup and the document-level workflows.

pub mod block_store;
pub mod config;
pub mod fs_store;
pub mod memory;
pub mod telemetry;
pub mod workflows;

// Re-export commonly used types at crate root
pub use block_store::{is_managed, BlockMetadataStore};
pub use config::{ConfigError, ConfigResult, VaultConfig};
pub use fs_store::FilesystemStore;
pub use memory::{MemoryDocumentStore, StaticGeocoder};
pub use telemetry::init_tracing;
pub use workflows::HeaderMetadataReport;
