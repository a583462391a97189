//! # elo-core
//!
//! Structured-metadata reconciliation for Markdown vaults.
//!
//! This crate holds the pure rules: the metadata block codec, merge
//! policies, the place hierarchy path builder, block identifiers and the
//! sidecar shape. I/O goes through the collaborator traits in [`traits`];
//! concrete stores live in `elo-vault`.

pub mod blocks;
pub mod defaults;
pub mod error;
pub mod frontmatter;
pub mod headings;
pub mod logging;
pub mod merge;
pub mod place;
pub mod traits;
pub mod value;

// Re-export commonly used types at crate root
pub use blocks::{
    difficulty_level, ensure_block_id, ensure_unique_block_id, importance_to_stars, sidecar_path,
    DifficultyLevel, FileMetadata, HeaderFieldConfig, HeaderMetadata, HeadingRef, HEADER_FIELDS,
};
pub use error::{Error, Result};
pub use merge::{
    apply_forced_updates, merge_suggestions, merge_template_and_current, MergeOutcome,
    MergeSource,
};
pub use place::{FolderProbe, PlaceComponents, PlaceHierarchyConfig, PlacePathBuilder};
pub use traits::*;
pub use value::{MetadataMap, MetadataValue};
