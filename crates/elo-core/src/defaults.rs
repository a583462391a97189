//! Centralized default constants for elo.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration structs fall back to these when a setting is absent.

// =============================================================================
// METADATA BLOCK
// =============================================================================

/// Line that opens and closes the metadata block.
pub const BLOCK_SENTINEL: &str = "---";

// =============================================================================
// DOCUMENTS & SIDECARS
// =============================================================================

/// Extension of documents whose sidecars follow renames.
pub const MANAGED_EXTENSION: &str = "md";

/// Extension of per-document sidecar files.
pub const SIDECAR_EXTENSION: &str = "json";

/// Length of generated block identifiers.
pub const BLOCK_ID_LEN: usize = 6;

/// Attempts made by `ensure_unique_block_id` before giving up on a fresh token.
pub const BLOCK_ID_MAX_ATTEMPTS: usize = 32;

// =============================================================================
// PLACE HIERARCHY
// =============================================================================

/// Top-level folder under which place documents are filed.
pub const PLACES_ROOT: &str = "Places";

/// Country whose regions are always included in the hierarchy.
pub const HOME_COUNTRY: &str = "Spain";

/// Suffix appended to a city document whose name collides with its province.
pub const CITY_SUFFIX: &str = "(City)";
