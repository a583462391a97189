//! Structured logging field name constants for elo.
//!
//! These constants name the fields that `tracing` call sites in both crates
//! write literally, so log output can be filtered by the same field names
//! regardless of which layer emitted the event. Keep them in step with the
//! call sites.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation aborted, document left partially updated |
//! | WARN  | Recoverable issue, fallback applied (unparsable sidecar, failed sidecar rename) |
//! | INFO  | Completed user-visible operations (document moved, ids added) |
//! | DEBUG | Decision points (region inclusion, dirty checks, merge outcomes) |
//! | TRACE | Per-item iteration (headings, keys) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "codec", "merge", "place", "blocks", "vault"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "parse", "sync_metadata", "organize_place"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Vault-relative path of the document being operated on.
pub const DOC_PATH: &str = "doc_path";

/// Vault-relative path of a sidecar file.
pub const SIDECAR_PATH: &str = "sidecar_path";

/// Block identifier.
pub const BLOCK_ID: &str = "block_id";

/// Computed target path for a move.
pub const TARGET_PATH: &str = "target_path";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Number of keys changed by a merge.
pub const CHANGED_KEYS: &str = "changed_keys";

/// Number of block ids handled by a sync.
pub const BLOCK_COUNT: &str = "block_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
