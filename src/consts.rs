//! Shared timing constants for the reconciliation core.
//!
//! All intervals are in milliseconds; the host supplies the clock.

// ── Outgoing broadcast ──────────────────────────────────────────

/// Minimum interval between position sends for a single shape (≈60 Hz).
/// The throttle clock is tracked per shape id, never globally.
pub const BROADCAST_THROTTLE_MS: i64 = 16;

/// How long the locally-dragged marker outlives a finished drag. Absorbs
/// in-flight echoes of the client's own just-committed position.
pub const DRAG_GRACE_MS: i64 = 500;

// ── Pending-update cache ────────────────────────────────────────

/// Maximum age of a buffered update for a not-yet-known shape. Entries older
/// than this are never applied, even if the shape loads afterwards.
pub const PENDING_TTL_MS: i64 = 30_000;

/// Suggested cadence for the host to run [`crate::pending::PendingUpdateCache::sweep`].
pub const PENDING_SWEEP_INTERVAL_MS: i64 = 60_000;

/// Minimum interval between unknown-shape diagnostics for a single shape id.
pub const UNKNOWN_SHAPE_LOG_THROTTLE_MS: i64 = 5_000;

// ── Presence ────────────────────────────────────────────────────

/// Minimum interval between cursor-position sends (≈30 Hz).
pub const CURSOR_THROTTLE_MS: i64 = 33;

/// A remote cursor unrefreshed for this long is dropped.
pub const CURSOR_EXPIRY_MS: i64 = 4_000;
