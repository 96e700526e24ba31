//! Buffer for remote position updates that name shapes we don't know yet.
//!
//! The broadcast channel and the persistence store are independent, so a
//! position update for a freshly created shape can arrive before the shape
//! itself does. Entries are keyed by shape id (last write wins), consumed
//! when the shape loads, and expired after a TTL so a shape that never loads
//! can't pin memory or apply a stale position much later.

#[cfg(test)]
#[path = "pending_test.rs"]
mod pending_test;

use std::collections::HashMap;

use crate::consts::PENDING_TTL_MS;
use crate::shape::{Position, ShapeId};

/// A buffered position update for a not-yet-known shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingUpdate {
    /// The position carried by the update.
    pub position: Position,
    /// When the update was received, in host-clock milliseconds.
    pub received_at_ms: i64,
}

/// Owned map of pending updates keyed by shape id.
pub struct PendingUpdateCache {
    entries: HashMap<ShapeId, PendingUpdate>,
}

impl PendingUpdateCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Buffer (or overwrite) the pending update for `id`. Only the latest
    /// value per id is retained.
    pub fn insert(&mut self, id: ShapeId, position: Position, now_ms: i64) {
        self.entries
            .insert(id, PendingUpdate { position, received_at_ms: now_ms });
    }

    /// Remove and return the pending position for `id`, but only if the
    /// entry is younger than the TTL. An expired entry is removed and never
    /// returned, so a late load can't apply it.
    pub fn take_fresh(&mut self, id: &ShapeId, now_ms: i64) -> Option<Position> {
        let entry = self.entries.remove(id)?;
        if now_ms - entry.received_at_ms > PENDING_TTL_MS {
            return None;
        }
        Some(entry.position)
    }

    /// Drop the pending entry for a deleted shape, if any.
    pub fn remove(&mut self, id: &ShapeId) {
        self.entries.remove(id);
    }

    /// Purge entries older than the TTL. Returns how many were removed.
    /// The host drives this on a coarse interval.
    pub fn sweep(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now_ms - entry.received_at_ms <= PENDING_TTL_MS);
        before - self.entries.len()
    }

    /// Whether a pending entry exists for `id`.
    #[must_use]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of buffered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingUpdateCache {
    fn default() -> Self {
        Self::new()
    }
}
