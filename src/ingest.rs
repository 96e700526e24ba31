//! Realtime ingest: applying broadcast position batches from other users.
//!
//! The broadcast channel offers no ordering or delivery guarantee, so this
//! layer must behave correctly under arbitrary reordering and duplication:
//! remote writes are last-write-wins and idempotent. Two filters apply on the
//! way in. A shape the local user is dragging rejects remote writes outright
//! (the anti-jitter rule — the echo of our own throttled sends must not fight
//! the optimistic tier). A shape we don't know yet is buffered in the pending
//! cache rather than treated as an error, since arrival before the create is
//! expected in a two-channel system.

#[cfg(test)]
#[path = "ingest_test.rs"]
mod ingest_test;

use std::collections::HashMap;

use tracing::debug;

use crate::consts::UNKNOWN_SHAPE_LOG_THROTTLE_MS;
use crate::pending::PendingUpdateCache;
use crate::shape::{Position, ShapeId, ShapeStore};
use crate::tier::TierMap;

/// Per-batch accounting of what happened to each update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Updates written to the remote tier.
    pub applied: usize,
    /// Updates dropped because the shape is locally dragged.
    pub dropped: usize,
    /// Updates buffered because the shape is not yet known.
    pub deferred: usize,
}

/// Receives broadcast position batches and routes each entry to the remote
/// tier or the pending cache.
pub struct RealtimeIngest {
    /// Last unknown-shape diagnostic per shape id, for log throttling.
    last_unknown_log: HashMap<ShapeId, i64>,
}

impl RealtimeIngest {
    /// Create an ingest with no diagnostic history.
    #[must_use]
    pub fn new() -> Self {
        Self { last_unknown_log: HashMap::new() }
    }

    /// Apply one broadcast batch.
    ///
    /// Known and not locally dragged: write the remote tier (idempotent,
    /// last write wins). Known and locally dragged: silently dropped.
    /// Unknown: buffer in the pending cache and emit a diagnostic at most
    /// once per shape per throttle window.
    pub fn apply(
        &mut self,
        store: &ShapeStore,
        tiers: &mut TierMap,
        pending: &mut PendingUpdateCache,
        updates: &HashMap<ShapeId, Position>,
        now_ms: i64,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        for (&id, &position) in updates {
            if store.get(&id).is_some() {
                if tiers.is_dragged(&id) {
                    outcome.dropped += 1;
                } else {
                    tiers.set_remote(id, position);
                    outcome.applied += 1;
                }
            } else {
                pending.insert(id, position, now_ms);
                outcome.deferred += 1;
                let due = self
                    .last_unknown_log
                    .get(&id)
                    .is_none_or(|last| now_ms - last >= UNKNOWN_SHAPE_LOG_THROTTLE_MS);
                if due {
                    debug!(shape_id = %id, "position update for unknown shape; buffering");
                    self.last_unknown_log.insert(id, now_ms);
                }
            }
        }
        outcome
    }

    /// Forget diagnostic history for a shape that became known or was
    /// deleted.
    pub fn forget(&mut self, id: &ShapeId) {
        self.last_unknown_log.remove(id);
    }
}

impl Default for RealtimeIngest {
    fn default() -> Self {
        Self::new()
    }
}
