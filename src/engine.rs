//! Top-level reconciliation engine.
//!
//! `SyncEngine` is the single owned state object: it holds the shape store,
//! the position tiers, the pending-update cache, the realtime ingest, the
//! drag controller, and the presence channel, and wires them together. All
//! mutation happens synchronously on the caller's thread; the host feeds it
//! transport callbacks and UI events and pulls resolved positions for
//! rendering. Resolved values are a snapshot valid only until the next
//! mutation.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;

use crate::drag::{BroadcastChannel, DragController, DurableWrite};
use crate::ingest::{IngestOutcome, RealtimeIngest};
use crate::pending::PendingUpdateCache;
use crate::presence::PresenceChannel;
use crate::shape::{PartialShape, Position, Shape, ShapeId, ShapeStore};
use crate::tier::TierMap;

/// Client-side reconciliation core for one board.
pub struct SyncEngine {
    pub store: ShapeStore,
    pub tiers: TierMap,
    pub pending: PendingUpdateCache,
    pub ingest: RealtimeIngest,
    pub drag: DragController,
    pub presence: PresenceChannel,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self {
            store: ShapeStore::new(),
            tiers: TierMap::new(),
            pending: PendingUpdateCache::new(),
            ingest: RealtimeIngest::new(),
            drag: DragController::new(),
            presence: PresenceChannel::new(),
        }
    }
}

impl SyncEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Persistence inputs ---

    /// Hydrate from a bulk load: replaces the shapes and the authoritative
    /// tier wholesale. A fresh pending update buffered for a loaded shape is
    /// applied to its base record and consumed.
    pub fn on_bulk_load(&mut self, mut shapes: Vec<Shape>, now_ms: i64) {
        for shape in &mut shapes {
            if let Some(position) = self.pending.take_fresh(&shape.id, now_ms) {
                shape.set_position(position);
            }
            self.ingest.forget(&shape.id);
        }
        self.tiers
            .replace_authoritative(shapes.iter().map(|s| (s.id, s.position())));
        self.store.load_snapshot(shapes);
    }

    /// Apply a shape creation (local or broadcast by the server). A fresh
    /// pending update for the id is applied to the base record and consumed.
    pub fn apply_create(&mut self, mut shape: Shape, now_ms: i64) {
        if let Some(position) = self.pending.take_fresh(&shape.id, now_ms) {
            shape.set_position(position);
        }
        self.ingest.forget(&shape.id);
        self.store.insert(shape);
    }

    /// Apply a sparse property edit. Returns false for a stale id (no-op).
    pub fn apply_update(&mut self, id: &ShapeId, fields: &PartialShape) -> bool {
        self.store.apply_partial(id, fields)
    }

    /// Apply a shape deletion: drops the shape, its selection membership,
    /// tier record, dragged marker, pending entry, and drag bookkeeping.
    /// Returns false for a stale id (no-op).
    pub fn apply_delete(&mut self, id: &ShapeId) -> bool {
        let existed = self.store.remove(id).is_some();
        self.tiers.remove(id);
        self.pending.remove(id);
        self.ingest.forget(id);
        self.drag.forget(id);
        existed
    }

    // --- Realtime inputs ---

    /// Apply one broadcast position batch from other users.
    pub fn ingest_remote(&mut self, updates: &HashMap<ShapeId, Position>, now_ms: i64) -> IngestOutcome {
        self.ingest
            .apply(&self.store, &mut self.tiers, &mut self.pending, updates, now_ms)
    }

    // --- Drag lifecycle ---

    /// Begin dragging the current selection. Returns false when the
    /// selection is empty or a drag is already active.
    pub fn drag_start(&mut self, mouse: Position) -> bool {
        let selected = self.store.selected().clone();
        self.drag.start(&self.store, &mut self.tiers, &selected, mouse)
    }

    /// Move the active drag; writes optimistic positions and emits throttled
    /// sends. No-op when idle.
    pub fn drag_update(&mut self, channel: &mut dyn BroadcastChannel, mouse: Position, now_ms: i64) {
        self.drag
            .update(&self.store, &mut self.tiers, channel, mouse, now_ms);
    }

    /// Finish the active drag; force-sends final positions and returns the
    /// durable writes for the host to persist. No-op (empty) when idle.
    pub fn drag_end(&mut self, channel: &mut dyn BroadcastChannel, now_ms: i64) -> Vec<DurableWrite> {
        self.drag.end(&mut self.store, &mut self.tiers, channel, now_ms)
    }

    // --- Periodic work ---

    /// Frame-loop tick: fires the due drag grace-window release and expires
    /// stale remote cursors.
    pub fn tick(&mut self, now_ms: i64) {
        self.drag.tick(&mut self.tiers, now_ms);
        self.presence.expire(now_ms);
    }

    /// Coarse-interval sweep of the pending-update cache. Returns how many
    /// entries were purged.
    pub fn sweep_pending(&mut self, now_ms: i64) -> usize {
        self.pending.sweep(now_ms)
    }

    // --- Queries ---

    /// Resolve the displayed position for one shape.
    #[must_use]
    pub fn resolve(&self, id: &ShapeId) -> Option<Position> {
        self.tiers.resolve(&self.store, id)
    }

    /// Resolve the displayed position of every known shape.
    #[must_use]
    pub fn resolve_all(&self) -> Vec<(ShapeId, Position)> {
        self.tiers.resolve_all(&self.store)
    }
}
