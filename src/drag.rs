//! Drag lifecycle: the single active drag operation and its side effects.
//!
//! A drag moves every selected shape by the same mouse delta. While it is
//! active, involved shapes carry the locally-dragged marker and their
//! displayed position comes from the optimistic tier. Each `update` writes
//! all optimistic entries before emitting any broadcast send, and sends are
//! throttled per shape on an independent clock so a shape joining mid-drag is
//! not starved by another shape's throttle state. `end` force-sends the final
//! positions, commits them to the store's base records and the authoritative
//! tier, and returns the
//! durable writes for the host to hand to the persistence sync; the marker is
//! kept for a short grace window afterward to absorb in-flight echoes of our
//! own just-committed update.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::consts::{BROADCAST_THROTTLE_MS, DRAG_GRACE_MS};
use crate::shape::{Position, ShapeId, ShapeStore};
use crate::tier::TierMap;

/// Outgoing side of the broadcast channel collaborator. Fire-and-forget;
/// the transport owns batching and delivery.
pub trait BroadcastChannel {
    /// Send one shape's live position to other clients.
    fn send(&mut self, shape_id: ShapeId, position: Position);
}

/// A position the host must persist durably after a drag ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurableWrite {
    pub shape_id: ShapeId,
    pub position: Position,
}

/// The single active drag operation.
#[derive(Debug, Clone)]
pub struct DragOperation {
    /// Fresh id per drag; keys the grace-window release.
    pub operation_id: Uuid,
    /// Mouse position when the drag started.
    pub start_mouse: Position,
    /// Resolved position of every involved shape at drag start. The key set
    /// is the involved set.
    pub start_positions: HashMap<ShapeId, Position>,
}

/// Scheduled removal of the locally-dragged marker after a drag ends.
#[derive(Debug, Clone)]
struct PendingRelease {
    operation_id: Uuid,
    shape_ids: HashSet<ShapeId>,
    due_at_ms: i64,
}

/// Owns the drag state machine: `Idle -> Active -> Idle`.
pub struct DragController {
    op: Option<DragOperation>,
    /// Timestamp and position of the last broadcast send per shape id.
    /// Independent clocks, never global.
    last_sent: HashMap<ShapeId, (i64, Position)>,
    release: Option<PendingRelease>,
}

impl DragController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self { op: None, last_sent: HashMap::new(), release: None }
    }

    /// Whether a drag operation is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.op.is_some()
    }

    /// The active operation, if any.
    #[must_use]
    pub fn operation(&self) -> Option<&DragOperation> {
        self.op.as_ref()
    }

    /// Begin a drag of `selected_ids` from `mouse`. Returns false (staying
    /// Idle) when the selection is empty, none of the ids exist, or an
    /// operation is already active.
    ///
    /// On success every involved shape is marked locally dragged, its remote
    /// tier is cleared so a stale remote value can't fight the upcoming
    /// optimistic one, and any pending grace-window release for it is
    /// canceled and superseded.
    pub fn start(
        &mut self,
        store: &ShapeStore,
        tiers: &mut TierMap,
        selected_ids: &HashSet<ShapeId>,
        mouse: Position,
    ) -> bool {
        if self.op.is_some() || selected_ids.is_empty() {
            return false;
        }

        let mut start_positions = HashMap::new();
        for id in selected_ids {
            if let Some(position) = tiers.resolve(store, id) {
                start_positions.insert(*id, position);
            }
        }
        if start_positions.is_empty() {
            return false;
        }

        if let Some(release) = &mut self.release {
            release.shape_ids.retain(|id| !start_positions.contains_key(id));
            if release.shape_ids.is_empty() {
                self.release = None;
            }
        }

        for id in start_positions.keys() {
            tiers.mark_dragged(*id);
            tiers.clear_remote(id);
            tiers.clear_optimistic(id);
            self.last_sent.remove(id);
        }

        self.op = Some(DragOperation {
            operation_id: Uuid::new_v4(),
            start_mouse: mouse,
            start_positions,
        });
        true
    }

    /// Move the active drag to `mouse`. No-op when idle.
    ///
    /// All optimistic entries are written before any send is emitted, so a
    /// render pull never observes a partially applied step. Shapes deleted
    /// mid-drag are silently omitted. Sends respect the per-shape throttle.
    pub fn update(
        &mut self,
        store: &ShapeStore,
        tiers: &mut TierMap,
        channel: &mut dyn BroadcastChannel,
        mouse: Position,
        now_ms: i64,
    ) {
        let Some(op) = &self.op else {
            return;
        };
        let delta = mouse.delta(op.start_mouse);

        let mut moved: Vec<(ShapeId, Position)> = Vec::with_capacity(op.start_positions.len());
        for (id, start) in &op.start_positions {
            if store.get(id).is_none() {
                continue;
            }
            let position = start.offset(delta);
            tiers.set_optimistic(*id, position);
            moved.push((*id, position));
        }

        for (id, position) in moved {
            let due = self
                .last_sent
                .get(&id)
                .is_none_or(|(last, _)| now_ms - last >= BROADCAST_THROTTLE_MS);
            if due {
                channel.send(id, position);
                self.last_sent.insert(id, (now_ms, position));
            }
        }
    }

    /// Finish the active drag. No-op (empty) when idle.
    ///
    /// Emits one forced, unthrottled send per surviving shape (skipped only
    /// when an identical send already went out at this very instant), commits
    /// the final position into the store's base record and the authoritative
    /// tier, clears the operation and the optimistic tier synchronously, and
    /// schedules the locally-dragged marker for removal after the grace
    /// window. The returned writes are the host's to persist; awaiting them
    /// never blocks the transition to Idle, and the durable ack merely
    /// confirms the authoritative value already written here.
    pub fn end(
        &mut self,
        store: &mut ShapeStore,
        tiers: &mut TierMap,
        channel: &mut dyn BroadcastChannel,
        now_ms: i64,
    ) -> Vec<DurableWrite> {
        let Some(op) = self.op.take() else {
            return Vec::new();
        };

        let mut writes = Vec::with_capacity(op.start_positions.len());
        let mut involved = HashSet::with_capacity(op.start_positions.len());
        for id in op.start_positions.keys() {
            involved.insert(*id);
            let last = self.last_sent.remove(id);
            let Some(position) = tiers.resolve(store, id) else {
                // Deleted mid-drag by another client; nothing to commit.
                debug!(shape_id = %id, "dragged shape vanished before end");
                tiers.clear_optimistic(id);
                continue;
            };
            if last != Some((now_ms, position)) {
                channel.send(*id, position);
            }
            if let Some(shape) = store.get_mut(id) {
                shape.set_position(position);
            }
            tiers.set_authoritative(*id, position);
            tiers.clear_optimistic(id);
            writes.push(DurableWrite { shape_id: *id, position });
        }

        // Keep the marker through the grace window; merge with a release
        // still pending from an earlier drag.
        let due_at_ms = now_ms + DRAG_GRACE_MS;
        match &mut self.release {
            Some(release) => {
                release.operation_id = op.operation_id;
                release.shape_ids.extend(involved);
                release.due_at_ms = due_at_ms;
            }
            None => {
                self.release = Some(PendingRelease {
                    operation_id: op.operation_id,
                    shape_ids: involved,
                    due_at_ms,
                });
            }
        }

        writes
    }

    /// Fire the grace-window release if it is due. The host calls this from
    /// its frame loop; a release canceled by a newer overlapping `start`
    /// never fires for those shapes.
    pub fn tick(&mut self, tiers: &mut TierMap, now_ms: i64) {
        let Some(release) = &self.release else {
            return;
        };
        if now_ms < release.due_at_ms {
            return;
        }
        if let Some(release) = self.release.take() {
            debug!(operation_id = %release.operation_id, "drag grace window elapsed");
            for id in &release.shape_ids {
                tiers.unmark_dragged(id);
            }
        }
    }

    /// Drop a deleted shape from the active operation's bookkeeping.
    pub fn forget(&mut self, id: &ShapeId) {
        if let Some(op) = &mut self.op {
            op.start_positions.remove(id);
        }
        self.last_sent.remove(id);
        if let Some(release) = &mut self.release {
            release.shape_ids.remove(id);
            if release.shape_ids.is_empty() {
                self.release = None;
            }
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}
