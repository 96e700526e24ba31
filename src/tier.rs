//! Position tiers: per-shape reconciliation of the three position sources.
//!
//! Each shape id maps to a single record with up to three optional positions:
//! `authoritative` (from the persistence sync), `remote` (from another user's
//! live broadcast), and `optimistic` (from the local user's in-progress
//! drag). `resolve` collapses the record into the one position the renderer
//! should draw, with priority optimistic > remote > authoritative > stored
//! base position.
//!
//! The locally-dragged marker lives here too: while a shape carries it, the
//! optimistic tier has exclusive priority and the realtime ingest refuses to
//! write the remote tier for it.

#[cfg(test)]
#[path = "tier_test.rs"]
mod tier_test;

use std::collections::{HashMap, HashSet};

use crate::shape::{Position, ShapeId, ShapeStore};

/// Per-shape tier record. Absent fields fall through to the next tier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionTiers {
    /// Position from the durable persistence store.
    pub authoritative: Option<Position>,
    /// Position from another user's live broadcast update.
    pub remote: Option<Position>,
    /// Position from the local user's in-progress drag.
    pub optimistic: Option<Position>,
}

impl PositionTiers {
    fn is_empty(self) -> bool {
        self.authoritative.is_none() && self.remote.is_none() && self.optimistic.is_none()
    }
}

/// All tier records plus the locally-dragged marker set.
pub struct TierMap {
    tiers: HashMap<ShapeId, PositionTiers>,
    dragged: HashSet<ShapeId>,
}

impl TierMap {
    /// Create an empty tier map.
    #[must_use]
    pub fn new() -> Self {
        Self { tiers: HashMap::new(), dragged: HashSet::new() }
    }

    // --- Resolution ---

    /// Resolve the displayed position for `id`. Pure and side-effect-free.
    ///
    /// Priority: optimistic (only while locally dragged) > remote >
    /// authoritative > the shape's stored base position. Returns `None` only
    /// when the shape is unknown to the store.
    #[must_use]
    pub fn resolve(&self, store: &ShapeStore, id: &ShapeId) -> Option<Position> {
        let shape = store.get(id)?;
        let tiers = self.tiers.get(id);
        if self.dragged.contains(id) {
            if let Some(position) = tiers.and_then(|t| t.optimistic) {
                return Some(position);
            }
        }
        if let Some(position) = tiers.and_then(|t| t.remote) {
            return Some(position);
        }
        if let Some(position) = tiers.and_then(|t| t.authoritative) {
            return Some(position);
        }
        Some(shape.position())
    }

    /// Project every shape in the store through [`TierMap::resolve`].
    #[must_use]
    pub fn resolve_all(&self, store: &ShapeStore) -> Vec<(ShapeId, Position)> {
        store
            .ids()
            .filter_map(|id| self.resolve(store, id).map(|p| (*id, p)))
            .collect()
    }

    /// The raw tier record for `id`, if any tier is populated.
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&PositionTiers> {
        self.tiers.get(id)
    }

    // --- Tier writers ---

    /// Set the authoritative tier for one shape.
    pub fn set_authoritative(&mut self, id: ShapeId, position: Position) {
        self.tiers.entry(id).or_default().authoritative = Some(position);
    }

    /// Replace the authoritative tier wholesale from a bulk load. Remote and
    /// optimistic entries are left alone; records emptied by the replacement
    /// are dropped.
    pub fn replace_authoritative(&mut self, entries: impl Iterator<Item = (ShapeId, Position)>) {
        for record in self.tiers.values_mut() {
            record.authoritative = None;
        }
        for (id, position) in entries {
            self.tiers.entry(id).or_default().authoritative = Some(position);
        }
        self.tiers.retain(|_, record| !record.is_empty());
    }

    /// Write the remote tier for one shape. Returns false when the value is
    /// identical to the current remote entry, making duplicate delivery a
    /// visible no-op.
    pub fn set_remote(&mut self, id: ShapeId, position: Position) -> bool {
        let record = self.tiers.entry(id).or_default();
        if record.remote == Some(position) {
            return false;
        }
        record.remote = Some(position);
        true
    }

    /// Clear the remote tier for one shape.
    pub fn clear_remote(&mut self, id: &ShapeId) {
        if let Some(record) = self.tiers.get_mut(id) {
            record.remote = None;
            if record.is_empty() {
                self.tiers.remove(id);
            }
        }
    }

    /// Write the optimistic tier for one shape.
    pub fn set_optimistic(&mut self, id: ShapeId, position: Position) {
        self.tiers.entry(id).or_default().optimistic = Some(position);
    }

    /// Clear the optimistic tier for one shape.
    pub fn clear_optimistic(&mut self, id: &ShapeId) {
        if let Some(record) = self.tiers.get_mut(id) {
            record.optimistic = None;
            if record.is_empty() {
                self.tiers.remove(id);
            }
        }
    }

    /// Drop all state for a deleted shape, including its dragged marker.
    pub fn remove(&mut self, id: &ShapeId) {
        self.tiers.remove(id);
        self.dragged.remove(id);
    }

    // --- Locally-dragged marker ---

    /// Mark a shape as locally dragged, giving the optimistic tier exclusive
    /// priority and blocking remote-tier writes.
    pub fn mark_dragged(&mut self, id: ShapeId) {
        self.dragged.insert(id);
    }

    /// Remove the locally-dragged marker from a shape.
    pub fn unmark_dragged(&mut self, id: &ShapeId) {
        self.dragged.remove(id);
    }

    /// Whether a shape currently carries the locally-dragged marker.
    #[must_use]
    pub fn is_dragged(&self, id: &ShapeId) -> bool {
        self.dragged.contains(id)
    }
}

impl Default for TierMap {
    fn default() -> Self {
        Self::new()
    }
}
