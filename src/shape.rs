//! Shape model: board shapes, the canonical shape store, selection, and z-order.
//!
//! This module defines the core data types that describe what is on the board
//! (`Shape`, `ShapeKind`), a sparse-update type for incremental edits
//! (`PartialShape`), and the runtime store that owns all live shapes and the
//! selection set (`ShapeStore`).
//!
//! Data flows into this layer from the persistence sync (bulk loads, applied
//! broadcasts) and from the drag controller (committed positions). The
//! rendering layer reads from it through the position resolver and
//! `sorted_shapes` for draw order.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a shape.
pub type ShapeId = Uuid;

/// Unique identifier for a user.
pub type UserId = Uuid;

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta(self, other: Self) -> Self {
        Self { x: self.x - other.x, y: self.y - other.y }
    }

    /// This position translated by `delta`.
    #[must_use]
    pub fn offset(self, delta: Self) -> Self {
        Self { x: self.x + delta.x, y: self.y + delta.y }
    }
}

/// The kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rect,
    /// Text block.
    Text,
    /// Ellipse inscribed within the bounding box.
    Ellipse,
    /// Diamond (rhombus) with vertices at bounding-box edge midpoints.
    Diamond,
    /// Five-point star inscribed within the bounding box.
    Star,
    /// Straight line segment.
    Line,
    /// Directed arrow.
    Arrow,
}

/// A shape as stored in the document and on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Unique identifier for this shape.
    pub id: ShapeId,
    /// Shape type tag.
    pub kind: ShapeKind,
    /// Left edge of the bounding box in world coordinates.
    pub x: f64,
    /// Top edge of the bounding box in world coordinates.
    pub y: f64,
    /// Width of the bounding box in world coordinates.
    pub width: f64,
    /// Height of the bounding box in world coordinates.
    pub height: f64,
    /// Clockwise rotation in degrees around the bounding-box center.
    pub rotation: f64,
    /// Uniform scale factor (1.0 = unscaled).
    pub scale: f64,
    /// Stacking order; lower values are drawn beneath higher values.
    pub z_index: i64,
    /// Open-ended per-kind style properties (fill, stroke, text, etc.).
    pub props: serde_json::Value,
    /// User who created the shape, if known.
    pub created_by: Option<UserId>,
    /// Milliseconds since the Unix epoch when the shape was created.
    pub created_at: i64,
}

impl Shape {
    /// The shape's stored base position (top-left of the bounding box).
    #[must_use]
    pub fn position(&self) -> Position {
        Position { x: self.x, y: self.y }
    }

    /// Move the shape's stored base position.
    pub fn set_position(&mut self, position: Position) {
        self.x = position.x;
        self.y = position.y;
    }
}

/// Sparse update for a shape. Only present fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialShape {
    /// New x position, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// New y position, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New width, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New height, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New rotation in degrees, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// New scale factor, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// New z-index, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i64>,
    /// Props keys to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

impl PartialShape {
    /// A partial update that only moves the shape to `position`.
    #[must_use]
    pub fn move_to(position: Position) -> Self {
        Self { x: Some(position.x), y: Some(position.y), ..Self::default() }
    }
}

/// In-memory store of shapes plus the selection set.
///
/// Invariant: every id in the selection refers to a shape in the store. The
/// selection is pruned whenever a shape is removed.
pub struct ShapeStore {
    shapes: HashMap<ShapeId, Shape>,
    selection: HashSet<ShapeId>,
}

impl ShapeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { shapes: HashMap::new(), selection: HashSet::new() }
    }

    // --- Shape CRUD ---

    /// Insert or replace a shape. If a shape with the same `id` already
    /// exists it is overwritten.
    pub fn insert(&mut self, shape: Shape) {
        self.shapes.insert(shape.id, shape);
    }

    /// Remove a shape by id, returning it if it was present. Prunes the
    /// selection set.
    pub fn remove(&mut self, id: &ShapeId) -> Option<Shape> {
        self.selection.remove(id);
        self.shapes.remove(id)
    }

    /// Return a reference to a shape by id.
    #[must_use]
    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Return a mutable reference to a shape by id.
    pub fn get_mut(&mut self, id: &ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id)
    }

    /// Apply a partial update to an existing shape. Returns false if the
    /// shape doesn't exist.
    pub fn apply_partial(&mut self, id: &ShapeId, partial: &PartialShape) -> bool {
        let Some(shape) = self.shapes.get_mut(id) else {
            return false;
        };
        if let Some(x) = partial.x {
            shape.x = x;
        }
        if let Some(y) = partial.y {
            shape.y = y;
        }
        if let Some(w) = partial.width {
            shape.width = w;
        }
        if let Some(h) = partial.height {
            shape.height = h;
        }
        if let Some(r) = partial.rotation {
            shape.rotation = r;
        }
        if let Some(s) = partial.scale {
            shape.scale = s;
        }
        if let Some(z) = partial.z_index {
            shape.z_index = z;
        }
        if let Some(ref props) = partial.props {
            let Some(incoming) = props.as_object() else {
                return false;
            };

            if !shape.props.is_object() {
                shape.props = serde_json::json!({});
            }

            if let Some(existing) = shape.props.as_object_mut() {
                for (k, v) in incoming {
                    if v.is_null() {
                        existing.remove(k);
                    } else {
                        existing.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        true
    }

    /// Replace all shapes with a full snapshot. The selection is pruned to
    /// ids present in the snapshot.
    pub fn load_snapshot(&mut self, shapes: Vec<Shape>) {
        self.shapes.clear();
        for shape in shapes {
            self.shapes.insert(shape.id, shape);
        }
        let shapes = &self.shapes;
        self.selection.retain(|id| shapes.contains_key(id));
    }

    // --- Queries ---

    /// Return all shapes sorted by `(z_index, id)` for draw order.
    #[must_use]
    pub fn sorted_shapes(&self) -> Vec<&Shape> {
        let mut shapes: Vec<&Shape> = self.shapes.values().collect();
        shapes.sort_by(|a, b| a.z_index.cmp(&b.z_index).then_with(|| a.id.cmp(&b.id)));
        shapes
    }

    /// Iterate over all shape ids.
    pub fn ids(&self) -> impl Iterator<Item = &ShapeId> {
        self.shapes.keys()
    }

    /// Number of shapes currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the store contains no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    // --- Selection ---

    /// Replace the selection with the single shape `id`. Returns false if
    /// the shape doesn't exist.
    pub fn select(&mut self, id: &ShapeId) -> bool {
        if !self.shapes.contains_key(id) {
            return false;
        }
        self.selection.clear();
        self.selection.insert(*id);
        true
    }

    /// Toggle membership of `id` in the selection. Returns false if the
    /// shape doesn't exist.
    pub fn toggle_selection(&mut self, id: &ShapeId) -> bool {
        if !self.shapes.contains_key(id) {
            return false;
        }
        if !self.selection.remove(id) {
            self.selection.insert(*id);
        }
        true
    }

    /// Add `id` to the selection. Returns false if the shape doesn't exist.
    pub fn add_to_selection(&mut self, id: &ShapeId) -> bool {
        if !self.shapes.contains_key(id) {
            return false;
        }
        self.selection.insert(*id);
        true
    }

    /// Select every shape in the store.
    pub fn select_all(&mut self) {
        self.selection = self.shapes.keys().copied().collect();
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The currently selected shape ids.
    #[must_use]
    pub fn selected(&self) -> &HashSet<ShapeId> {
        &self.selection
    }

    /// Whether `id` is currently selected.
    #[must_use]
    pub fn is_selected(&self, id: &ShapeId) -> bool {
        self.selection.contains(id)
    }

    // --- Z-order ---

    /// Selected ids ordered by `(z_index, id)`, lowest first.
    fn selected_by_z(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self.selection.iter().copied().collect();
        ids.sort_by_key(|id| {
            self.shapes
                .get(id)
                .map_or((i64::MAX, *id), |s| (s.z_index, s.id))
        });
        ids
    }

    /// Move the selected shapes above everything else, preserving their
    /// relative order among themselves. Returns false if nothing is selected.
    #[allow(clippy::cast_possible_wrap)]
    pub fn bring_to_front(&mut self) -> bool {
        let Some(max) = self.shapes.values().map(|s| s.z_index).max() else {
            return false;
        };
        let selected = self.selected_by_z();
        if selected.is_empty() {
            return false;
        }
        for (offset, id) in selected.iter().enumerate() {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.z_index = max + 1 + offset as i64;
            }
        }
        true
    }

    /// Move the selected shapes below everything else, preserving their
    /// relative order among themselves. Returns false if nothing is selected.
    #[allow(clippy::cast_possible_wrap)]
    pub fn send_to_back(&mut self) -> bool {
        let Some(min) = self.shapes.values().map(|s| s.z_index).min() else {
            return false;
        };
        let selected = self.selected_by_z();
        if selected.is_empty() {
            return false;
        }
        let count = selected.len() as i64;
        for (offset, id) in selected.iter().enumerate() {
            if let Some(shape) = self.shapes.get_mut(id) {
                shape.z_index = min - count + offset as i64;
            }
        }
        true
    }

    /// Swap each selected shape with its nearest unselected neighbor above.
    /// Returns false if nothing moved.
    pub fn move_forward(&mut self) -> bool {
        let selected = self.selected_by_z();
        let mut moved = false;
        // Top-most first, so a multi-selection doesn't leapfrog itself.
        for id in selected.iter().rev() {
            let Some(current) = self.shapes.get(id).map(|s| s.z_index) else {
                continue;
            };
            let neighbor = self
                .shapes
                .values()
                .filter(|s| !self.selection.contains(&s.id) && s.z_index > current)
                .min_by_key(|s| (s.z_index, s.id))
                .map(|s| (s.id, s.z_index));
            if let Some((neighbor_id, neighbor_z)) = neighbor {
                if let Some(shape) = self.shapes.get_mut(&neighbor_id) {
                    shape.z_index = current;
                }
                if let Some(shape) = self.shapes.get_mut(id) {
                    shape.z_index = neighbor_z;
                }
                moved = true;
            }
        }
        moved
    }

    /// Swap each selected shape with its nearest unselected neighbor below.
    /// Returns false if nothing moved.
    pub fn move_backward(&mut self) -> bool {
        let selected = self.selected_by_z();
        let mut moved = false;
        // Bottom-most first, so a multi-selection doesn't leapfrog itself.
        for id in &selected {
            let Some(current) = self.shapes.get(id).map(|s| s.z_index) else {
                continue;
            };
            let neighbor = self
                .shapes
                .values()
                .filter(|s| !self.selection.contains(&s.id) && s.z_index < current)
                .max_by_key(|s| (s.z_index, s.id))
                .map(|s| (s.id, s.z_index));
            if let Some((neighbor_id, neighbor_z)) = neighbor {
                if let Some(shape) = self.shapes.get_mut(&neighbor_id) {
                    shape.z_index = current;
                }
                if let Some(shape) = self.shapes.get_mut(id) {
                    shape.z_index = neighbor_z;
                }
                moved = true;
            }
        }
        moved
    }
}

impl Default for ShapeStore {
    fn default() -> Self {
        Self::new()
    }
}
