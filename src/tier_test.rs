#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::shape::{Shape, ShapeKind};

fn make_shape_at(x: f64, y: f64) -> Shape {
    Shape {
        id: Uuid::new_v4(),
        kind: ShapeKind::Rect,
        x,
        y,
        width: 100.0,
        height: 80.0,
        rotation: 0.0,
        scale: 1.0,
        z_index: 0,
        props: json!({}),
        created_by: None,
        created_at: 0,
    }
}

fn store_with(shape: Shape) -> ShapeStore {
    let mut store = ShapeStore::new();
    store.insert(shape);
    store
}

// =============================================================
// Resolution priority
// =============================================================

#[test]
fn resolve_unknown_shape_is_none() {
    let store = ShapeStore::new();
    let tiers = TierMap::new();
    assert!(tiers.resolve(&store, &Uuid::new_v4()).is_none());
}

#[test]
fn resolve_falls_back_to_base_position() {
    let shape = make_shape_at(10.0, 10.0);
    let id = shape.id;
    let store = store_with(shape);
    let tiers = TierMap::new();
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(10.0, 10.0)));
}

#[test]
fn authoritative_beats_base() {
    let shape = make_shape_at(10.0, 10.0);
    let id = shape.id;
    let store = store_with(shape);
    let mut tiers = TierMap::new();
    tiers.set_authoritative(id, Position::new(20.0, 20.0));
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(20.0, 20.0)));
}

#[test]
fn remote_beats_authoritative() {
    let shape = make_shape_at(10.0, 10.0);
    let id = shape.id;
    let store = store_with(shape);
    let mut tiers = TierMap::new();
    tiers.set_authoritative(id, Position::new(20.0, 20.0));
    tiers.set_remote(id, Position::new(30.0, 30.0));
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(30.0, 30.0)));
}

#[test]
fn optimistic_wins_only_while_dragged() {
    let shape = make_shape_at(10.0, 10.0);
    let id = shape.id;
    let store = store_with(shape);
    let mut tiers = TierMap::new();
    tiers.set_remote(id, Position::new(30.0, 30.0));
    tiers.set_optimistic(id, Position::new(40.0, 40.0));

    // Not dragged: optimistic entry is ignored.
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(30.0, 30.0)));

    tiers.mark_dragged(id);
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(40.0, 40.0)));
}

#[test]
fn dragged_without_optimistic_falls_through() {
    let shape = make_shape_at(10.0, 10.0);
    let id = shape.id;
    let store = store_with(shape);
    let mut tiers = TierMap::new();
    tiers.mark_dragged(id);
    tiers.set_authoritative(id, Position::new(20.0, 20.0));
    assert_eq!(tiers.resolve(&store, &id), Some(Position::new(20.0, 20.0)));
}

#[test]
fn resolve_all_projects_every_shape() {
    let a = make_shape_at(1.0, 1.0);
    let b = make_shape_at(2.0, 2.0);
    let (a_id, b_id) = (a.id, b.id);
    let mut store = ShapeStore::new();
    store.insert(a);
    store.insert(b);
    let mut tiers = TierMap::new();
    tiers.set_remote(a_id, Position::new(9.0, 9.0));

    let mut all = tiers.resolve_all(&store);
    all.sort_by_key(|(id, _)| *id);
    let mut expected = vec![
        (a_id, Position::new(9.0, 9.0)),
        (b_id, Position::new(2.0, 2.0)),
    ];
    expected.sort_by_key(|(id, _)| *id);
    assert_eq!(all, expected);
}

// =============================================================
// Tier writers
// =============================================================

#[test]
fn set_remote_identical_value_is_noop() {
    let mut tiers = TierMap::new();
    let id = Uuid::new_v4();
    assert!(tiers.set_remote(id, Position::new(5.0, 5.0)));
    assert!(!tiers.set_remote(id, Position::new(5.0, 5.0)));
    assert!(tiers.set_remote(id, Position::new(6.0, 5.0)));
}

#[test]
fn clear_remote_prunes_empty_record() {
    let mut tiers = TierMap::new();
    let id = Uuid::new_v4();
    tiers.set_remote(id, Position::new(5.0, 5.0));
    assert!(tiers.get(&id).is_some());
    tiers.clear_remote(&id);
    assert!(tiers.get(&id).is_none());
}

#[test]
fn clear_optimistic_keeps_other_tiers() {
    let mut tiers = TierMap::new();
    let id = Uuid::new_v4();
    tiers.set_authoritative(id, Position::new(1.0, 1.0));
    tiers.set_optimistic(id, Position::new(2.0, 2.0));
    tiers.clear_optimistic(&id);
    let record = tiers.get(&id).unwrap();
    assert_eq!(record.authoritative, Some(Position::new(1.0, 1.0)));
    assert!(record.optimistic.is_none());
}

#[test]
fn replace_authoritative_is_wholesale() {
    let mut tiers = TierMap::new();
    let stale = Uuid::new_v4();
    let kept = Uuid::new_v4();
    let loaded = Uuid::new_v4();
    tiers.set_authoritative(stale, Position::new(1.0, 1.0));
    tiers.set_authoritative(kept, Position::new(2.0, 2.0));
    tiers.set_remote(kept, Position::new(3.0, 3.0));

    tiers.replace_authoritative(
        [(kept, Position::new(4.0, 4.0)), (loaded, Position::new(5.0, 5.0))].into_iter(),
    );

    // The shape absent from the load lost its record entirely.
    assert!(tiers.get(&stale).is_none());
    let record = tiers.get(&kept).unwrap();
    assert_eq!(record.authoritative, Some(Position::new(4.0, 4.0)));
    assert_eq!(record.remote, Some(Position::new(3.0, 3.0)));
    assert_eq!(tiers.get(&loaded).unwrap().authoritative, Some(Position::new(5.0, 5.0)));
}

#[test]
fn remove_drops_record_and_marker() {
    let mut tiers = TierMap::new();
    let id = Uuid::new_v4();
    tiers.set_remote(id, Position::new(1.0, 1.0));
    tiers.mark_dragged(id);
    tiers.remove(&id);
    assert!(tiers.get(&id).is_none());
    assert!(!tiers.is_dragged(&id));
}

#[test]
fn marker_lifecycle() {
    let mut tiers = TierMap::new();
    let id = Uuid::new_v4();
    assert!(!tiers.is_dragged(&id));
    tiers.mark_dragged(id);
    assert!(tiers.is_dragged(&id));
    tiers.unmark_dragged(&id);
    assert!(!tiers.is_dragged(&id));
}
