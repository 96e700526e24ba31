#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::consts::{CURSOR_EXPIRY_MS, CURSOR_THROTTLE_MS};

// =============================================================
// Local send throttle
// =============================================================

#[test]
fn first_local_move_sends_immediately() {
    let mut presence = PresenceChannel::new();
    assert_eq!(
        presence.update_local(Position::new(1.0, 1.0), 0),
        Some(Position::new(1.0, 1.0))
    );
}

#[test]
fn local_moves_inside_window_are_skipped() {
    let mut presence = PresenceChannel::new();
    presence.update_local(Position::new(1.0, 1.0), 0);
    assert!(presence.update_local(Position::new(2.0, 2.0), CURSOR_THROTTLE_MS - 1).is_none());
    assert_eq!(
        presence.update_local(Position::new(3.0, 3.0), CURSOR_THROTTLE_MS),
        Some(Position::new(3.0, 3.0))
    );
}

// =============================================================
// Remote cursors
// =============================================================

#[test]
fn apply_remote_is_last_write_wins() {
    let mut presence = PresenceChannel::new();
    let user = Uuid::new_v4();
    presence.apply_remote(user, Position::new(1.0, 1.0), 0);
    presence.apply_remote(user, Position::new(2.0, 2.0), 10);
    assert_eq!(presence.cursor(&user), Some(Position::new(2.0, 2.0)));
    assert_eq!(presence.cursors().count(), 1);
}

#[test]
fn unknown_user_has_no_cursor() {
    let presence = PresenceChannel::new();
    assert!(presence.cursor(&Uuid::new_v4()).is_none());
}

#[test]
fn remove_drops_cursor() {
    let mut presence = PresenceChannel::new();
    let user = Uuid::new_v4();
    presence.apply_remote(user, Position::new(1.0, 1.0), 0);
    presence.remove(&user);
    assert!(presence.cursor(&user).is_none());
}

// =============================================================
// Expiry
// =============================================================

#[test]
fn expire_drops_only_stale_cursors() {
    let mut presence = PresenceChannel::new();
    let stale = Uuid::new_v4();
    let live = Uuid::new_v4();
    presence.apply_remote(stale, Position::new(1.0, 1.0), 0);
    presence.apply_remote(live, Position::new(2.0, 2.0), CURSOR_EXPIRY_MS);

    let removed = presence.expire(CURSOR_EXPIRY_MS + 1);
    assert_eq!(removed, 1);
    assert!(presence.cursor(&stale).is_none());
    assert!(presence.cursor(&live).is_some());
}

#[test]
fn refresh_defers_expiry() {
    let mut presence = PresenceChannel::new();
    let user = Uuid::new_v4();
    presence.apply_remote(user, Position::new(1.0, 1.0), 0);
    presence.apply_remote(user, Position::new(1.5, 1.5), CURSOR_EXPIRY_MS);

    presence.expire(CURSOR_EXPIRY_MS + 1);
    assert!(presence.cursor(&user).is_some());
}
