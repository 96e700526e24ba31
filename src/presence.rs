//! Presence: per-user cursor positions with throttle and expiry.
//!
//! A simpler sibling of the shape position tiers — a cursor has no
//! authoritative tier, just the latest broadcast value per user. Outgoing
//! local cursor moves share the drag controller's throttle pattern at a
//! coarser rate, and a remote cursor that stops refreshing is expired.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use crate::consts::{CURSOR_EXPIRY_MS, CURSOR_THROTTLE_MS};
use crate::shape::{Position, UserId};

/// One remote user's live cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Latest broadcast position.
    pub position: Position,
    /// When it was last refreshed, in host-clock milliseconds.
    pub updated_at_ms: i64,
}

/// Remote cursors keyed by user, plus the local send throttle.
pub struct PresenceChannel {
    cursors: HashMap<UserId, Cursor>,
    last_sent_ms: Option<i64>,
}

impl PresenceChannel {
    /// Create an empty presence channel.
    #[must_use]
    pub fn new() -> Self {
        Self { cursors: HashMap::new(), last_sent_ms: None }
    }

    /// Offer a local cursor move for broadcast. Returns `Some(position)`
    /// when the throttle window has elapsed and the host should send now,
    /// `None` when the move should be skipped.
    pub fn update_local(&mut self, position: Position, now_ms: i64) -> Option<Position> {
        let due = self
            .last_sent_ms
            .is_none_or(|last| now_ms - last >= CURSOR_THROTTLE_MS);
        if due {
            self.last_sent_ms = Some(now_ms);
            Some(position)
        } else {
            None
        }
    }

    /// Apply a remote user's cursor update. Last write wins.
    pub fn apply_remote(&mut self, user: UserId, position: Position, now_ms: i64) {
        self.cursors
            .insert(user, Cursor { position, updated_at_ms: now_ms });
    }

    /// Drop a user's cursor (e.g. on leave).
    pub fn remove(&mut self, user: &UserId) {
        self.cursors.remove(user);
    }

    /// A user's current cursor position, if known.
    #[must_use]
    pub fn cursor(&self, user: &UserId) -> Option<Position> {
        self.cursors.get(user).map(|c| c.position)
    }

    /// All live cursors.
    pub fn cursors(&self) -> impl Iterator<Item = (&UserId, &Cursor)> {
        self.cursors.iter()
    }

    /// Drop cursors unrefreshed past the expiry window. Returns how many
    /// were removed.
    pub fn expire(&mut self, now_ms: i64) -> usize {
        let before = self.cursors.len();
        self.cursors
            .retain(|_, cursor| now_ms - cursor.updated_at_ms <= CURSOR_EXPIRY_MS);
        before - self.cursors.len()
    }
}

impl Default for PresenceChannel {
    fn default() -> Self {
        Self::new()
    }
}
