//! Client-side state reconciliation core for the collaborative board.
//!
//! Every shape on the board has up to three concurrent sources of truth: the
//! durable persistence store (slow, authoritative), the realtime broadcast
//! channel (fast, ephemeral, unordered), and the local user's in-flight drag
//! (optimistic). This crate owns the tiered position model that reconciles
//! them, the drag-operation lifecycle, the anti-jitter rules that keep remote
//! updates from fighting a local drag, and the throttling discipline for
//! outgoing position broadcasts. The host layer is responsible only for
//! wiring transport callbacks into the engine and dispatching the resulting
//! sends and durable writes.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level [`engine::SyncEngine`] facade owning all state |
//! | [`shape`] | Shape types, the shape store, selection, and z-order |
//! | [`tier`] | Per-shape position tiers and the pure position resolver |
//! | [`drag`] | Drag lifecycle, optimistic writes, and send throttling |
//! | [`ingest`] | Remote position batches and anti-jitter filtering |
//! | [`pending`] | TTL-bounded cache for updates naming unknown shapes |
//! | [`sync`] | Async persistence boundary and bulk load |
//! | [`presence`] | Per-user cursor positions with throttle and expiry |
//! | [`consts`] | Shared intervals and TTLs |

pub mod consts;
pub mod drag;
pub mod engine;
pub mod ingest;
pub mod pending;
pub mod presence;
pub mod shape;
pub mod sync;
pub mod tier;
