//! Persistence sync: the async boundary to the durable store.
//!
//! Local state is always applied synchronously before the corresponding
//! network call is issued, so a slow or failing store never blocks or rolls
//! back local interaction. Each call is independently fallible; failures are
//! logged and surfaced to the caller, and never retried automatically — the
//! host owns scheduling and may retry with its own policy.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use tracing::warn;

use crate::drag::DurableWrite;
use crate::engine::SyncEngine;
use crate::shape::{PartialShape, Shape, ShapeId};

/// Error from the external persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The call did not reach the store or the connection dropped.
    #[error("network failure: {0}")]
    Network(String),
    /// The store refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The store has no record with this id.
    #[error("shape not found: {0}")]
    NotFound(ShapeId),
}

/// The external persistence collaborator. Implementations wrap whatever
/// transport the host uses; every call is independently fallible. Enables
/// mocking in tests.
#[async_trait::async_trait]
pub trait PersistenceStore: Send {
    /// Fetch every shape on the board.
    async fn load(&mut self) -> Result<Vec<Shape>, StoreError>;
    /// Durably create one shape.
    async fn create(&mut self, shape: &Shape) -> Result<(), StoreError>;
    /// Durably apply a sparse update to one shape.
    async fn update(&mut self, id: ShapeId, fields: &PartialShape) -> Result<(), StoreError>;
    /// Durably delete one shape.
    async fn delete(&mut self, id: ShapeId) -> Result<(), StoreError>;
}

/// Bridges the engine to the persistence collaborator.
pub struct PersistenceSync<S: PersistenceStore> {
    store: S,
}

impl<S: PersistenceStore> PersistenceSync<S> {
    /// Wrap a persistence collaborator.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped collaborator.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bulk-load the board, replacing the engine's shapes and authoritative
    /// tier wholesale. Pending updates buffered for loaded shapes are
    /// resolved into their base records. Returns the number of shapes loaded.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error unchanged; engine state is untouched
    /// on failure.
    pub async fn load(&mut self, engine: &mut SyncEngine, now_ms: i64) -> Result<usize, StoreError> {
        let shapes = match self.store.load().await {
            Ok(shapes) => shapes,
            Err(err) => {
                warn!(error = %err, "bulk load failed");
                return Err(err);
            }
        };
        let count = shapes.len();
        engine.on_bulk_load(shapes, now_ms);
        Ok(count)
    }

    /// Create a shape locally, then durably. The local insert is visible to
    /// the resolver before the call is issued.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error; the locally inserted shape stays.
    pub async fn create(&mut self, engine: &mut SyncEngine, shape: Shape, now_ms: i64) -> Result<(), StoreError> {
        let id = shape.id;
        let position = shape.position();
        engine.apply_create(shape.clone(), now_ms);
        if let Err(err) = self.store.create(&shape).await {
            warn!(shape_id = %id, error = %err, "durable create failed");
            return Err(err);
        }
        engine.tiers.set_authoritative(id, position);
        Ok(())
    }

    /// Update a shape locally, then durably. A stale id is a no-op `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error; already-applied local state
    /// (including optimistic and remote tiers) is left intact.
    pub async fn update(
        &mut self,
        engine: &mut SyncEngine,
        id: ShapeId,
        fields: PartialShape,
    ) -> Result<(), StoreError> {
        if !engine.apply_update(&id, &fields) {
            return Ok(());
        }
        if let Err(err) = self.store.update(id, &fields).await {
            warn!(shape_id = %id, error = %err, "durable update failed");
            return Err(err);
        }
        if let Some(shape) = engine.store.get(&id) {
            if fields.x.is_some() || fields.y.is_some() {
                engine.tiers.set_authoritative(id, shape.position());
            }
        }
        Ok(())
    }

    /// Delete a shape locally, then durably. A stale id is a no-op `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's error; the local delete stays.
    pub async fn delete(&mut self, engine: &mut SyncEngine, id: ShapeId) -> Result<(), StoreError> {
        if !engine.apply_delete(&id) {
            return Ok(());
        }
        if let Err(err) = self.store.delete(id).await {
            warn!(shape_id = %id, error = %err, "durable delete failed");
            return Err(err);
        }
        Ok(())
    }

    /// Persist the durable writes returned by a finished drag. Every write
    /// is attempted regardless of earlier failures; each failure is logged
    /// and the first one is surfaced after the batch completes.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error encountered. Local state is
    /// never rolled back; the store's base records already hold the final
    /// drag positions.
    pub async fn persist_drag(
        &mut self,
        engine: &mut SyncEngine,
        writes: Vec<DurableWrite>,
    ) -> Result<(), StoreError> {
        let mut first_err = None;
        for write in writes {
            let fields = PartialShape::move_to(write.position);
            match self.store.update(write.shape_id, &fields).await {
                Ok(()) => {
                    engine.tiers.set_authoritative(write.shape_id, write.position);
                }
                Err(err) => {
                    warn!(shape_id = %write.shape_id, error = %err, "durable drag write failed");
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
