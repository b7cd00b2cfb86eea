use std::sync::Arc;

use thiserror::Error;

use medreg_core::{Resource, ResourceUuid};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityStoreError {
    /// An entity with this uuid is already stored.
    #[error("duplicate uuid: {0}")]
    Duplicate(ResourceUuid),

    /// No entity is stored under this uuid.
    #[error("no entity stored for uuid: {0}")]
    Missing(ResourceUuid),

    /// A referential or business constraint refused the write.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The backend itself failed (connection, lock poisoning, decoding).
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Persistence abstraction for one resource type.
///
/// Implementations provide at least read-committed isolation per call.
/// Concurrent writes to the same uuid are last-write-wins.
#[async_trait::async_trait]
pub trait EntityStore<R: Resource>: Send + Sync {
    async fn get(&self, uuid: ResourceUuid) -> Result<Option<R>, EntityStoreError>;

    /// All stored entities; retired ones only when `include_retired` is set.
    async fn list(&self, include_retired: bool) -> Result<Vec<R>, EntityStoreError>;

    /// Store a new entity. Fails with `Duplicate` if the uuid is taken.
    async fn insert(&self, entity: R) -> Result<(), EntityStoreError>;

    /// Overwrite an existing entity. Fails with `Missing` if absent.
    async fn update(&self, entity: R) -> Result<(), EntityStoreError>;

    /// Physically remove an entity.
    ///
    /// Fails with `Missing` if absent and `Constraint` if something still
    /// depends on it; in both cases nothing changes.
    async fn delete(&self, uuid: ResourceUuid) -> Result<(), EntityStoreError>;

    /// Number of stored entities, retired included.
    async fn count(&self) -> Result<u64, EntityStoreError>;
}

#[async_trait::async_trait]
impl<R, S> EntityStore<R> for Arc<S>
where
    R: Resource,
    S: EntityStore<R> + ?Sized,
{
    async fn get(&self, uuid: ResourceUuid) -> Result<Option<R>, EntityStoreError> {
        (**self).get(uuid).await
    }

    async fn list(&self, include_retired: bool) -> Result<Vec<R>, EntityStoreError> {
        (**self).list(include_retired).await
    }

    async fn insert(&self, entity: R) -> Result<(), EntityStoreError> {
        (**self).insert(entity).await
    }

    async fn update(&self, entity: R) -> Result<(), EntityStoreError> {
        (**self).update(entity).await
    }

    async fn delete(&self, uuid: ResourceUuid) -> Result<(), EntityStoreError> {
        (**self).delete(uuid).await
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        (**self).count().await
    }
}
