//! Infrastructure layer: entity stores, the resource lifecycle engine, seed data.

pub mod entity_store;
pub mod lifecycle;
pub mod seed;

pub use entity_store::{
    EntityStore, EntityStoreError, InMemoryEntityStore, PostgresIdentifierTypeStore,
};
pub use lifecycle::{LifecycleError, LifecycleResult, ListOptions, ResourceLifecycle};
