//! Entity store boundary.
//!
//! Stores own persisted resource state. The lifecycle engine re-reads through a
//! store on every call and keeps no copies between calls.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEntityStore;
pub use postgres::PostgresIdentifierTypeStore;
pub use r#trait::{EntityStore, EntityStoreError};
