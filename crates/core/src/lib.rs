//! `medreg-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod audit;
pub mod entity;
pub mod error;
pub mod id;
pub mod patch;
pub mod resource;

pub use audit::AuditInfo;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::ResourceUuid;
pub use patch::{Field, PatchObject, PatchPayload};
pub use resource::{Resource, ResourceRef, ResourceRepresentation};
