//! Patient identifier types (the kinds of identifier a patient record can carry).
//!
//! This crate contains the entity's business rules only (no IO, no HTTP, no storage).

pub mod identifier_type;

pub use identifier_type::{
    IdentifierType, IdentifierTypePatch, IdentifierTypeRecord, IdentifierTypeRepresentation,
};
