//! `medreg-validators`: check-digit algorithms for identifier values.
//!
//! Validators are stateless and referenced by registry key from the entities
//! that use them. Nothing here performs IO.

pub mod luhn;
pub mod luhn_mod_n;
pub mod registry;
pub mod validator;
pub mod verhoeff;

pub use luhn::LuhnValidator;
pub use luhn_mod_n::LuhnModNValidator;
pub use registry::ValidatorRegistry;
pub use validator::{IdentifierValidator, ValidatorError, ValidatorResult};
pub use verhoeff::VerhoeffValidator;
