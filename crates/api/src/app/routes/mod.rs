use axum::Router;

use medreg_core::Resource;
use medreg_identifiers::IdentifierType;

pub mod identifier_types;
pub mod resource;
pub mod system;

/// Base path for resource endpoints.
pub const REST_BASE: &str = "/ws/rest/v1";

/// Path a resource is mounted under, e.g. `/ws/rest/v1/patientidentifiertype`.
pub fn resource_path<R: Resource>() -> String {
    format!("{REST_BASE}/{}", R::RESOURCE_NAME)
}

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new().nest(&resource_path::<IdentifierType>(), identifier_types::router())
}
