//! Generic REST handlers for any [`Resource`].
//!
//! Each handler only translates between HTTP and the lifecycle engine:
//!
//! | Method | Path | Engine call |
//! |--------|------|-------------|
//! | GET | `/` | `list` (`includeAll`, `v`) |
//! | POST | `/` | `create` |
//! | GET | `/:uuid` | `retrieve` (`v`) |
//! | POST | `/:uuid` | `update` |
//! | DELETE | `/:uuid` | `retire` (`reason`) or `purge` (`purge=true`) |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

use medreg_core::{PatchPayload, Resource, ResourceRef, ResourceRepresentation, ResourceUuid};
use medreg_infra::{LifecycleError, ListOptions};

use crate::app::dto::{DeleteQuery, ListQuery, ListResponse, RetrieveQuery, View};
use crate::app::errors;
use crate::app::services::{AppServices, ResourceServices};

/// Reason recorded when a caller retires without giving one.
pub const DEFAULT_RETIRE_REASON: &str = "web service call";

pub fn router<R>() -> Router
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/:uuid",
            get(retrieve::<R>).post(update::<R>).delete(delete::<R>),
        )
}

/// A representation rendered for the requested view.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Rendered<T> {
    Full(T),
    Ref(ResourceRef),
}

pub fn render<T: ResourceRepresentation>(representation: T, view: View) -> Rendered<T> {
    match view {
        View::Ref => Rendered::Ref(representation.to_ref()),
        View::Default | View::Full => Rendered::Full(representation),
    }
}

/// Path ids that do not parse name nothing, so they are reported as not found.
pub fn parse_uuid<R: Resource>(raw: &str) -> Result<ResourceUuid, Response> {
    raw.parse::<ResourceUuid>().map_err(|_| {
        errors::lifecycle_error_to_response(LifecycleError::not_found_raw::<R>(raw))
    })
}

fn parse_patch<R: Resource>(
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<R::Patch, Response> {
    let Json(value) = body.map_err(|e| errors::bad_request(e.body_text()))?;
    let object = value.as_object().ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "request body must be a JSON object",
        )
    })?;

    <R::Patch as PatchPayload>::from_json(object).map_err(|e| {
        tracing::warn!(resource = R::RESOURCE_NAME, error = %e, "rejected payload");
        errors::lifecycle_error_to_response(e.into())
    })
}

pub async fn list<R>(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Response
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    let options = ListOptions {
        include_retired: query.include_all,
    };
    match services.lifecycle().list(options).await {
        Ok(reps) => {
            let results = reps.into_iter().map(|r| render(r, query.v)).collect();
            (StatusCode::OK, Json(ListResponse { results })).into_response()
        }
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn create<R>(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Response
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    let patch = match parse_patch::<R>(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.lifecycle().create(patch).await {
        Ok(rep) => (StatusCode::CREATED, Json(render(rep, View::Default))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn retrieve<R>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<RetrieveQuery>, QueryRejection>,
) -> Response
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    let uuid = match parse_uuid::<R>(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    match services.lifecycle().retrieve(uuid).await {
        Ok(rep) => (StatusCode::OK, Json(render(rep, query.v))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn update<R>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Response
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    let uuid = match parse_uuid::<R>(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let patch = match parse_patch::<R>(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.lifecycle().update(uuid, patch).await {
        Ok(rep) => (StatusCode::OK, Json(render(rep, View::Default))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn delete<R>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Response
where
    R: Resource,
    AppServices: ResourceServices<R>,
{
    let uuid = match parse_uuid::<R>(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    let result = if query.purge {
        services.lifecycle().purge(uuid).await
    } else {
        let reason = query.reason.as_deref().unwrap_or(DEFAULT_RETIRE_REASON);
        services.lifecycle().retire(uuid, reason).await
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use medreg_identifiers::{IdentifierType, IdentifierTypePatch};

    fn sample() -> <IdentifierType as Resource>::Representation {
        IdentifierType::create(
            ResourceUuid::new(),
            IdentifierTypePatch::named("Sample"),
            chrono::Utc::now(),
        )
        .unwrap()
        .to_representation()
    }

    #[test]
    fn ref_view_has_only_uuid_and_display() {
        let rep = sample();
        let json = serde_json::to_value(render(rep.clone(), View::Ref)).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["display"], "Sample");
        assert_eq!(object["uuid"], rep.uuid.to_string());
    }

    #[test]
    fn default_view_has_public_fields_without_audit() {
        let json = serde_json::to_value(render(sample(), View::Default)).unwrap();

        assert_eq!(json["name"], "Sample");
        assert_eq!(json["retired"], false);
        assert!(json.get("checkDigit").is_some());
        assert!(json.get("auditInfo").is_none());
    }

    #[test]
    fn unparseable_uuid_is_not_found() {
        let resp = parse_uuid::<IdentifierType>("not-a-uuid").unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
