use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use medreg_core::DomainError;
use medreg_identifiers::IdentifierType;
use medreg_validators::ValidatorRegistry;

use crate::app::dto::{ValidateIdentifierRequest, ValidateIdentifierResponse};
use crate::app::errors;
use crate::app::routes::resource;
use crate::app::services::AppServices;

pub fn router() -> Router {
    resource::router::<IdentifierType>().route("/:uuid/validate", post(validate_identifier))
}

/// Check a candidate identifier against the type's format and check digit.
pub async fn validate_identifier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ValidateIdentifierRequest>, JsonRejection>,
) -> Response {
    let uuid = match resource::parse_uuid::<IdentifierType>(&id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    let checked = services
        .identifier_types()
        .inspect(uuid, move |it: &IdentifierType, validators: &ValidatorRegistry| {
            Ok(it.check_identifier(&body.identifier, validators))
        })
        .await;

    let response = match checked {
        Ok(Ok(())) => ValidateIdentifierResponse {
            valid: true,
            message: None,
        },
        Ok(Err(DomainError::Validation(msg))) => ValidateIdentifierResponse {
            valid: false,
            message: Some(msg),
        },
        Ok(Err(other)) => ValidateIdentifierResponse {
            valid: false,
            message: Some(other.to_string()),
        },
        Err(e) => return errors::lifecycle_error_to_response(e),
    };

    (StatusCode::OK, Json(response)).into_response()
}
