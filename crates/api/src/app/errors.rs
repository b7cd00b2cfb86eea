use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use medreg_infra::LifecycleError;

pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    match err {
        LifecycleError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        LifecycleError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        LifecycleError::PurgeNotAllowed(msg) => {
            json_error(StatusCode::CONFLICT, "purge_not_allowed", msg)
        }
        LifecycleError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        LifecycleError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

#[cfg(test)]
mod tests {
    use super::*;

    use medreg_core::ResourceUuid;
    use medreg_infra::EntityStoreError;

    #[test]
    fn maps_each_kind_to_a_status() {
        let cases = [
            (
                LifecycleError::NotFound {
                    resource: "patientidentifiertype",
                    uuid: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (LifecycleError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (LifecycleError::PurgeNotAllowed("in use".to_string()), StatusCode::CONFLICT),
            (
                LifecycleError::InvariantViolation("broken".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                LifecycleError::Store(EntityStoreError::Duplicate(ResourceUuid::new())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(lifecycle_error_to_response(err).status(), status);
        }
    }
}
