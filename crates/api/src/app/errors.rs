use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use backoffice_validation::ValidationResult;

use crate::store::StoreError;

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

/// Missing, malformed, expired or foreign credentials. One body for all of
/// them so callers cannot tell the cases apart.
pub fn unauthenticated() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "You are not authorized to visit this route",
    )
}

/// Authorization denied, for whatever reason.
pub fn not_authorized() -> axum::response::Response {
    json_error(
        StatusCode::UNAUTHORIZED,
        "not_authorized",
        "Not Authorized for this action",
    )
}

pub fn not_found(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn internal() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal error",
    )
}

/// Field errors, reported all at once.
pub fn validation_failed(result: &ValidationResult) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "success": false,
            "errors": result.errors(),
        })),
    )
        .into_response()
}

/// A single field error outside the rule engine (e.g. an unparsable amount).
pub fn field_error(field: &str, message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "success": false,
            "errors": { field: message.into() },
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => not_found("Not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Unavailable(msg) => {
            tracing::warn!(error = %msg, "store unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "storage unavailable")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(
            store_error_to_response(StoreError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            store_error_to_response(StoreError::Conflict("dup".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            store_error_to_response(StoreError::Unavailable("down".to_string())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn auth_failures_are_401() {
        assert_eq!(unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(not_authorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(validation_failed(&ValidationResult::valid()).status(), StatusCode::BAD_REQUEST);
    }
}
