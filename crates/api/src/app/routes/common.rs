use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use backoffice_auth::{Claims, TokenPurpose, hash_password, verify_password};
use backoffice_core::AccountId;
use backoffice_validation::{RuleSet, validate_value};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::notifier::Notice;

/// Run `rules` over a request body; `Err` carries the 400 response.
pub fn check_body(body: &Value, rules: &RuleSet) -> Result<(), Response> {
    let result = validate_value(body, rules);
    if result.is_valid() {
        Ok(())
    } else {
        Err(errors::validation_failed(&result))
    }
}

/// Path identifiers that do not parse can never name a stored record.
pub fn parse_id<T: core::str::FromStr>(raw: &str, not_found: &str) -> Result<T, Response> {
    raw.parse::<T>().map_err(|_| errors::not_found(not_found))
}

/// Hashing runs on the blocking pool.
pub async fn hash(password: String) -> Result<String, Response> {
    match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => Ok(hash),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "password hashing failed");
            Err(errors::internal())
        }
        Err(e) => {
            tracing::error!(error = %e, "password hashing task failed");
            Err(errors::internal())
        }
    }
}

pub async fn check_password(hash: String, password: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .unwrap_or(false)
}

/// Claims of a valid activation link, or the 400 every bad link gets.
pub fn activation_claims(services: &AppServices, token: &str) -> Result<Claims, Response> {
    services
        .verifier
        .verify_purpose(token, TokenPurpose::Activation)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected activation token");
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_token",
                "The verification link is invalid or has expired",
            )
        })
}

/// Issue an activation token for `account_id` and mail it to `email`.
pub async fn send_activation(services: &AppServices, account_id: AccountId, email: Option<&str>) -> Response {
    let token = match services.issuer.issue_activation(account_id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue activation token");
            return errors::internal();
        }
    };
    services
        .notify(email, Notice::VerifyAccount { account_id, token })
        .await;

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "msg": "Your account is complete now. We just sent you an email with verification url.",
        })),
    )
        .into_response()
}

pub fn profile_already_complete() -> Response {
    errors::json_error(
        StatusCode::CONFLICT,
        "already_verified",
        "The account information is already filled. If you need to change any information, you have to contact the administrator.",
    )
}

pub fn already_verified() -> Response {
    errors::json_error(StatusCode::BAD_REQUEST, "already_verified", "The account is already verified")
}
