//! Customer self-service: registration, login, profile completion and
//! activation, plus the staff toggle on a customer's enabled flag.
//!
//! Customers are plain accounts. Their session tokens carry no role, so they
//! can never pass staff authorization.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use backoffice_auth::Action;
use backoffice_auth::token::SESSION_TTL_SECS;
use backoffice_core::AccountId;

use crate::app::dto::{self, CustomerSummary, Profile};
use crate::app::routes::common::{
    activation_claims, already_verified, check_body, check_password, hash, parse_id, profile_already_complete,
    send_activation,
};
use crate::app::services::AppServices;
use crate::app::{errors, schemas};
use crate::authz::require;
use crate::context::PrincipalContext;
use crate::notifier::Notice;
use crate::store::{CustomerAccount, StoreError};

const CUSTOMER_NOT_FOUND: &str = "No account found";

pub fn public_router() -> Router {
    Router::new()
        .route("/users/login", post(login))
        .route("/users/register", post(register))
        .route("/users/activate/:token", get(activate))
}

pub fn router() -> Router {
    Router::new()
        .route("/users/complete", post(complete_profile))
        .route("/users/:id", patch(toggle_enabled))
}

/// POST /users/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::login()) {
        return resp;
    }
    let username = dto::field_text(&body, "username").unwrap_or_default().to_lowercase();
    let password = dto::field_text(&body, "password").unwrap_or_default();

    let customer = match services.store.customer_by_username(&username) {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "authentication_failed", CUSTOMER_NOT_FOUND);
        }
        Err(e) => return errors::store_error_to_response(e),
    };
    if !check_password(customer.password_hash.clone(), password).await {
        return errors::json_error(StatusCode::UNAUTHORIZED, "authentication_failed", "Wrong username/password");
    }

    let token = match services.issuer.issue_plain_session(customer.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session token");
            return errors::internal();
        }
    };

    tracing::info!(customer_id = %customer.id, "customer logged in");
    (
        StatusCode::OK,
        Json(json!({ "success": true, "token": token, "expiresIn": SESSION_TTL_SECS })),
    )
        .into_response()
}

/// POST /users/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::register_customer()) {
        return resp;
    }
    let username = dto::field_text(&body, "username").unwrap_or_default().to_lowercase();
    let password = dto::field_text(&body, "password").unwrap_or_default();
    let hash = match hash(password).await {
        Ok(hash) => hash,
        Err(resp) => return resp,
    };

    match services
        .store
        .insert_customer(CustomerAccount::new(username, hash, Utc::now()))
    {
        Ok(customer) => {
            tracing::info!(customer_id = %customer.id, "customer registered");
            (StatusCode::OK, Json(json!({ "success": true, "user": customer }))).into_response()
        }
        Err(StoreError::Conflict(_)) => {
            errors::json_error(StatusCode::CONFLICT, "conflict", "The account is already exists")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /users/complete: the calling customer's profile.
pub async fn complete_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::complete_profile()) {
        return resp;
    }

    let customer = match services.store.customer(principal.account_id()) {
        Ok(Some(customer)) => customer,
        Ok(None) => return errors::not_found(CUSTOMER_NOT_FOUND),
        Err(e) => return errors::store_error_to_response(e),
    };
    if customer.verified {
        return profile_already_complete();
    }

    let profile = Profile::from_body(&body);
    let updated = match services.store.update_customer(customer.id, |c| {
        c.firstname = Some(profile.firstname);
        c.lastname = Some(profile.lastname);
        c.phonenumber = Some(profile.phonenumber);
        c.email = Some(profile.email);
    }) {
        Ok(customer) => customer,
        Err(e) => return errors::store_error_to_response(e),
    };

    send_activation(&services, updated.id, updated.email.as_deref()).await
}

/// GET /users/activate/:token
pub async fn activate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
) -> Response {
    let claims = match activation_claims(&services, &token) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let customer = match services.store.customer(claims.sub) {
        Ok(Some(customer)) => customer,
        Ok(None) => return errors::not_found("There is no account match with this verification code"),
        Err(e) => return errors::store_error_to_response(e),
    };
    if customer.verified {
        return already_verified();
    }

    let updated = match services.store.update_customer(customer.id, |c| c.verified = true) {
        Ok(customer) => customer,
        Err(e) => return errors::store_error_to_response(e),
    };
    tracing::info!(customer_id = %updated.id, "customer verified");
    services
        .notify(
            updated.email.as_deref(),
            Notice::AccountVerified { account_id: updated.id },
        )
        .await;

    (
        StatusCode::OK,
        Json(json!({ "success": true, "msg": "Your account verified successfully" })),
    )
        .into_response()
}

/// PATCH /users/:id: flip a customer's enabled flag.
pub async fn toggle_enabled(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::CustomerManagement).await {
        return resp;
    }
    let id: AccountId = match parse_id(&id, CUSTOMER_NOT_FOUND) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.store.update_customer(id, |c| c.enabled = !c.enabled) {
        Ok(updated) => {
            tracing::info!(actor_id = %principal.account_id(), customer_id = %updated.id, enabled = updated.enabled, "toggled customer");
            (StatusCode::OK, Json(json!({ "success": true, "user": CustomerSummary::from(updated) }))).into_response()
        }
        Err(StoreError::NotFound) => errors::not_found(CUSTOMER_NOT_FOUND),
        Err(e) => errors::store_error_to_response(e),
    }
}
