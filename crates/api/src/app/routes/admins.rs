//! Staff account routes: login, bootstrap, registration, role and status
//! management, profile completion and activation.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use backoffice_auth::token::SESSION_TTL_SECS;
use backoffice_auth::{Action, Role};
use backoffice_core::AccountId;

use crate::app::dto::{self, EmployeeSummary, Profile};
use crate::app::routes::common::{
    activation_claims, already_verified, check_body, check_password, hash, parse_id, profile_already_complete, send_activation,
};
use crate::app::services::AppServices;
use crate::app::{errors, schemas};
use crate::authz::{require, require_manage};
use crate::context::PrincipalContext;
use crate::notifier::Notice;
use crate::store::{AdminAccount, StoreError};

const ACCOUNT_NOT_FOUND: &str = "The user not found";

pub fn public_router() -> Router {
    Router::new()
        .route("/admins/login", post(login))
        .route("/admins/register-admin", post(register_admin))
        .route("/admins/activate/:token", get(activate))
}

pub fn router() -> Router {
    Router::new()
        .route("/admins/register", post(register))
        .route("/admins/complete", post(complete_profile))
        .route("/admins/change-role/:id", post(change_role))
        .route("/admins/employees", get(list_employees))
        .route("/admins/employees/:id", delete(delete_employee))
        .route("/admins/:id", delete(delete_admin).patch(toggle_enabled))
}

/// POST /admins/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::login()) {
        return resp;
    }
    let username = dto::field_text(&body, "username").unwrap_or_default().to_lowercase();
    let password = dto::field_text(&body, "password").unwrap_or_default();

    let account = match services.store.account_by_username(&username) {
        Ok(Some(account)) => account,
        Ok(None) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "authentication_failed", "Authentication failed");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if !check_password(account.password_hash.clone(), password).await {
        return errors::json_error(StatusCode::UNAUTHORIZED, "authentication_failed", "Wrong username/password");
    }

    let token = match services.issuer.issue_session(account.id, account.role) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session token");
            return errors::internal();
        }
    };

    tracing::info!(account_id = %account.id, "admin logged in");
    (
        StatusCode::OK,
        Json(json!({ "success": true, "token": token, "expiresIn": SESSION_TTL_SECS })),
    )
        .into_response()
}

/// POST /admins/register-admin: create the first administrator. Refused once
/// any account exists.
pub async fn register_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::register_admin()) {
        return resp;
    }
    match services.store.account_count() {
        Ok(0) => {}
        Ok(_) => return errors::unauthenticated(),
        Err(e) => return errors::store_error_to_response(e),
    }

    let username = dto::field_text(&body, "username").unwrap_or_default().to_lowercase();
    let password = dto::field_text(&body, "password").unwrap_or_default();
    let hash = match hash(password).await {
        Ok(hash) => hash,
        Err(resp) => return resp,
    };

    let mut account = AdminAccount::new(username, hash, Role::Administrator, Utc::now());
    account.enabled = true;
    account.verified = true;

    match services.store.bootstrap(account) {
        Ok(account) => {
            tracing::info!(account_id = %account.id, "bootstrapped administrator");
            (StatusCode::OK, Json(json!({ "success": true, "user": account }))).into_response()
        }
        // Lost a race with a concurrent bootstrap.
        Err(StoreError::Conflict(_)) => errors::unauthenticated(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admins/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Response {
    let actor_role = match require(&services.authorizer, &principal, Action::AddAdmin).await {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_body(&body, &schemas::register()) {
        return resp;
    }

    let Some(role) = dto::field_text(&body, "role").and_then(|r| r.parse::<Role>().ok()) else {
        return errors::field_error("role", "The role is not valid");
    };
    if let Err(resp) = require_manage(&services.authorizer, actor_role, role) {
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
        .insert_account(AdminAccount::new(username, hash, role, Utc::now()))
    {
        Ok(account) => {
            tracing::info!(actor_id = %principal.account_id(), account_id = %account.id, role = %role, "registered admin");
            (StatusCode::OK, Json(json!({ "success": true, "user": account }))).into_response()
        }
        Err(StoreError::Conflict(_)) => {
            errors::json_error(StatusCode::CONFLICT, "conflict", "The username already registered")
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admins/change-role/:id
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let actor_role = match require(&services.authorizer, &principal, Action::ChangeRole).await {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    if let Err(resp) = check_body(&body, &schemas::change_role()) {
        return resp;
    }
    let Some(new_role) = dto::field_text(&body, "role").and_then(|r| r.parse::<Role>().ok()) else {
        return errors::field_error("role", "The role is not valid");
    };

    let target = match load_account(&services, &id) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    // Both the current and the requested role must be within scope.
    for role in [target.role, new_role] {
        if let Err(resp) = require_manage(&services.authorizer, actor_role, role) {
            return resp;
        }
    }

    let updated = match services.store.update_account(target.id, |a| a.role = new_role) {
        Ok(account) => account,
        Err(e) => return errors::store_error_to_response(e),
    };
    tracing::info!(actor_id = %principal.account_id(), account_id = %updated.id, role = %new_role, "changed admin role");
    services
        .notify(
            updated.email.as_deref(),
            Notice::RoleChanged {
                account_id: updated.id,
                role: new_role,
            },
        )
        .await;

    (StatusCode::OK, Json(json!({ "success": true, "admin": updated }))).into_response()
}

/// PATCH /admins/:id: flip the enabled flag.
pub async fn toggle_enabled(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let actor_role = match require(&services.authorizer, &principal, Action::EnableDisableAdmin).await {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    let target = match load_account(&services, &id) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    if let Err(resp) = require_manage(&services.authorizer, actor_role, target.role) {
        return resp;
    }

    match services.store.update_account(target.id, |a| a.enabled = !a.enabled) {
        Ok(updated) => {
            tracing::info!(actor_id = %principal.account_id(), account_id = %updated.id, enabled = updated.enabled, "toggled admin");
            (StatusCode::OK, Json(json!({ "success": true, "admin": updated }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /admins/:id
pub async fn delete_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    remove_managed(services, principal, id, Action::DeleteAdmin).await
}

/// DELETE /admins/employees/:id
pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    remove_managed(services, principal, id, Action::DeleteEmployee).await
}

async fn remove_managed(
    services: Arc<AppServices>,
    principal: PrincipalContext,
    id: String,
    action: Action,
) -> Response {
    let actor_role = match require(&services.authorizer, &principal, action).await {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    let target = match load_account(&services, &id) {
        Ok(account) => account,
        Err(resp) => return resp,
    };
    if let Err(resp) = require_manage(&services.authorizer, actor_role, target.role) {
        return resp;
    }

    let removed = match services.store.remove_account(target.id) {
        Ok(account) => account,
        Err(e) => return errors::store_error_to_response(e),
    };
    tracing::info!(actor_id = %principal.account_id(), account_id = %removed.id, action = %action, "removed account");
    services
        .notify(
            removed.email.as_deref(),
            Notice::AccountDeleted { account_id: removed.id },
        )
        .await;

    (StatusCode::OK, Json(json!({ "success": true, "admin": removed }))).into_response()
}

/// GET /admins/employees: accounts in roles the caller manages.
pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let actor_role = match require(&services.authorizer, &principal, Action::Employees).await {
        Ok(role) => role,
        Err(resp) => return resp,
    };
    let roles = services.authorizer.hierarchy().manageable_roles(actor_role);

    match services.store.accounts_in_roles(&roles) {
        Ok(accounts) => {
            let employees: Vec<EmployeeSummary> = accounts.into_iter().map(EmployeeSummary::from).collect();
            (StatusCode::OK, Json(json!({ "success": true, "employees": employees }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /admins/complete: fill in the caller's profile and send an
/// activation link. Only needs a session token; unverified accounts cannot
/// pass `require`.
pub async fn complete_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = check_body(&body, &schemas::complete_profile()) {
        return resp;
    }

    let account = match services.store.account(principal.account_id()) {
        Ok(Some(account)) => account,
        Ok(None) => return errors::not_found(ACCOUNT_NOT_FOUND),
        Err(e) => return errors::store_error_to_response(e),
    };
    if account.verified {
        return profile_already_complete();
    }

    let profile = Profile::from_body(&body);
    let updated = match services.store.update_account(account.id, |a| {
        a.firstname = Some(profile.firstname);
        a.lastname = Some(profile.lastname);
        a.phonenumber = Some(profile.phonenumber);
        a.email = Some(profile.email);
    }) {
        Ok(account) => account,
        Err(e) => return errors::store_error_to_response(e),
    };

    send_activation(&services, updated.id, updated.email.as_deref()).await
}

/// GET /admins/activate/:token
pub async fn activate(
    Extension(services): Extension<Arc<AppServices>>,
    Path(token): Path<String>,
) -> Response {
    let claims = match activation_claims(&services, &token) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };

    let account = match services.store.account(claims.sub) {
        Ok(Some(account)) => account,
        Ok(None) => return errors::not_found("There is no account match with this verification code"),
        Err(e) => return errors::store_error_to_response(e),
    };
    if account.verified {
        return already_verified();
    }

    let updated = match services.store.update_account(account.id, |a| a.verified = true) {
        Ok(account) => account,
        Err(e) => return errors::store_error_to_response(e),
    };
    tracing::info!(account_id = %updated.id, "account verified");
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

fn load_account(services: &AppServices, raw_id: &str) -> Result<AdminAccount, Response> {
    let id: AccountId = parse_id(raw_id, ACCOUNT_NOT_FOUND)?;
    match services.store.account(id) {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(errors::not_found(ACCOUNT_NOT_FOUND)),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
