//! Staff view of customer accounts. Every route needs the
//! `customer-management` action on an active staff account.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use backoffice_auth::Action;
use backoffice_core::AccountId;

use crate::app::dto::CustomerSummary;
use crate::app::errors;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;
use crate::notifier::Notice;
use crate::store::StoreError;

const NOT_FOUND: &str = "Not found";

pub fn router() -> Router {
    Router::new()
        .route("/admins/customers", get(list_customers))
        .route("/admins/customers/:id", get(get_customer).delete(delete_customer))
}

/// GET /admins/customers
pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::CustomerManagement).await {
        return resp;
    }
    match services.store.customers() {
        Ok(customers) => {
            let users: Vec<CustomerSummary> = customers.into_iter().map(CustomerSummary::from).collect();
            (StatusCode::OK, Json(json!({ "success": true, "users": users }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /admins/customers/:id
pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::CustomerManagement).await {
        return resp;
    }
    let id: AccountId = match parse_id(&id, NOT_FOUND) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.store.customer(id) {
        Ok(Some(customer)) => {
            (StatusCode::OK, Json(json!({ "success": true, "user": CustomerSummary::from(customer) }))).into_response()
        }
        Ok(None) => errors::not_found(NOT_FOUND),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// DELETE /admins/customers/:id
pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::CustomerManagement).await {
        return resp;
    }
    let id: AccountId = match parse_id(&id, NOT_FOUND) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let removed = match services.store.remove_customer(id) {
        Ok(customer) => customer,
        Err(StoreError::NotFound) => return errors::not_found(NOT_FOUND),
        Err(e) => return errors::store_error_to_response(e),
    };
    tracing::info!(actor_id = %principal.account_id(), customer_id = %removed.id, "removed customer");
    services
        .notify(
            removed.email.as_deref(),
            Notice::AccountDeleted { account_id: removed.id },
        )
        .await;

    (StatusCode::OK, Json(json!({ "success": true, "deleted": CustomerSummary::from(removed) }))).into_response()
}
