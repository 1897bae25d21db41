use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use backoffice_auth::Action;
use backoffice_core::{AccountId, OrderId};

use crate::app::dto::{self, FilterQuery};
use crate::app::routes::common::{check_body, parse_id};
use crate::app::services::AppServices;
use crate::app::{errors, schemas};
use crate::authz::require;
use crate::context::PrincipalContext;
use crate::notifier::Notice;
use crate::store::{CustomerAccount, Order, OrderProcess};

const ORDER_NOT_FOUND: &str = "Not found";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/customer/:id", get(customer_orders))
        .route("/:id", post(modify_order))
}

/// GET /orders
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<FilterQuery>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Store).await {
        return resp;
    }
    let now = Utc::now();
    match services.store.orders(None, query.since(now), now) {
        Ok(orders) => (StatusCode::OK, Json(json!({ "success": true, "orders": orders }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// GET /orders/customer/:id
pub async fn customer_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(customer): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Store).await {
        return resp;
    }
    let customer: AccountId = match parse_id(&customer, ORDER_NOT_FOUND) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let now = Utc::now();
    match services.store.orders(Some(customer), query.since(now), now) {
        Ok(orders) => (StatusCode::OK, Json(json!({ "success": true, "orders": orders }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /orders: staff place an order on behalf of a named customer; a
/// customer places one for themselves.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Response {
    let customer = if principal.claimed_role().is_some() {
        if let Err(resp) = require(&services.authorizer, &principal, Action::Store).await {
            return resp;
        }
        if let Err(resp) = check_body(&body, &schemas::place_order()) {
            return resp;
        }
        match named_customer(&services, &body) {
            Ok(customer) => customer,
            Err(resp) => return resp,
        }
    } else {
        let customer = match active_customer(&services, principal.account_id()) {
            Ok(customer) => customer,
            Err(resp) => return resp,
        };
        if let Err(resp) = check_body(&body, &schemas::place_order()) {
            return resp;
        }
        customer
    };

    let now = Utc::now();
    let order = Order {
        id: OrderId::new(),
        customer: customer.id,
        process: OrderProcess::Placed,
        detail: dto::field_text(&body, "detail").unwrap_or_default(),
        comment: None,
        value: None,
        date_ordered: now,
        date_modified: now,
    };

    match services.store.insert_order(order) {
        Ok(order) => {
            tracing::info!(actor_id = %principal.account_id(), order_id = %order.id, customer_id = %order.customer, "order placed");
            services
                .notify(customer.email.as_deref(), Notice::OrderPlaced { order_id: order.id })
                .await;
            (StatusCode::OK, Json(json!({ "success": true, "order": order }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// POST /orders/:id: update process, detail, comment and value.
pub async fn modify_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Store).await {
        return resp;
    }
    if let Err(resp) = check_body(&body, &schemas::modify_order()) {
        return resp;
    }
    let value = match dto::amount_field(&body, "value") {
        Ok(value) => value,
        Err(resp) => return resp,
    };
    let Some(process) = dto::field_text(&body, "process").and_then(|p| p.parse::<OrderProcess>().ok()) else {
        return errors::field_error("process", "Process must be one of: placed, approved");
    };
    let id: OrderId = match parse_id(&id, ORDER_NOT_FOUND) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let detail = dto::field_text(&body, "detail").unwrap_or_default();
    let comment = dto::field_text(&body, "comment").filter(|c| !c.is_empty());
    let updated = services.store.update_order(id, |order| {
        order.process = process;
        order.detail = detail;
        order.comment = comment;
        order.value = value;
        order.date_modified = Utc::now();
    });

    match updated {
        Ok(order) => {
            tracing::info!(actor_id = %principal.account_id(), order_id = %order.id, "order modified");
            (StatusCode::OK, Json(json!({ "success": true, "order": order }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// The customer a staff member names in the body; it must exist.
fn named_customer(services: &AppServices, body: &Value) -> Result<CustomerAccount, Response> {
    let Some(raw) = dto::field_text(body, "customer").filter(|c| !c.is_empty()) else {
        return Err(errors::field_error("customer", "You should specify the customer"));
    };
    let invalid = || errors::field_error("customer", "Customer id is not valid");
    let id: AccountId = raw.parse().map_err(|_| invalid())?;
    match services.store.customer(id) {
        Ok(Some(customer)) => Ok(customer),
        Ok(None) => Err(invalid()),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}

/// A calling customer must exist, be verified and be enabled.
fn active_customer(services: &AppServices, id: AccountId) -> Result<CustomerAccount, Response> {
    let denied = |message: &str| errors::json_error(StatusCode::UNAUTHORIZED, "not_authorized", message);
    match services.store.customer(id) {
        Ok(Some(customer)) if !customer.verified => Err(denied("You have to first verify your account")),
        Ok(Some(customer)) if !customer.enabled => {
            Err(denied("Your account is disabled. Please contact support team"))
        }
        Ok(Some(customer)) => Ok(customer),
        Ok(None) => Err(errors::not_authorized()),
        Err(e) => Err(errors::store_error_to_response(e)),
    }
}
