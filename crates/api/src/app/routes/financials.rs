use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use backoffice_auth::Action;
use backoffice_core::EntryId;

use crate::app::dto::{self, FilterQuery};
use crate::app::routes::common::check_body;
use crate::app::services::AppServices;
use crate::app::{errors, schemas};
use crate::authz::require;
use crate::context::PrincipalContext;
use crate::store::{LedgerEntry, LedgerKind};

pub fn router() -> Router {
    Router::new()
        .route("/", get(summary))
        .route("/revenues", get(list_revenues).post(add_revenue))
        .route("/expenses", get(list_expenses).post(add_expense))
}

/// GET /financials: every entry plus revenues minus expenses.
pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<FilterQuery>,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Financial).await {
        return resp;
    }
    let now = Utc::now();
    let entries = match services.store.entries(None, query.since(now), now) {
        Ok(entries) => entries,
        Err(e) => return errors::store_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "transactions": entries,
            "balance": dto::signed_amount(balance(&entries)),
        })),
    )
        .into_response()
}

/// Revenues minus expenses, in cents.
fn balance(entries: &[LedgerEntry]) -> i128 {
    entries
        .iter()
        .map(|e| {
            let cents = i128::from(e.cost.cents());
            match e.kind {
                LedgerKind::Revenue => cents,
                LedgerKind::Expense => -cents,
            }
        })
        .sum()
}

pub async fn list_revenues(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    query: Query<FilterQuery>,
) -> Response {
    list(services, principal, query, LedgerKind::Revenue).await
}

pub async fn list_expenses(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    query: Query<FilterQuery>,
) -> Response {
    list(services, principal, query, LedgerKind::Expense).await
}

pub async fn add_revenue(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    body: Json<Value>,
) -> Response {
    add(services, principal, body, LedgerKind::Revenue).await
}

pub async fn add_expense(
    services: Extension<Arc<AppServices>>,
    principal: Extension<PrincipalContext>,
    body: Json<Value>,
) -> Response {
    add(services, principal, body, LedgerKind::Expense).await
}

async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<FilterQuery>,
    kind: LedgerKind,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Financial).await {
        return resp;
    }
    let now = Utc::now();
    match services.store.entries(Some(kind), query.since(now), now) {
        Ok(entries) => {
            (StatusCode::OK, Json(json!({ "success": true, "transactions": entries }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn add(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
    kind: LedgerKind,
) -> Response {
    if let Err(resp) = require(&services.authorizer, &principal, Action::Financial).await {
        return resp;
    }
    if let Err(resp) = check_body(&body, &schemas::ledger_entry()) {
        return resp;
    }
    let cost = match dto::amount_field(&body, "cost") {
        Ok(Some(cost)) => cost,
        Ok(None) => return errors::field_error("cost", "Cost is required"),
        Err(resp) => return resp,
    };

    let entry = LedgerEntry {
        id: EntryId::new(),
        kind,
        title: dto::field_text(&body, "title").unwrap_or_default(),
        cost,
        detail: dto::field_text(&body, "detail").unwrap_or_default(),
        date: Utc::now(),
    };

    match services.store.add_entry(entry) {
        Ok(entry) => {
            tracing::info!(actor_id = %principal.account_id(), entry_id = %entry.id, kind = ?kind, "ledger entry added");
            (StatusCode::OK, Json(json!({ "success": true, "entry": entry }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::Amount;

    fn entry(kind: LedgerKind, cost: &str) -> LedgerEntry {
        LedgerEntry {
            id: EntryId::new(),
            kind,
            title: "t".to_string(),
            cost: cost.parse::<Amount>().unwrap(),
            detail: "d".to_string(),
            date: Utc::now(),
        }
    }

    #[test]
    fn balance_subtracts_expenses() {
        let entries = [
            entry(LedgerKind::Revenue, "12.50"),
            entry(LedgerKind::Expense, "2.25"),
            entry(LedgerKind::Expense, "20"),
        ];
        assert_eq!(balance(&entries), -975);
        assert_eq!(balance(&[]), 0);
    }

    #[test]
    fn balance_of_large_amounts_does_not_overflow() {
        let entries = [
            entry(LedgerKind::Revenue, "92233720368547758"),
            entry(LedgerKind::Revenue, "92233720368547758"),
        ];
        assert_eq!(balance(&entries), 2 * 9_223_372_036_854_775_800);
        assert_eq!(dto::signed_amount(balance(&entries)), "184467440737095516.00");
    }
}
