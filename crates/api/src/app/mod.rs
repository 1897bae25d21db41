//! HTTP application wiring (Axum router + shared services).
//!
//! - `services.rs`: store, authorizer, token keys and notifier
//! - `routes/`: handlers, one file per area
//! - `schemas.rs`: validation rule sets per request shape
//! - `dto.rs`: query/response helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use backoffice_auth::TokenValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod schemas;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router.
pub fn build_app(services: AppServices) -> Router {
    let tokens: Arc<dyn TokenValidator> = Arc::new(services.verifier.clone());
    let auth_state = middleware::AuthState { tokens };
    let services = Arc::new(services);

    // Everything except health, logins, registration of the first admin and
    // of customers, and activation needs a session token.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
