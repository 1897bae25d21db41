use axum::{Router, routing::get};

pub mod admins;
pub mod common;
pub mod customers;
pub mod financials;
pub mod orders;
pub mod system;
pub mod users;

/// Endpoints reachable without a session token.
pub fn public_router() -> Router {
    admins::public_router().merge(users::public_router())
}

/// Endpoints that require a session token.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(admins::router())
        .merge(customers::router())
        .merge(users::router())
        .nest("/financials", financials::router())
        .nest("/orders", orders::router())
}
