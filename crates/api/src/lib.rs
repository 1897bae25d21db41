//! HTTP API for the backoffice: routing, authentication middleware and the
//! in-memory collaborators behind the handlers.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod notifier;
pub mod store;
