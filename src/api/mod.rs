/*
 * Responsibility
 * - local invocation harness (AUTHORIZER_MODE=local)
 * - re-export routes() for app.rs and integration tests
 */
pub mod handlers;
mod routes;

pub use routes::{routes, routes_with_limits};
