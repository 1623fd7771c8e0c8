/*
 * Responsibility
 * - module tree of the authorizer (shared by the Lambda binary and tests)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod edge;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod services;
pub mod state;
