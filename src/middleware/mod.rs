/*
 * Responsibility
 * - gate: the per-request authorization decision
 * - http: transport layers for the local invocation harness
 */
pub mod gate;
pub mod http;

pub use gate::RequestGate;
