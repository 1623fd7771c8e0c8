/*
 * Responsibility
 * - services used by the request gate
 *   - params: identity pool parameters from the parameter store
 *   - auth: token verification and the shared verifier lifecycle
 */
pub mod auth;
pub mod params;
