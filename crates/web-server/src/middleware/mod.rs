//! The admission pipeline, outermost first: panic recovery, CORS, per-client
//! rate limiting, then (on protected routes only) bearer authentication.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod recover;

pub use auth::require_authenticated_user;
pub use cors::{answer_options, cors_layer};
pub use rate_limit::rate_limit;
pub use recover::{envelope_method_not_allowed, recover_panic_layer};
