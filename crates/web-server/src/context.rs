use std::net::IpAddr;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Per-request identity, stored in the request extensions.
///
/// Created by the rate limiter once the client address is known; the
/// authentication guard fills in `subject` from a verified token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub client_ip: Option<IpAddr>,
    /// The `sub` claim of the verified bearer token.
    pub subject: Option<String>,
}

/// The id of the user the request is authenticated as.
///
/// Only usable on routes behind the authentication guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let subject = parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.subject.as_deref())
            .ok_or(AppError::InvalidToken)?;

        // Tokens are only ever issued with a numeric subject.
        subject
            .parse::<i64>()
            .map(AuthenticatedUser)
            .map_err(|e| AppError::Internal(format!("non-numeric token subject {subject:?}: {e}")))
    }
}
