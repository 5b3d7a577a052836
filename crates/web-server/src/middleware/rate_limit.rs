use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{context::RequestContext, error::AppError, AppState};

/// Admits the request if its client address still has allowance.
///
/// Also creates the request's [`RequestContext`]. The client address comes
/// from the connection; a request without one cannot be attributed and is
/// treated as a server fault.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .ok_or_else(|| AppError::Internal("client address unavailable".to_string()))?;
    let ip = addr.ip();

    if let Some(tracker) = &state.rate_tracker {
        if !tracker.allow(ip) {
            tracing::debug!(client = %ip, "rate limit exceeded");
            return Err(AppError::RateLimited);
        }
    }

    req.extensions_mut().insert(RequestContext {
        client_ip: Some(ip),
        subject: None,
    });
    Ok(next.run(req).await)
}
