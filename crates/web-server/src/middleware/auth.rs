use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{context::RequestContext, error::AppError, AppState};

/// Requires `Authorization: Bearer <token>` with a valid token and records
/// its subject in the [`RequestContext`].
pub async fn require_authenticated_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::InvalidToken)?;

    let token = bearer_token(header_value).ok_or(AppError::InvalidToken)?;
    let subject = state.tokens.verify(token)?;

    match req.extensions_mut().get_mut::<RequestContext>() {
        Some(ctx) => ctx.subject = Some(subject),
        None => {
            req.extensions_mut().insert(RequestContext {
                client_ip: None,
                subject: Some(subject),
            });
        }
    }
    Ok(next.run(req).await)
}

/// The token of a header that is exactly `Bearer <token>`.
fn bearer_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn header_must_be_exactly_two_parts() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("bearer abc"), None);
        assert_eq!(bearer_token("Token abc"), None);
        assert_eq!(bearer_token("Bearer abc extra"), None);
        assert_eq!(bearer_token("Bearer  abc"), None);
    }
}
