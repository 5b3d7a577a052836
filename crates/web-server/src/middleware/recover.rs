use std::any::Any;

use axum::{
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::error::AppError;

/// Turns a handler panic into the generic 500 response and asks the client
/// to drop the connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicResponder;

impl ResponseForPanic for PanicResponder {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        err: Box<dyn Any + Send + 'static>,
    ) -> axum::http::Response<Self::ResponseBody> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "unknown panic payload".to_string()
        };

        let mut response = AppError::Internal(format!("handler panicked: {detail}")).into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}

pub fn recover_panic_layer() -> CatchPanicLayer<PanicResponder> {
    CatchPanicLayer::custom(PanicResponder)
}

/// Gives the router's bare 405 responses the usual error envelope, keeping
/// its `Allow` header.
pub async fn envelope_method_not_allowed(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let response = next.run(req).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = AppError::MethodNotAllowed(method).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}
