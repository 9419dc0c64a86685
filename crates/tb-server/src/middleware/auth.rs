//! Bearer-token authentication for the `/api` routes.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tb_core::{Error, UserId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::tokens::bearer_token;

/// Resolve the caller from the `Authorization` header.
fn authenticate(ctx: &AppContext, authorization: Option<&str>) -> Result<UserId, Error> {
    let keys = ctx
        .tokens
        .as_ref()
        .ok_or_else(|| Error::Unauthorized("token signing is not configured".into()))?;
    let header =
        authorization.ok_or_else(|| Error::Unauthorized("missing bearer token".into()))?;
    let token = bearer_token(header)
        .ok_or_else(|| Error::Unauthorized("malformed authorization header".into()))?;
    keys.verify(token)
}

/// Authentication middleware. Applied to protected routes only.
///
/// On success, inserts the resolved [`UserId`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    match authenticate(&ctx, authorization.as_deref()) {
        Ok(user_id) => {
            tracing::debug!(user_id = %user_id, "Authenticated request");
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        Err(e) => {
            let mut err = AppError::new(e);
            if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
                err = err.with_request_id(id.clone());
            }
            Err(err.into_response())
        }
    }
}
