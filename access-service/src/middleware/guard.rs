//! Permission guard middleware for unscoped routes.
//!
//! Business-unit-scoped routes authorize in their handlers, where the
//! target id is known; this layer covers routes whose permission is
//! global (user administration and the like).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::{AccessService, RequestOrigin};
use access_core::Permission;

/// Middleware to require an unscoped permission on a route group.
///
/// Apply after `auth_middleware`: 401 comes from that layer, 403 from
/// this one.
pub async fn require_permission(
    State(access): State<AccessService>,
    permission: Permission,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = RequestOrigin {
        method: req.method().to_string(),
        endpoint: req.uri().path().to_string(),
    };

    let user = req.extensions().get::<CurrentUser>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Current user missing from request extensions"
        ))
    })?;

    access
        .authorize(user.user_id, user.organization_id, permission, None, &origin)
        .await?;

    Ok(next.run(req).await)
}

/// Extractor handing handlers the request origin for audit events.
#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestOrigin {
            method: parts.method.to_string(),
            endpoint: parts.uri.path().to_string(),
        })
    }
}
