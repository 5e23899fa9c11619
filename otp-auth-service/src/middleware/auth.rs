use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::Identity, services::ServiceError, AppState};

/// Establish the caller's identity from a bearer token, if one checks out.
///
/// Runs on every request and never rejects: a missing, malformed, expired or
/// unverifiable token just leaves the request unauthenticated for the guards
/// downstream to judge.
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let codec = state.auth.codec();

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| codec.strip_prefix(value))
        .map(str::to_string);

    let Some(token) = token else {
        return next.run(req).await;
    };

    let subject = match codec.parse(&token) {
        Ok(claims) => claims.sub,
        Err(e) => {
            tracing::debug!(reason = %e, "Bearer token rejected");
            return next.run(req).await;
        }
    };

    if req.extensions().get::<Identity>().is_some() {
        return next.run(req).await;
    }

    match state.auth.resolve_identity(&subject).await {
        Ok(identity) if !identity.enabled => {
            tracing::info!(error = %ServiceError::Disabled, "Identity not established");
        }
        Ok(identity) => {
            if codec.is_valid(&token, &identity.username) {
                req.extensions_mut().insert(identity);
            } else {
                tracing::debug!("Token does not match resolved identity");
            }
        }
        Err(e @ ServiceError::Store(_)) | Err(e @ ServiceError::Internal(_)) => {
            tracing::warn!(error = %e, "Identity lookup failed");
        }
        Err(e) => {
            tracing::debug!(error = %e, "Identity not established");
        }
    }

    next.run(req).await
}

/// Extractor for the identity established by [`authenticate_request`].
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(AuthUser(identity.clone()))
    }
}
