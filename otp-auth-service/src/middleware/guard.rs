use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use crate::models::{Authority, Identity};

/// Admit only requests whose identity holds `required`.
pub async fn require_authority(
    required: Authority,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

    if !identity.has_authority(required) {
        tracing::warn!(
            required = required.as_str(),
            granted = ?identity.scopes(),
            "Insufficient authority"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Insufficient authority. Required: {}",
            required.as_str()
        )));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(identity: Option<Identity>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(|req: Request, next: Next| {
                require_authority(Authority::User, req, next)
            }))
            .layer(middleware::from_fn(move |mut req: Request, next: Next| {
                let identity = identity.clone();
                async move {
                    if let Some(identity) = identity {
                        req.extensions_mut().insert(identity);
                    }
                    next.run(req).await
                }
            }))
    }

    async fn status(identity: Option<Identity>) -> StatusCode {
        app(identity)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        assert_eq!(status(None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn identity_without_authority_is_forbidden() {
        let mut identity = Identity::new("a@b.com".to_string(), String::new());
        identity.authorities.clear();
        assert_eq!(status(Some(identity)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn user_authority_passes() {
        let identity = Identity::new("a@b.com".to_string(), "otp".to_string());
        assert_eq!(status(Some(identity)).await, StatusCode::OK);
    }
}
