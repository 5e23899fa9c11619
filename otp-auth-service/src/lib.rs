pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::{AuthConfig, BootstrapUserConfig};
use crate::dtos::user::UserCreateRequest;
use crate::models::Authority;
use crate::services::{AuthService, Database, ServiceError, UserService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::request_otp,
        handlers::user::list_users,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::LoginRequest,
            dtos::auth::OtpRequest,
            dtos::auth::TokenResponse,
            dtos::auth::MessageResponse,
            dtos::user::UserCreateRequest,
            dtos::user::UserUpdateRequest,
            dtos::user::UserResponse,
            models::MaritalStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "One-time password login"),
        (name = "User", description = "User profile management"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    /// Absent when running on the in-memory store.
    pub db: Option<Database>,
    pub auth: AuthService,
    pub users: UserService,
}

pub fn build_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/users/:user_id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(from_fn(|req: Request, next: Next| {
            middleware::require_authority(Authority::User, req, next)
        }));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/auth/login", post(handlers::login))
        .route("/auth/request-otp", post(handlers::request_otp))
        .merge(user_routes)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::authenticate_request,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Database unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let database = match &state.db {
        Some(db) => {
            db.health_check().await?;
            "up"
        }
        None => "in-memory",
    };

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": database
        }
    })))
}

/// Seed the configured bootstrap user so the guarded `/users` routes have
/// someone who can log in. An existing account with that email is kept.
pub async fn bootstrap_user(
    users: &UserService,
    config: &BootstrapUserConfig,
) -> Result<(), ServiceError> {
    let request = UserCreateRequest {
        name: Some(config.name.clone()),
        last_name: Some(config.last_name.clone()),
        email: Some(config.email.clone()),
        birth_day: Some(config.birth_day.clone()),
        marital_status: Some(config.marital_status.clone()),
    };

    match users.register_user(request).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Bootstrap user created");
            Ok(())
        }
        Err(ServiceError::EmailAlreadyRegistered) => {
            tracing::info!("Bootstrap user already present");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
