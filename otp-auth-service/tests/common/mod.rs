//! Shared setup for the HTTP integration tests: an in-memory store, a
//! recording notifier and the real router.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use otp_auth_service::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, JwtConfig, OtpConfig, SecurityConfig, SmtpConfig,
    },
    models::{MaritalStatus, User},
    services::{AuthService, MemoryStore, MockOtpNotifier, TokenCodec, UserService, UserStore},
    AppState,
};
use secrecy::Secret;
use service_core::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str =
    "integration-test-secret-integration-test-secret-integration-test-secret";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: Config { port: 0 },
        environment: Environment::Dev,
        service_name: "otp-auth-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_SECRET.to_string()),
            issuer: "otp-auth-service-test".to_string(),
            expiration_ms: 60_000,
            token_prefix: "Bearer ".to_string(),
        },
        otp: OtpConfig {
            expiration_ms: 300_000,
            sweep_cron: "0 */5 * * * *".to_string(),
            await_delivery: true,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            user: "mailer".to_string(),
            password: Secret::new("unused".to_string()),
            sender: "noreply@example.com".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        bootstrap: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<MockOtpNotifier>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockOtpNotifier::new());
        let codec = TokenCodec::new(&config.jwt).expect("codec");

        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
            codec,
            &config.otp,
        );
        let users = UserService::new(store.clone());

        let state = AppState {
            config: Arc::new(config),
            db: None,
            auth,
            users,
        };

        Self {
            router: build_router(state.clone()),
            state,
            store,
            notifier,
        }
    }

    pub async fn seed_user(&self, email: &str) -> User {
        let user = User::new(
            email.to_string(),
            "Ann".to_string(),
            "Lee".to_string(),
            NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
            MaritalStatus::Single,
        );
        self.store.save_user(&user).await.expect("seed user");
        user
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request_otp(&self, email: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/request-otp",
            None,
            Some(serde_json::json!({ "email": email })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/auth/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Seeded user's full OTP round trip; returns the `Authorization` value.
    pub async fn bearer_for(&self, email: &str) -> String {
        let response = self.request_otp(email).await;
        assert_eq!(response.status, StatusCode::OK);

        let otp = self.notifier.last_otp_for(email).expect("otp was mailed");
        let response = self.login(email, &otp).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        response.body["token"].as_str().expect("token").to_string()
    }
}
