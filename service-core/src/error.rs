use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by request field name.
pub type FieldMessages = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        fields: FieldMessages,
    },

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldMessages>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationFailed { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full and rendered with a fixed message.
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match self {
            AppError::ValidationFailed { message, fields } => ErrorResponse {
                error: message,
                details: None,
                fields: Some(fields),
            },
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Unauthorized(err)
            | AppError::Conflict(err) => ErrorResponse {
                error: err.to_string(),
                details: None,
                fields: None,
            },
            AppError::Forbidden(err) => ErrorResponse {
                error: "Access denied".to_string(),
                details: Some(err.to_string()),
                fields: None,
            },
            AppError::ServiceUnavailable => ErrorResponse {
                error: "Service unavailable".to_string(),
                details: None,
                fields: None,
            },
            AppError::InternalError(_) | AppError::ConfigError(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                details: None,
                fields: None,
            },
            AppError::DatabaseError(_) => ErrorResponse {
                error: "Database error".to_string(),
                details: None,
                fields: None,
            },
            AppError::EmailError(_) => ErrorResponse {
                error: "Email delivery failed".to_string(),
                details: None,
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_failure_renders_fields() {
        let mut fields = FieldMessages::new();
        fields.insert("name".to_string(), vec!["Field Name is too long.".to_string()]);

        let (status, json) = body_json(AppError::ValidationFailed {
            message: "Bad request".to_string(),
            fields,
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["fields"]["name"][0], "Field Name is too long.");
    }

    #[tokio::test]
    async fn internal_error_hides_cause() {
        let (status, json) =
            body_json(AppError::InternalError(anyhow::anyhow!("smtp relay refused: 535"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn forbidden_renders_access_denied() {
        let (status, json) =
            body_json(AppError::Forbidden(anyhow::anyhow!("Check login and password."))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "Access denied");
        assert_eq!(json["details"], "Check login and password.");
    }

    #[tokio::test]
    async fn unavailable_renders_fixed_message() {
        let (status, json) = body_json(AppError::ServiceUnavailable).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Service unavailable");
    }
}
