use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    /// The one-time password received by mail.
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OtpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Ready to paste into the `Authorization` header.
    #[schema(example = "Bearer eyJhbGciOiJIUzUxMiJ9...")]
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "If the email is registered, a one-time password has been sent")]
    pub message: String,
}
