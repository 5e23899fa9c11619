use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{LoginRequest, MessageResponse, OtpRequest, TokenResponse},
    services::{OtpRequestOutcome, ServiceError},
    utils::ValidatedJson,
    AppState,
};

const OTP_REQUESTED_MESSAGE: &str =
    "If the email is registered, a one-time password has been sent";

/// Exchange an email and one-time password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Undecodable body", body = ErrorResponse),
        (status = 403, description = "Bad credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state
        .auth
        .create_session_token(&req.email, &req.password)
        .await
        .map_err(|e| {
            if e.is_credential_failure() {
                tracing::info!(reason = %e, "Login refused");
                AppError::Forbidden(anyhow::anyhow!("Check login and password."))
            } else {
                AppError::from(e)
            }
        })?;

    let codec = state.auth.codec();
    let response = TokenResponse {
        token: codec.prefixed(&token),
        token_type: "Bearer".to_string(),
        expires_in: codec.lifetime_seconds(),
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Request a one-time password by email
///
/// Answers the same way whether or not the address belongs to an account.
#[utoipa::path(
    post,
    path = "/auth/request-otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<OtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth.request_otp(&req.email).await?;

    if let OtpRequestOutcome::Issued(delivery) = outcome {
        if state.config.otp.await_delivery {
            delivery.wait().await.map_err(|e| match e {
                ServiceError::DeliveryFailed(_) => {
                    AppError::InternalError(anyhow::anyhow!("OTP delivery failed"))
                }
                other => AppError::from(other),
            })?;
        }
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: OTP_REQUESTED_MESSAGE.to_string(),
        }),
    ))
}
