//! OTP lifecycle and credential verification.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::task::JoinHandle;

use super::email::OtpNotifier;
use super::error::ServiceError;
use super::jwt::TokenCodec;
use super::store::{OtpStore, UserStore};
use crate::config::OtpConfig;
use crate::models::{Identity, OtpRecord};

/// Bytes of randomness in a generated one-time password.
const OTP_BYTES: usize = 16;

/// Result of an OTP request. Callers must not reveal which case occurred.
#[derive(Debug)]
pub enum OtpRequestOutcome {
    /// No account for the address; nothing was stored or sent.
    UnknownEmail,
    /// An unexpired OTP already exists; nothing new was stored or sent.
    AlreadyIssued,
    /// A new OTP was stored and handed to the notifier.
    Issued(DeliveryHandle),
}

/// Handle to the background mail delivery started by `request_otp`.
#[derive(Debug)]
pub struct DeliveryHandle(JoinHandle<Result<(), ServiceError>>);

impl DeliveryHandle {
    /// Wait for the notifier's verdict.
    pub async fn wait(self) -> Result<(), ServiceError> {
        self.0
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Delivery task failed: {}", e)))?
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    otps: Arc<dyn OtpStore>,
    notifier: Arc<dyn OtpNotifier>,
    codec: TokenCodec,
    otp_lifetime: Duration,
}

pub fn generate_otp() -> String {
    let mut bytes = [0u8; OTP_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        otps: Arc<dyn OtpStore>,
        notifier: Arc<dyn OtpNotifier>,
        codec: TokenCodec,
        otp_config: &OtpConfig,
    ) -> Self {
        Self {
            users,
            otps,
            notifier,
            codec,
            otp_lifetime: Duration::milliseconds(otp_config.expiration_ms),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn request_otp(&self, email: &str) -> Result<OtpRequestOutcome, ServiceError> {
        self.request_otp_at(email, Utc::now()).await
    }

    /// Issue an OTP for `email` unless one is still live at `now`.
    ///
    /// Mail goes out on a spawned task; a failed send leaves the stored OTP in
    /// place.
    #[tracing::instrument(skip(self, email))]
    pub async fn request_otp_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpRequestOutcome, ServiceError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            tracing::debug!("OTP requested for unknown email");
            return Ok(OtpRequestOutcome::UnknownEmail);
        };

        if let Some(existing) = self.otps.find_otp_by_email(&user.email).await? {
            if !existing.is_expired_at(now) {
                tracing::debug!(user_id = %user.id, "Live OTP already issued");
                return Ok(OtpRequestOutcome::AlreadyIssued);
            }
            self.otps.delete_otp_by_email(&user.email).await?;
        }

        let password = generate_otp();
        let record = OtpRecord::new(&user.email, password.clone(), now, self.otp_lifetime);
        self.otps.save_otp(&record).await?;

        tracing::info!(
            user_id = %user.id,
            expires_utc = %record.expires_utc,
            "OTP issued"
        );

        let notifier = Arc::clone(&self.notifier);
        let display_name = user.display_name().to_string();
        let address = user.email.clone();
        let user_id = user.id;
        let handle = tokio::spawn(async move {
            let result = notifier.send_otp(&display_name, &address, &password).await;
            if let Err(e) = &result {
                tracing::error!(user_id = %user_id, error = %e, "OTP delivery failed");
            }
            result
        });

        Ok(OtpRequestOutcome::Issued(DeliveryHandle(handle)))
    }

    pub async fn resolve_identity(&self, email: &str) -> Result<Identity, ServiceError> {
        self.resolve_identity_at(email, Utc::now()).await
    }

    /// Identity for `email` whose credential is the live OTP, or empty when
    /// none has been issued.
    pub async fn resolve_identity_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Identity, ServiceError> {
        let user = self
            .users
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        match self.otps.find_otp_by_email(&user.email).await? {
            None => Ok(Identity::new(user.email, String::new())),
            Some(otp) if otp.is_expired_at(now) => Err(ServiceError::OtpExpired),
            Some(otp) => Ok(Identity::new(user.email, otp.password)),
        }
    }

    /// Verify `supplied` against the live OTP for `email`, mint a token and
    /// consume the OTP. Returns the unprefixed token.
    #[tracing::instrument(skip(self, email, supplied))]
    pub async fn create_session_token(
        &self,
        email: &str,
        supplied: &str,
    ) -> Result<String, ServiceError> {
        let identity = self.resolve_identity(email).await?;

        if !identity.has_credential() {
            return Err(ServiceError::AccessDenied);
        }
        if !identity.enabled {
            return Err(ServiceError::Disabled);
        }

        let matches: bool = identity
            .credential
            .as_bytes()
            .ct_eq(supplied.as_bytes())
            .into();
        if !matches {
            tracing::info!("OTP mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.codec.mint(&identity.username, &identity.scopes())?;

        // A concurrent login that consumed the OTP first wins.
        if !self.otps.delete_otp_by_email(&identity.username).await? {
            tracing::warn!("OTP consumed concurrently");
            return Err(ServiceError::AccessDenied);
        }

        tracing::info!("Session token issued");
        Ok(token)
    }

    /// Remove OTPs that expired before `now`. Returns how many were removed.
    pub async fn delete_expired_otps(&self, now: DateTime<Utc>) -> Result<u64, ServiceError> {
        let removed = self.otps.delete_otps_expired_before(now).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired OTPs deleted");
        }
        Ok(removed)
    }
}
