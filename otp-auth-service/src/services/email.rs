use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::error::ServiceError;
use crate::config::SmtpConfig;

pub const OTP_SUBJECT: &str = "OTP requested.";

/// Plaintext body of the OTP mail.
pub fn otp_message_body(display_name: &str, otp: &str) -> String {
    format!(
        "Hello, {}.\n\n\
         Someone requested a one-time password for this email.\n\
         If it was you, copy the password below and use it during authorization.\n\
         If it wasn't you, just ignore this letter.\n\
         If you believe that something is going wrong, contact our service.\n\n\
         One-time password: {}",
        display_name, otp
    )
}

/// Delivers one-time passwords out of band.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(
        &self,
        display_name: &str,
        email: &str,
        otp: &str,
    ) -> Result<(), ServiceError>;
}

pub struct SmtpOtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpOtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, anyhow::Error> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid sender address {}: {}", config.sender, e))?;

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP relay: {}", e))?
            .port(config.port)
            .credentials(creds)
            .build();

        tracing::info!(host = %config.host, port = config.port, "SMTP notifier initialized");

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl OtpNotifier for SmtpOtpNotifier {
    async fn send_otp(
        &self,
        display_name: &str,
        email: &str,
        otp: &str,
    ) -> Result<(), ServiceError> {
        let recipient: Mailbox = email
            .parse()
            .map_err(|e| ServiceError::DeliveryFailed(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(OTP_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(otp_message_body(display_name, otp))
            .map_err(|e| ServiceError::DeliveryFailed(format!("Failed to build message: {}", e)))?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to send OTP email");
            ServiceError::DeliveryFailed(format!("Failed to send email: {}", e))
        })?;

        tracing::info!(subject = OTP_SUBJECT, "OTP email sent");
        Ok(())
    }
}

/// A delivery captured by [`MockOtpNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentOtp {
    pub display_name: String,
    pub email: String,
    pub otp: String,
}

/// Mock notifier for testing
#[derive(Default)]
pub struct MockOtpNotifier {
    sent: Mutex<Vec<SentOtp>>,
    fail: AtomicBool,
}

impl MockOtpNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with `DeliveryFailed`.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentOtp> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn send_count(&self) -> usize {
        self.sent().len()
    }

    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|s| s.email.eq_ignore_ascii_case(email))
            .map(|s| s.otp)
    }
}

#[async_trait]
impl OtpNotifier for MockOtpNotifier {
    async fn send_otp(
        &self,
        display_name: &str,
        email: &str,
        otp: &str,
    ) -> Result<(), ServiceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::DeliveryFailed("mock transport refused".to_string()));
        }

        self.sent
            .lock()
            .map_err(|e| {
                ServiceError::Internal(anyhow::anyhow!("Mock notifier mutex poisoned: {}", e))
            })?
            .push(SentOtp {
                display_name: display_name.to_string(),
                email: email.to_string(),
                otp: otp.to_string(),
            });

        tracing::info!(to = %email, "[MOCK] OTP email would be sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_greets_user_and_carries_otp_last() {
        let body = otp_message_body("Ann", "0f3a");
        assert!(body.starts_with("Hello, Ann.\n\n"));
        assert!(body.contains("If it wasn't you, just ignore this letter.\n"));
        assert!(body.ends_with("\n\nOne-time password: 0f3a"));
    }

    #[tokio::test]
    async fn mock_records_and_can_fail() {
        let notifier = MockOtpNotifier::new();
        notifier.send_otp("Ann", "ann@example.com", "abc").await.unwrap();
        assert_eq!(notifier.last_otp_for("ANN@example.com"), Some("abc".to_string()));

        notifier.set_failing(true);
        let err = notifier.send_otp("Ann", "ann@example.com", "def").await.unwrap_err();
        assert!(matches!(err, ServiceError::DeliveryFailed(_)));
        assert_eq!(notifier.send_count(), 1);
    }
}
