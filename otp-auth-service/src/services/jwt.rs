use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;

/// Why a presented token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature does not verify")]
    InvalidSignature,
    #[error("Token is malformed")]
    Malformed,
    #[error("Token has expired")]
    Expired,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user email)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Granted authorities
    pub scopes: Vec<String>,
}

/// Mints and verifies HS512-signed session tokens.
///
/// Tokens are self-contained: nothing is stored server side, so validity is
/// decided by the signature and the embedded timestamps alone.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    lifetime: Duration,
    prefix: String,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(anyhow::anyhow!("Token signing secret must not be empty"));
        }

        // Expiry is checked by hand so that a token is dead *at* its `exp`.
        let mut validation = Validation::new(Algorithm::HS512);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        tracing::info!(issuer = %config.issuer, "Token codec initialized with HS512");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            lifetime: Duration::milliseconds(config.expiration_ms),
            prefix: config.token_prefix.clone(),
        })
    }

    /// Mint a token for `subject` valid for the configured lifetime.
    pub fn mint(&self, subject: &str, scopes: &[String]) -> Result<String, anyhow::Error> {
        self.mint_at(subject, scopes, Utc::now())
    }

    /// Mint a token as if issued at `now`.
    pub fn mint_at(
        &self,
        subject: &str,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Result<String, anyhow::Error> {
        let exp = now + self.lifetime;

        let claims = SessionClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            scopes: scopes.to_vec(),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))
    }

    /// Verify the signature and expiry of `token` and return its claims.
    pub fn parse(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.parse_at(token, Utc::now())
    }

    pub fn parse_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// True when `token` parses, names `expected_subject`, and is inside both
    /// its own expiry and the configured lifetime measured from issue time.
    pub fn is_valid(&self, token: &str, expected_subject: &str) -> bool {
        self.is_valid_at(token, expected_subject, Utc::now())
    }

    pub fn is_valid_at(&self, token: &str, expected_subject: &str, now: DateTime<Utc>) -> bool {
        let claims = match self.parse_at(token, now) {
            Ok(claims) => claims,
            Err(_) => return false,
        };

        let age_ms = now.timestamp_millis() - claims.iat * 1000;
        claims.sub == expected_subject && age_ms <= self.lifetime.num_milliseconds()
    }

    /// Token as presented to clients, e.g. `Bearer <jwt>`.
    pub fn prefixed(&self, token: &str) -> String {
        format!("{}{}", self.prefix, token)
    }

    /// Pull the raw token out of an `Authorization` header value.
    pub fn strip_prefix<'a>(&self, header_value: &'a str) -> Option<&'a str> {
        header_value
            .strip_prefix(self.prefix.as_str())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Configured token lifetime in seconds (for client info)
    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}
