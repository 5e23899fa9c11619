use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::services::DEFAULT_SWEEP_CRON;

/// HS512 wants a key at least as long as its 64-byte digest.
pub const MIN_SECRET_BYTES: usize = 64;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub smtp: SmtpConfig,
    pub security: SecurityConfig,
    pub bootstrap: Option<BootstrapUserConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Session token settings. Fixed for the life of the process.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub expiration_ms: i64,
    /// Prepended to issued tokens and stripped from `Authorization` headers.
    pub token_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub expiration_ms: i64,
    /// Six-field cron expression (with seconds) for the expiry sweep.
    pub sweep_cron: String,
    /// Hold `/auth/request-otp` until the mail transport answers.
    pub await_delivery: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub sender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

/// Optional account created at startup so the guarded `/users` API is reachable.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapUserConfig {
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub birth_day: String,
    pub marital_status: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("otp-auth-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_optional_env("OTEL_EXPORTER_OTLP_ENDPOINT"),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                issuer: get_env("JWT_ISSUER", Some("otp-auth-service"), is_prod)?,
                expiration_ms: parse_env("JWT_EXPIRATION_MS", Some("3600000"), is_prod)?,
                token_prefix: get_env("JWT_TOKEN_PREFIX", Some("Bearer "), is_prod)?,
            },
            otp: OtpConfig {
                expiration_ms: parse_env("OTP_EXPIRATION_MS", Some("300000"), is_prod)?,
                sweep_cron: get_env("OTP_SWEEP_CRON", Some(DEFAULT_SWEEP_CRON), is_prod)?,
                await_delivery: parse_env("OTP_AWAIT_DELIVERY", Some("false"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: parse_env("SMTP_PORT", Some("587"), is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: Secret::new(get_env("SMTP_PASSWORD", None, is_prod)?),
                sender: get_env("OTP_SENDER", None, is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            bootstrap: match get_optional_env("BOOTSTRAP_USER_EMAIL") {
                Some(email) => Some(BootstrapUserConfig {
                    email,
                    name: get_env("BOOTSTRAP_USER_NAME", None, false)?,
                    last_name: get_env("BOOTSTRAP_USER_LAST_NAME", None, false)?,
                    birth_day: get_env("BOOTSTRAP_USER_BIRTH_DAY", None, false)?,
                    marital_status: get_env(
                        "BOOTSTRAP_USER_MARITAL_STATUS",
                        Some("SINGLE"),
                        false,
                    )?,
                }),
                None => None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(config_error("PORT must be greater than 0"));
        }

        // Token timestamps have whole-second resolution.
        if self.jwt.expiration_ms < 1000 || self.jwt.expiration_ms % 1000 != 0 {
            return Err(config_error(
                "JWT_EXPIRATION_MS must be a positive whole number of seconds",
            ));
        }

        if self.otp.expiration_ms <= 0 {
            return Err(config_error("OTP_EXPIRATION_MS must be positive"));
        }

        if self.jwt.issuer.trim().is_empty() {
            return Err(config_error("JWT_ISSUER must not be empty"));
        }

        if self.jwt.token_prefix.is_empty() {
            return Err(config_error("JWT_TOKEN_PREFIX must not be empty"));
        }

        if self.jwt.secret.expose_secret().len() < MIN_SECRET_BYTES {
            return Err(config_error(&format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(config_error("Wildcard CORS origin not allowed in production"));
        }

        Ok(())
    }
}

fn config_error(message: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!(message.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    get_env(key, default, is_prod)?
        .trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{} is invalid: {}", key, e)))
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn test_config() -> AuthConfig {
        AuthConfig {
            common: core_config::Config { port: 8080 },
            environment: Environment::Dev,
            service_name: "otp-auth-service".to_string(),
            service_version: "test".to_string(),
            log_level: "error".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: "postgres://localhost/otp_test".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: Secret::new("k".repeat(MIN_SECRET_BYTES)),
                issuer: "otp-auth-service".to_string(),
                expiration_ms: 60_000,
                token_prefix: "Bearer ".to_string(),
            },
            otp: OtpConfig {
                expiration_ms: 300_000,
                sweep_cron: "0 */5 * * * *".to_string(),
                await_delivery: false,
            },
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                user: "mailer@example.com".to_string(),
                password: Secret::new("password".to_string()),
                sender: "no-reply@example.com".to_string(),
            },
            security: SecurityConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            bootstrap: None,
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn rejects_short_signing_secret() {
        let mut config = test_config();
        config.jwt.secret = Secret::new("too-short".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_lifetimes() {
        let mut config = test_config();
        config.otp.expiration_ms = 0;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.jwt.expiration_ms = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_sub_second_token_lifetimes() {
        let mut config = test_config();
        config.jwt.expiration_ms = 900;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.jwt.expiration_ms = 1_500;
        assert!(config.validate().is_err());

        let mut config = test_config();
        config.jwt.expiration_ms = 1_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_wildcard_origin_in_prod() {
        let mut config = test_config();
        config.environment = Environment::Prod;
        config.security.allowed_origins = vec!["*".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }
}
