use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::services::AuthTimeouts;

/// Minimum signing-secret length accepted in production.
const MIN_PROD_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    /// Base URL of the frontend; emailed links are built from it.
    pub frontend_url: String,
    pub notification: NotificationConfig,
    pub store_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
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

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: SecretString,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    Smtp,
    Resend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    pub provider: NotificationProvider,
    /// Sender mailbox, e.g. `Acme <no-reply@acme.io>`.
    pub from: String,
    pub timeout_seconds: u64,
    pub smtp: Option<SmtpConfig>,
    pub resend: Option<ResendConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResendConfig {
    pub api_key: SecretString,
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub register_attempts: u32,
    pub register_window_seconds: u64,
    pub password_reset_attempts: u32,
    pub password_reset_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let provider: NotificationProvider = parse_env("NOTIFICATION_PROVIDER", Some("smtp"), is_prod)?;
        let smtp = match provider {
            NotificationProvider::Smtp => Some(SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: parse_env("SMTP_PORT", Some("587"), is_prod)?,
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: SecretString::new(get_env("SMTP_PASSWORD", Some(""), is_prod)?),
            }),
            NotificationProvider::Resend => None,
        };
        let resend = match provider {
            NotificationProvider::Resend => Some(ResendConfig {
                api_key: SecretString::new(get_env("RESEND_API_KEY", None, is_prod)?),
                api_url: get_env("RESEND_API_URL", Some("https://api.resend.com"), is_prod)?,
            }),
            NotificationProvider::Smtp => None,
        };

        let config = IdentityConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("identity-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: SecretString::new(get_env("JWT_SECRET", None, is_prod)?),
            },
            frontend_url: get_env("FRONTEND_URL", Some("http://localhost:3000"), is_prod)?,
            notification: NotificationConfig {
                provider,
                from: get_env("NOTIFICATION_FROM", Some("Identity <no-reply@localhost>"), is_prod)?,
                timeout_seconds: parse_env("NOTIFICATION_TIMEOUT_SECONDS", Some("10"), is_prod)?,
                smtp,
                resend,
            },
            store_timeout_seconds: parse_env("STORE_TIMEOUT_SECONDS", Some("5"), is_prod)?,
            request_timeout_seconds: parse_env("REQUEST_TIMEOUT_SECONDS", Some("30"), is_prod)?,
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            swagger: SwaggerConfig {
                enabled: parse_env("ENABLE_SWAGGER", Some("public"), is_prod)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: parse_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?,
                login_window_seconds: parse_env("RATE_LIMIT_LOGIN_WINDOW_SECONDS", Some("900"), is_prod)?,
                register_attempts: parse_env("RATE_LIMIT_REGISTER_ATTEMPTS", Some("3"), is_prod)?,
                register_window_seconds: parse_env("RATE_LIMIT_REGISTER_WINDOW_SECONDS", Some("3600"), is_prod)?,
                password_reset_attempts: parse_env("RATE_LIMIT_PASSWORD_RESET_ATTEMPTS", Some("3"), is_prod)?,
                password_reset_window_seconds: parse_env(
                    "RATE_LIMIT_PASSWORD_RESET_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?,
                global_ip_limit: parse_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?,
                global_ip_window_seconds: parse_env("RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS", Some("60"), is_prod)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!("PORT must be greater than 0")));
        }

        if self.jwt.secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!("JWT_SECRET must not be empty")));
        }

        if self.store_timeout_seconds == 0
            || self.notification.timeout_seconds == 0
            || self.request_timeout_seconds == 0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!("Timeouts must be positive")));
        }

        if !(self.frontend_url.starts_with("http://") || self.frontend_url.starts_with("https://")) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "FRONTEND_URL must be an http(s) URL"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        // In production, ensure stricter validation
        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.jwt.secret.expose_secret().len() < MIN_PROD_SECRET_BYTES {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PROD_SECRET_BYTES
                )));
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::warn!("Swagger is publicly accessible in production - consider 'disabled'");
            }
        }

        Ok(())
    }

    pub fn auth_timeouts(&self) -> AuthTimeouts {
        AuthTimeouts {
            store: Duration::from_secs(self.store_timeout_seconds),
            notification: Duration::from_secs(self.notification.timeout_seconds),
        }
    }
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
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e)))
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

impl FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}

impl FromStr for NotificationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smtp" => Ok(NotificationProvider::Smtp),
            "resend" => Ok(NotificationProvider::Resend),
            _ => Err(format!("Invalid notification provider: {}", s)),
        }
    }
}
