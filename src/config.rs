/*
 * Responsibility
 * - 環境変数や設定の読み込み (token scheme, 鍵, session backend, identification 方式など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Which credential the service issues and how it is resolved.
#[derive(Clone)]
pub enum TokenScheme {
    Hs256 {
        secret: String,
    },
    Rs256 {
        private_key_pem: String,
        public_key_pem: String,
    },
    /// Opaque handles resolved through the session store.
    Opaque,
}

impl std::fmt::Debug for TokenScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        match self {
            Self::Hs256 { .. } => f.write_str("Hs256"),
            Self::Rs256 { .. } => f.write_str("Rs256"),
            Self::Opaque => f.write_str("Opaque"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Postgres,
    Valkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierSource {
    Header(String),
    PeerAddress,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub database_url: Option<String>,
    pub valkey_url: Option<String>,

    pub token_scheme: TokenScheme,
    pub session_backend: SessionBackend,
    pub identifier_source: IdentifierSource,
    pub access_token_ttl_seconds: i64,
    pub resolve_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let database_url = std::env::var("DATABASE_URL").ok();
        let valkey_url = std::env::var("VALKEY_URL").ok();

        let token_scheme = match std::env::var("AUTH_TOKEN_SCHEME")
            .unwrap_or_else(|_| "hs256".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "hs256" => TokenScheme::Hs256 {
                secret: hmac_secret(std::env::var("AUTH_HMAC_SECRET").ok())?,
            },
            "rs256" => TokenScheme::Rs256 {
                private_key_pem: pem_from_env("AUTH_RSA_PRIVATE_KEY_PEM")?,
                public_key_pem: pem_from_env("AUTH_RSA_PUBLIC_KEY_PEM")?,
            },
            "opaque" => TokenScheme::Opaque,
            _ => return Err(ConfigError::Invalid("AUTH_TOKEN_SCHEME")),
        };

        let session_backend = match std::env::var("AUTH_SESSION_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => SessionBackend::Memory,
            "postgres" => SessionBackend::Postgres,
            "valkey" => SessionBackend::Valkey,
            _ => return Err(ConfigError::Invalid("AUTH_SESSION_BACKEND")),
        };

        if matches!(token_scheme, TokenScheme::Opaque) {
            match session_backend {
                SessionBackend::Postgres if database_url.is_none() => {
                    return Err(ConfigError::Missing("DATABASE_URL"));
                }
                SessionBackend::Valkey if valkey_url.is_none() => {
                    return Err(ConfigError::Missing("VALKEY_URL"));
                }
                _ => {}
            }
        }

        let identifier_source = match std::env::var("AUTH_IDENTIFIER")
            .unwrap_or_else(|_| "header".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "header" => IdentifierSource::Header(
                std::env::var("AUTH_HEADER")
                    .unwrap_or_else(|_| "authorization".to_string())
                    .to_ascii_lowercase(),
            ),
            "peer" => IdentifierSource::PeerAddress,
            _ => return Err(ConfigError::Invalid("AUTH_IDENTIFIER")),
        };

        let access_token_ttl_seconds =
            access_token_ttl(std::env::var("ACCESS_TOKEN_TTL_SECONDS").ok())?;

        let resolve_timeout = std::env::var("AUTH_RESOLVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(2));

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            valkey_url,
            token_scheme,
            session_backend,
            identifier_source,
            access_token_ttl_seconds,
            resolve_timeout,
        })
    }
}

/// Shorter HMAC keys are refused at startup.
pub const MIN_HMAC_SECRET_LEN: usize = 32;

/// Longest accepted credential lifetime (30 days).
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

fn hmac_secret(value: Option<String>) -> Result<String, ConfigError> {
    let secret = value.ok_or(ConfigError::Missing("AUTH_HMAC_SECRET"))?;
    if secret.len() < MIN_HMAC_SECRET_LEN {
        return Err(ConfigError::Invalid("AUTH_HMAC_SECRET"));
    }
    Ok(secret)
}

fn access_token_ttl(value: Option<String>) -> Result<i64, ConfigError> {
    let Some(raw) = value else {
        return Ok(3600);
    };
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|ttl| (1..=MAX_ACCESS_TOKEN_TTL_SECONDS).contains(ttl))
        .ok_or(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"))
}

// PEM in a single-line env var uses literal `\n`
fn pem_from_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .map(|v| v.replace("\\n", "\n"))
        .map_err(|_| ConfigError::Missing(key))
}
