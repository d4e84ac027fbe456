// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SUPABASE_URL` | Data service base URL (REST root is `<url>/rest/v1`) | Required |
//! | `SUPABASE_JWKS_URL` | JWKS endpoint for JWT verification | Required |
//! | `SUPABASE_ISSUER` | Expected JWT issuer claim | Required |
//! | `SUPABASE_ANON_KEY` | `apikey` header sent to the data service | Optional |
//! | `ALLOWED_ORIGINS` | Comma-separated CORS origins outside development | `http://localhost:3000` |
//! | `CORS_ALLOW_CREDENTIALS` | Allow credentialed CORS outside development | `false` |
//! | `ENVIRONMENT` | `development`, `production`, `staging`, ... | `development` |
//! | `HOST` | Server bind IP address (IPv4 or IPv6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime | `300` |
//! | `JWKS_MAX_STALENESS_SECS` | How long stale keys may be served after a failed refresh | `3600` |
//! | `JWKS_TIMEOUT_SECS` | JWKS request timeout | `5` |
//! | `UPSTREAM_TIMEOUT_SECS` | Data service request timeout | `10` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key; serve HTTPS when both are set | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use url::Url;

use crate::logging::LogFormat;

pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_JWKS_URL_ENV: &str = "SUPABASE_JWKS_URL";
pub const SUPABASE_ISSUER_ENV: &str = "SUPABASE_ISSUER";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";
pub const CORS_ALLOW_CREDENTIALS_ENV: &str = "CORS_ALLOW_CREDENTIALS";
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_MAX_STALENESS_ENV: &str = "JWKS_MAX_STALENESS_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_TIMEOUT_SECS";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_JWKS_MAX_STALENESS_SECS: u64 = 3600;
const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 5;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} and {1} must be set together")]
    IncompleteTls(&'static str, &'static str),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// PEM files for terminating TLS in-process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// CORS policy derived from the environment name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSettings {
    /// `None` allows any origin.
    pub origins: Option<Vec<String>>,
    pub allow_credentials: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_service_url: Url,
    pub jwks_url: Url,
    pub issuer: String,
    pub anon_key: Option<String>,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    pub bind_addr: SocketAddr,
    pub jwks_cache_ttl: Duration,
    pub jwks_max_staleness: Duration,
    pub jwks_timeout: Duration,
    pub upstream_timeout: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_service_url = parse_url(SUPABASE_URL_ENV, get(SUPABASE_URL_ENV))?;
        let jwks_url = parse_url(SUPABASE_JWKS_URL_ENV, get(SUPABASE_JWKS_URL_ENV))?;
        let issuer = get(SUPABASE_ISSUER_ENV).ok_or(ConfigError::Missing(SUPABASE_ISSUER_ENV))?;

        let allowed_origins = get(ALLOWED_ORIGINS_ENV)
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        let cors_allow_credentials = match get(CORS_ALLOW_CREDENTIALS_ENV) {
            Some(value) => parse_bool(CORS_ALLOW_CREDENTIALS_ENV, &value)?,
            None => false,
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_number(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?;
        let ip: IpAddr = host.parse().map_err(|_| ConfigError::InvalidValue {
            name: HOST_ENV,
            value: host.clone(),
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls(TLS_CERT_PATH_ENV, TLS_KEY_PATH_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: LOG_FORMAT_ENV,
                value,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            data_service_url,
            jwks_url,
            issuer,
            anon_key: get(SUPABASE_ANON_KEY_ENV),
            environment: get(ENVIRONMENT_ENV).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            allowed_origins,
            cors_allow_credentials,
            bind_addr,
            jwks_cache_ttl: seconds(JWKS_CACHE_TTL_ENV, get(JWKS_CACHE_TTL_ENV), DEFAULT_JWKS_CACHE_TTL_SECS)?,
            jwks_max_staleness: seconds(
                JWKS_MAX_STALENESS_ENV,
                get(JWKS_MAX_STALENESS_ENV),
                DEFAULT_JWKS_MAX_STALENESS_SECS,
            )?,
            jwks_timeout: seconds(JWKS_TIMEOUT_ENV, get(JWKS_TIMEOUT_ENV), DEFAULT_JWKS_TIMEOUT_SECS)?,
            upstream_timeout: seconds(
                UPSTREAM_TIMEOUT_ENV,
                get(UPSTREAM_TIMEOUT_ENV),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?,
            tls,
            log_format,
        })
    }

    pub fn is_development(&self) -> bool {
        matches!(
            self.environment.to_ascii_lowercase().as_str(),
            "development" | "dev" | "local"
        )
    }

    /// Development allows any origin without credentials; other
    /// environments use the configured list and credential flag.
    pub fn cors(&self) -> CorsSettings {
        if self.is_development() {
            CorsSettings {
                origins: None,
                allow_credentials: false,
            }
        } else {
            CorsSettings {
                origins: Some(self.allowed_origins.clone()),
                allow_credentials: self.cors_allow_credentials,
            }
        }
    }

    /// Build the tower-http CORS layer for these settings.
    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let cors = self.cors();
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-requested-with"),
            ]);

        let layer = match cors.origins {
            None => layer.allow_origin(Any),
            Some(origins) => {
                let origins = origins
                    .into_iter()
                    .map(|origin| {
                        HeaderValue::from_str(&origin).map_err(|_| ConfigError::InvalidValue {
                            name: ALLOWED_ORIGINS_ENV,
                            value: origin,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                layer
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_credentials(cors.allow_credentials)
            }
        };
        Ok(layer)
    }
}

fn parse_url(name: &'static str, value: Option<String>) -> Result<Url, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(name))?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn seconds(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    parse_number(name, value, default).map(Duration::from_secs)
}
