// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use url::Url;

use crate::auth::{KeyCache, TokenVerifier};
use crate::config::{ConfigError, Settings, SUPABASE_URL_ENV};
use crate::upstream::{client::DEFAULT_TIMEOUT, DataServiceClient};

/// Shared handles for request handlers. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub data: Arc<DataServiceClient>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, data: DataServiceClient) -> Self {
        Self {
            verifier: Arc::new(verifier),
            data: Arc::new(data),
        }
    }

    /// Build the verifier and data client from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(settings.jwks_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let keys = KeyCache::with_client(settings.jwks_url.as_str(), http)
            .with_cache_ttl(settings.jwks_cache_ttl)
            .with_max_staleness(settings.jwks_max_staleness);
        let verifier = TokenVerifier::new(Arc::new(keys), settings.issuer.clone());

        let data = DataServiceClient::new(&settings.data_service_url, settings.upstream_timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?
            .with_anon_key(settings.anon_key.clone());

        Ok(Self::new(verifier, data))
    }

    /// State with default cache and timeout settings for the given endpoints.
    pub fn for_endpoints(jwks_url: &str, data_url: &str, issuer: &str) -> Result<Self, ConfigError> {
        let keys = KeyCache::new(jwks_url).map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let data_url = Url::parse(data_url).map_err(|e| ConfigError::InvalidUrl {
            name: SUPABASE_URL_ENV,
            reason: e.to_string(),
        })?;
        let data = DataServiceClient::new(&data_url, DEFAULT_TIMEOUT)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::new(TokenVerifier::new(Arc::new(keys), issuer), data))
    }
}
