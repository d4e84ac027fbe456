// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Authentication error type.
///
/// The variants distinguish failure reasons for logging only. Every
/// verification failure renders as the same generic 401 so callers cannot
/// learn which check rejected their token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("authorization header is required")]
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    #[error("authorization header is not a bearer credential")]
    InvalidAuthHeader,
    /// Token could not be parsed
    #[error("token is malformed")]
    MalformedToken,
    /// Token header has no `kid`
    #[error("token header has no key id")]
    MissingKeyId,
    /// No key in the current set carries the token's `kid`
    #[error("no matching key found in JWKS")]
    NoMatchingKey,
    /// `alg` outside the allow-list or inconsistent with the matched key
    #[error("token algorithm {0} is not accepted")]
    DisallowedAlgorithm(String),
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token audience is invalid")]
    InvalidAudience,
    /// Claims verified but `sub` is absent or empty
    #[error("token has no subject")]
    MissingSubject,
    /// The matched JWK could not be turned into a verification key
    #[error("JWKS key is unusable: {0}")]
    UnusableKey(String),
    /// Identity provider unreachable and no usable cached keys
    #[error("failed to fetch JWKS: {0}")]
    JwksUnavailable(String),
}

impl AuthError {
    /// Whether this error reflects an unreachable identity provider rather
    /// than a bad credential.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthError::JwksUnavailable(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_unavailable() {
            tracing::warn!(error = %self, "token verification could not reach the identity provider");
        } else {
            tracing::debug!(reason = %self, "rejecting request credentials");
        }
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};

    #[tokio::test]
    async fn missing_auth_returns_generic_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "unauthorized");
    }

    #[tokio::test]
    async fn verification_failures_are_indistinguishable() {
        let mut bodies = Vec::new();
        for err in [
            AuthError::NoMatchingKey,
            AuthError::InvalidSignature,
            AuthError::InvalidAudience,
            AuthError::TokenExpired,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            bodies.push(to_bytes(response.into_body(), usize::MAX).await.unwrap());
        }
        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn jwks_unavailable_returns_502() {
        let response = AuthError::JwksUnavailable("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
