// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the identity provider's JWKS.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use super::claims::{Principal, TokenClaims};
use super::error::AuthError;
use super::jwks::KeyCache;

/// Audience every accepted token must carry.
pub const EXPECTED_AUDIENCE: &str = "authenticated";

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signature algorithms a token may declare. Symmetric algorithms are never
/// accepted, which rules out HMAC-with-public-key confusion.
const ALLOWED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// Verifies bearer tokens and produces a [`Principal`].
pub struct TokenVerifier {
    keys: Arc<KeyCache>,
    issuer: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyCache>, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    pub fn key_cache(&self) -> &Arc<KeyCache> {
        &self.keys
    }

    /// Verify the bearer token carried in `headers`.
    pub async fn verify(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers)?;
        self.verify_token(token).await
    }

    /// Verify a raw token string.
    pub async fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::DisallowedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;

        let key_set = self.keys.get_keys().await?;
        let jwk = key_set.find(kid).ok_or(AuthError::NoMatchingKey)?;
        let decoding_key = decoding_key_for(jwk, header.alg)?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_audience(&[EXPECTED_AUDIENCE]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let token_data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidAlgorithm => {
                    AuthError::DisallowedAlgorithm(format!("{:?}", header.alg))
                }
                _ => AuthError::MalformedToken,
            }
        })?;

        Principal::from_claims(token_data.claims, token).ok_or(AuthError::MissingSubject)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

/// Build the verification key for `jwk`, rejecting algorithms that do not
/// fit the key's type or its declared `alg`.
fn decoding_key_for(jwk: &Jwk, alg: Algorithm) -> Result<DecodingKey, AuthError> {
    let family_matches = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => matches!(
            alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ),
        AlgorithmParameters::EllipticCurve(_) => {
            matches!(alg, Algorithm::ES256 | Algorithm::ES384)
        }
        _ => false,
    };
    if !family_matches {
        return Err(AuthError::DisallowedAlgorithm(format!("{alg:?}")));
    }

    if let Some(declared) = jwk.common.key_algorithm {
        if !key_algorithm_is(declared, alg) {
            return Err(AuthError::DisallowedAlgorithm(format!("{alg:?}")));
        }
    }

    DecodingKey::from_jwk(jwk).map_err(|e| AuthError::UnusableKey(e.to_string()))
}

fn key_algorithm_is(declared: KeyAlgorithm, alg: Algorithm) -> bool {
    matches!(
        (declared, alg),
        (KeyAlgorithm::RS256, Algorithm::RS256)
            | (KeyAlgorithm::RS384, Algorithm::RS384)
            | (KeyAlgorithm::RS512, Algorithm::RS512)
            | (KeyAlgorithm::ES256, Algorithm::ES256)
            | (KeyAlgorithm::ES384, Algorithm::ES384)
    )
}
