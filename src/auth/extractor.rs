// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal.subject is the caller's user id
//! }
//! ```
//!
//! Place it before any body extractor so unauthenticated requests are
//! rejected without reading the body.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Principal};
use crate::state::AppState;

/// Extractor for a verified [`Principal`].
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Auth(principal));
        }

        let principal = state.verifier.verify(&parts.headers).await?;
        parts.extensions.insert(principal.clone());
        Ok(Auth(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    fn unreachable_state() -> AppState {
        // Port 9 (discard) is never served in tests; any fetch would fail.
        AppState::for_endpoints("http://127.0.0.1:9/jwks", "http://127.0.0.1:9", "issuer")
            .expect("state builds")
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = unreachable_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_other_schemes() {
        let state = unreachable_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Token abc")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = unreachable_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        parts.extensions.insert(Principal {
            subject: "user_from_extension".to_string(),
            role: "user".to_string(),
            email: None,
            raw_token: "tok".to_string(),
        });

        let Auth(principal) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(principal.subject, "user_from_extension");
    }
}
