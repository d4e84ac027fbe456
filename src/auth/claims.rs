// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the per-request principal.

use serde::Deserialize;

/// Role assigned when the token carries no `role` claim.
pub const DEFAULT_ROLE: &str = "user";

/// Claims read from a verified identity-provider token.
///
/// `exp`, `aud` and `iss` are validated by `jsonwebtoken` before this
/// struct is populated; only the fields the BFF uses are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration timestamp
    pub exp: i64,
}

/// The verified caller of a request.
///
/// Built from a token that passed signature and claim checks. The raw token
/// is kept so upstream calls run under the caller's identity.
#[derive(Clone)]
pub struct Principal {
    pub subject: String,
    pub role: String,
    pub email: Option<String>,
    pub raw_token: String,
}

impl Principal {
    /// Build a principal from verified claims. `None` when `sub` is absent or empty.
    pub fn from_claims(claims: TokenClaims, raw_token: impl Into<String>) -> Option<Self> {
        let subject = claims.sub.filter(|s| !s.is_empty())?;
        Some(Self {
            subject,
            role: claims
                .role
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            email: claims.email,
            raw_token: raw_token.into(),
        })
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("subject", &self.subject)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("raw_token", &"<redacted>")
            .finish()
    }
}
