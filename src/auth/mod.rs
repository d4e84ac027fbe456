// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Verifies identity-provider (Supabase Auth) access tokens locally.
//!
//! ## Auth Flow
//!
//! 1. Frontend signs the user in with the identity provider
//! 2. Frontend sends `Authorization: Bearer <access token>`
//! 3. BFF:
//!    - Resolves the token's `kid` against the cached JWKS
//!    - Verifies signature, expiry, issuer and the `authenticated` audience
//!    - Extracts `sub` → user id, `role` (default `user`), `email`
//!    - Keeps the raw token so data-service calls run under the caller's
//!      row-level security
//!
//! ## Security
//!
//! - Only asymmetric algorithms from a fixed allow-list are accepted
//! - All verification failures produce the same 401 response
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod verifier;

pub use claims::{Principal, TokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::{KeyCache, KeySet};
pub use verifier::TokenVerifier;
