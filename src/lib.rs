// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ideaboard BFF - REST backend-for-frontend for a discussion board
//!
//! This crate verifies identity-provider bearer tokens locally against a
//! cached JWKS and proxies posts, comments, votes and reports to a
//! PostgREST-style data service under the caller's own token, so row-level
//! security applies upstream.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - JWKS key cache, token verification, `Auth` extractor
//! - `upstream` - Data service client (range pagination, filters)
//! - `models` - Records and request validation
//! - `config` - Environment settings and CORS policy

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod upstream;
