// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, Principal};
use crate::error::ErrorBody;

/// Response for GET /api/v1/me
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    /// Subject of the verified token
    pub id: String,
    /// `null` when the token has no email claim
    pub email: Option<String>,
    /// Token role, `user` when the token carries none
    pub role: String,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.subject,
            email: principal.email,
            role: principal.role,
        }
    }
}

/// Identity of the caller as derived from the verified token.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn me(Auth(principal): Auth) -> Json<MeResponse> {
    Json(principal.into())
}
