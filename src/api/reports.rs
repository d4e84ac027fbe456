// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode};

use super::extract::AppJson;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::ReportRequest,
    state::AppState,
};

const REPORTS: &str = "reports";

/// File a moderation report against a post or a comment.
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    request_body = ReportRequest,
    tag = "Reports",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Report filed"),
        (status = 400, description = "Bad target or reason too short", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn create_report(
    State(state): State<AppState>,
    Auth(principal): Auth,
    AppJson(request): AppJson<ReportRequest>,
) -> Result<StatusCode, ApiError> {
    let report = request.validate()?;
    state
        .data
        .insert(REPORTS, &principal.raw_token, &report.to_row(&principal.subject))
        .await?;

    tracing::info!(reporter = %principal.subject, target = report.target.column(), "report filed");
    Ok(StatusCode::NO_CONTENT)
}
